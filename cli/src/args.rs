use clap::{Parser, Subcommand, ValueEnum};

use costnotify_core::model::OutputFormat;

use crate::logger::LogLevel;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Monthly AWS cost ranking, published to SNS email or LINE Notify"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    /// Without a subcommand the binary serves Lambda invocations.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true, ignore_case = true)]
    pub log_level: Option<LogLevel>,
    #[arg(long, global = true)]
    pub json_output: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve Lambda invocations (default).
    Lambda,
    /// Run the report once from this shell.
    Run(RunArgs),
    Config(ConfigCommandArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Render the message without publishing it.
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, default_value = "text")]
    pub format: OutputFormatArg,
    #[arg(long)]
    pub pretty: bool,
    /// Treat this day (YYYY-MM-DD) as today.
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigCommandArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Validate(ConfigArgs),
    Dump(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long)]
    pub format: Option<OutputFormatArg>,
    #[arg(long)]
    pub pretty: bool,
}

impl ConfigCommand {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Validate(args) => args.format.map(Into::into).unwrap_or(OutputFormat::Text),
            Self::Dump(args) => args.format.map(Into::into).unwrap_or(OutputFormat::Json),
        }
    }

    pub fn pretty(&self) -> bool {
        match self {
            Self::Validate(args) | Self::Dump(args) => args.pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}
