use anyhow::Result;
use clap::Parser;
use lambda_runtime::service_fn;

use costnotify_core::config::Config;

use costnotify::args::{Cli, Command};
use costnotify::commands::{AppState, function_handler, run_config, run_once};
use costnotify::exit_codes::exit_code_for_error;
use costnotify::logger::{self, LOG_LEVEL_ENV, LoggerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (level, invalid_level) = logger::resolve_level(cli.global.log_level);
    logger::init(LoggerConfig {
        level,
        json_output: cli.global.json_output,
    });
    if let Some(raw) = invalid_level {
        tracing::warn!("ignoring unknown {} value: {}", LOG_LEVEL_ENV, raw);
    }
    tracing::debug!(level = level.as_str(), "logger ready");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => fail(err.into()),
    };

    let result = match cli.command {
        None | Some(Command::Lambda) => serve(config).await,
        Some(Command::Run(args)) => match AppState::load(config).await {
            Ok(state) => run_once(args, &state).await,
            Err(err) => Err(err),
        },
        Some(Command::Config(cmd)) => run_config(cmd, &config),
    };

    if let Err(err) = result {
        fail(err);
    }
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let state = AppState::load(config).await?;
    lambda_runtime::run(service_fn(|event| function_handler(event, &state)))
        .await
        .map_err(|err| anyhow::anyhow!(err))
}

fn fail(err: anyhow::Error) -> ! {
    tracing::error!("{:#}", err);
    std::process::exit(exit_code_for_error(&err));
}
