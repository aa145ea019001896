use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    /// Accepts the upper-case names used in deployment settings (`INFO`, `WARNING`, ...).
    pub fn parse(value: &str) -> Option<Self> {
        <LogLevel as ValueEnum>::from_str(value.trim(), true).ok()
    }

    fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub json_output: bool,
}

/// Level from the flag, then `LOG_LEVEL`, then info. An unreadable
/// `LOG_LEVEL` is returned alongside so it can be reported once logging is up.
pub fn resolve_level(flag: Option<LogLevel>) -> (LogLevel, Option<String>) {
    if let Some(level) = flag {
        return (level, None);
    }
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(raw) if !raw.trim().is_empty() => match LogLevel::parse(&raw) {
            Some(level) => (level, None),
            None => (LogLevel::Info, Some(raw)),
        },
        _ => (LogLevel::Info, None),
    }
}

pub fn init(config: LoggerConfig) {
    // CloudWatch stamps every line, so no timestamps and no module targets.
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level.filter())
        .with_target(false)
        .without_time();
    let result = if config.json_output {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("logger already initialised");
    }
}
