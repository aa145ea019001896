use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveTime, Utc};
use lambda_runtime::LambdaEvent;
use serde_json::Value;

use costnotify_core::clients::{AccountDirectory, AwsClients, BudgetLookup, CostQuery};
use costnotify_core::config::Config;
use costnotify_core::model::{OutputFormat, Report};
use costnotify_core::notify::{Notifier, build_notifier};
use costnotify_core::service::{Collaborators, collect_report, error_kind, format_error_chain};
use costnotify_core::window::parse_date;
use costnotify_ui::reports::render_message;
use costnotify_ui::text::{RenderOptions, render_dry_run};

use crate::args::{ConfigCommand, ConfigCommandArgs, RunArgs};
use crate::exit_codes::headline_for_kind;

pub const COMPLETED_MESSAGE: &str = "Processing completed successfully";

/// Everything an invocation needs, built once per cold start.
pub struct AppState {
    pub config: Config,
    pub budgets: Box<dyn BudgetLookup>,
    pub directory: Box<dyn AccountDirectory>,
    pub costs: Box<dyn CostQuery>,
    pub notifier: Box<dyn Notifier>,
}

impl AppState {
    pub async fn load(config: Config) -> Result<Self> {
        let clients = AwsClients::load(&config).await;
        let notifier = build_notifier(&config, &clients)?;
        tracing::debug!(channel = %notifier.channel(), "clients ready");
        Ok(Self {
            budgets: Box::new(clients.budgets.clone()),
            directory: Box::new(clients.organizations.clone()),
            costs: Box::new(clients.cost_explorer.clone()),
            notifier,
            config,
        })
    }

    fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            budgets: self.budgets.as_ref(),
            directory: self.directory.as_ref(),
            costs: self.costs.as_ref(),
        }
    }

    async fn collect(&self, now: DateTime<Utc>) -> Result<Report> {
        collect_report(&self.config, self.collaborators(), now).await
    }
}

/// Collect, render, publish. One message per successful run.
pub async fn run_pipeline(state: &AppState, now: DateTime<Utc>) -> Result<Report> {
    let report = state.collect(now).await?;
    let message = render_message(&report, state.config.profile.layout);
    state
        .notifier
        .publish(&message)
        .await
        .with_context(|| format!("publish {} notification", state.notifier.channel()))?;
    Ok(report)
}

/// Runs the pipeline and logs any failure. Never fails itself.
pub async fn handle_invocation(state: &AppState, now: DateTime<Utc>) {
    if let Err(err) = run_pipeline(state, now).await {
        let kind = error_kind(&err);
        tracing::error!(kind = %kind, "{}", headline_for_kind(kind));
        tracing::error!("{}", format_error_chain(&err));
    }
    tracing::info!("{}", COMPLETED_MESSAGE);
}

pub async fn function_handler(
    event: LambdaEvent<Value>,
    state: &AppState,
) -> Result<(), lambda_runtime::Error> {
    tracing::debug!(request_id = %event.context.request_id, "invocation received");
    handle_invocation(state, Utc::now()).await;
    Ok(())
}

pub async fn run_once(args: RunArgs, state: &AppState) -> Result<()> {
    let now = match args.date.as_deref() {
        Some(raw) => parse_date(raw)
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| anyhow!("invalid --date value: {} (expected YYYY-MM-DD)", raw))?,
        None => Utc::now(),
    };

    if !args.dry_run {
        handle_invocation(state, now).await;
        return Ok(());
    }

    let report = state.collect(now).await?;
    let message = render_message(&report, state.config.profile.layout);
    let rendered = render_dry_run(
        &report,
        &message,
        &RenderOptions {
            format: args.format.into(),
            pretty: args.pretty,
        },
    )?;
    println!("{}", rendered);
    Ok(())
}

pub fn run_config(cmd: ConfigCommandArgs, config: &Config) -> Result<()> {
    let format = cmd.command.format();
    let pretty = cmd.command.pretty();
    let output = match cmd.command {
        ConfigCommand::Validate(_) => validate_config(format, pretty, config)?,
        ConfigCommand::Dump(_) => to_json(&config.redacted(), pretty)?,
    };
    println!("{}", output);
    Ok(())
}

fn validate_config(
    format: OutputFormat,
    pretty: bool,
    config: &Config,
) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(
            &serde_json::json!({
                "valid": true,
                "channel": config.channel.kind(),
                "window": config.profile.window,
            }),
            pretty,
        ),
        OutputFormat::Text => Ok(format!(
            "Configuration OK (channel: {}, window: {} month)",
            config.channel.kind(),
            config.profile.window
        )),
    }
}

fn to_json(value: &Value, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
