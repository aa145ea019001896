use crate::accounts::{resolve_accounts, resolve_names};
use crate::clients::{AccountDirectory, BudgetLookup, CostQuery};
use crate::config::Config;
use crate::errors::CostNotifyError;
use crate::model::{ErrorKind, Report};
use crate::ranking::{rank_by_account, rank_by_service};
use crate::window::compute_window;
use anyhow::Result;
use chrono::{DateTime, Utc};

/// The read-side services one report run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub budgets: &'a dyn BudgetLookup,
    pub directory: &'a dyn AccountDirectory,
    pub costs: &'a dyn CostQuery,
}

pub async fn collect_report(
    config: &Config,
    apis: Collaborators<'_>,
    now: DateTime<Utc>,
) -> Result<Report> {
    tracing::debug!("collect_report() start");

    let account_ids = resolve_accounts(apis.budgets, &config.account_id, &config.budget_name).await?;
    let window = compute_window(now, config.profile.window);
    let names = resolve_names(apis.directory, &account_ids).await?;

    let (services, (total, accounts)) = tokio::try_join!(
        rank_by_service(apis.costs, &account_ids, &window),
        rank_by_account(apis.costs, &names, &window, config.profile.total),
    )?;

    tracing::debug!("collect_report() end");
    Ok(Report {
        window,
        total,
        accounts,
        services,
    })
}

pub fn error_kind(err: &anyhow::Error) -> ErrorKind {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<CostNotifyError>())
        .map(CostNotifyError::kind)
        .unwrap_or(ErrorKind::Unexpected)
}

pub fn format_error_chain(err: &anyhow::Error) -> String {
    let mut parts: Vec<String> = err.chain().map(|e| e.to_string()).collect();
    if parts.is_empty() {
        return "Unknown error".to_string();
    }
    parts.dedup();
    parts.join(": ")
}
