//! Cost ranking engine.
//!
//! Both rankings drop the synthetic `Tax` group, order the rest by amount
//! (descending, stable for equal amounts) and keep the top entries. Costs are
//! shown as the integer part of the decimal string returned by Cost Explorer,
//! never rounded.

use crate::accounts::account_label;
use crate::clients::{CostQuery, CostQueryRequest};
use crate::errors::CostNotifyError;
use crate::model::{AccountId, AccountName, CostGroup, GroupDimension, RankingEntry, TotalCost};
use crate::window::TimeWindow;
use anyhow::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const TAX_GROUP: &str = "Tax";
pub const SERVICE_RANKING_LIMIT: usize = 5;
pub const ACCOUNT_RANKING_LIMIT: usize = 3;

/// Which groups contribute to the account total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TotalScope {
    /// Every group returned by the query, `Tax` included.
    Unfiltered,
    /// Only the groups eligible for ranking.
    Filtered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Accumulation {
    /// Truncate every amount to an integer, then add the integers.
    TruncateEach,
    /// Add the amounts as floats and truncate the sum.
    SumThenTruncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPolicy {
    pub scope: TotalScope,
    pub accumulation: Accumulation,
}

pub async fn rank_by_service(
    costs: &dyn CostQuery,
    account_ids: &[AccountId],
    window: &TimeWindow,
) -> Result<Vec<RankingEntry>> {
    let groups = costs
        .cost_groups(&CostQueryRequest {
            window,
            group_by: GroupDimension::Service,
            linked_accounts: Some(account_ids),
        })
        .await?;

    let entries = rank_services(&groups)?;
    for entry in &entries {
        tracing::debug!("{}", entry);
    }
    Ok(entries)
}

pub async fn rank_by_account(
    costs: &dyn CostQuery,
    names: &HashMap<AccountId, AccountName>,
    window: &TimeWindow,
    policy: TotalPolicy,
) -> Result<(TotalCost, Vec<RankingEntry>)> {
    let groups = costs
        .cost_groups(&CostQueryRequest {
            window,
            group_by: GroupDimension::LinkedAccount,
            linked_accounts: None,
        })
        .await?;

    let (total, entries) = rank_accounts(&groups, names, policy)?;
    for entry in &entries {
        tracing::debug!("{}", entry);
    }
    tracing::debug!(total = %total, "computed total cost");
    Ok((total, entries))
}

pub fn rank_services(groups: &[CostGroup]) -> Result<Vec<RankingEntry>, CostNotifyError> {
    Ok(top_groups(groups, SERVICE_RANKING_LIMIT)?
        .into_iter()
        .enumerate()
        .map(|(index, group)| RankingEntry {
            rank: index + 1,
            cost: truncate_amount(&group.amount),
            unit: group.unit.clone(),
            label: group.key.clone(),
        })
        .collect())
}

pub fn rank_accounts(
    groups: &[CostGroup],
    names: &HashMap<AccountId, AccountName>,
    policy: TotalPolicy,
) -> Result<(TotalCost, Vec<RankingEntry>), CostNotifyError> {
    let ranked = top_groups(groups, ACCOUNT_RANKING_LIMIT)?;

    let mut entries = Vec::with_capacity(ranked.len());
    for (index, group) in ranked.iter().enumerate() {
        let name = account_label(names, &group.key)?;
        entries.push(RankingEntry {
            rank: index + 1,
            cost: truncate_amount(&group.amount),
            unit: group.unit.clone(),
            label: format!("{}({})", name, group.key),
        });
    }

    // The total carries the unit of the last ranked account.
    let unit = ranked
        .last()
        .map(|group| group.unit.clone())
        .unwrap_or_default();
    let total = total_cost(groups, policy, unit)?;

    Ok((total, entries))
}

pub fn total_cost(
    groups: &[CostGroup],
    policy: TotalPolicy,
    unit: String,
) -> Result<TotalCost, CostNotifyError> {
    let included = groups.iter().filter(|group| match policy.scope {
        TotalScope::Unfiltered => true,
        TotalScope::Filtered => group.key != TAX_GROUP,
    });

    let amount = match policy.accumulation {
        Accumulation::TruncateEach => {
            let mut sum = 0_i64;
            for group in included {
                sum += parse_amount(group)?.trunc() as i64;
            }
            sum
        }
        Accumulation::SumThenTruncate => {
            let mut sum = 0.0_f64;
            for group in included {
                sum += parse_amount(group)?;
            }
            sum.trunc() as i64
        }
    };

    Ok(TotalCost { amount, unit })
}

/// Integer part of a decimal amount string: `"120.50"` -> `"120"`.
pub fn truncate_amount(amount: &str) -> String {
    let trimmed = amount.trim();
    match trimmed.split_once('.') {
        Some((integer, _)) => integer.to_string(),
        None => trimmed.to_string(),
    }
}

fn top_groups(groups: &[CostGroup], limit: usize) -> Result<Vec<&CostGroup>, CostNotifyError> {
    let mut ranked = Vec::with_capacity(groups.len());
    for group in groups.iter().filter(|group| group.key != TAX_GROUP) {
        ranked.push((parse_amount(group)?, group));
    }
    // sort_by is stable, so equal amounts keep response order.
    ranked.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    Ok(ranked
        .into_iter()
        .take(limit)
        .map(|(_, group)| group)
        .collect())
}

fn parse_amount(group: &CostGroup) -> Result<f64, CostNotifyError> {
    group
        .amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CostNotifyError::InvalidAmount {
            key: group.key.clone(),
            amount: group.amount.clone(),
        })
}
