//! Seams between the pipeline and the cloud services it reads from.
//!
//! The pipeline only ever talks to these traits; [`aws`] provides the SDK
//! backed implementations used in production.

use crate::model::{AccountId, AccountName, CostGroup, GroupDimension};
use crate::window::TimeWindow;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub mod aws;

pub use aws::AwsClients;

#[async_trait]
pub trait BudgetLookup: Send + Sync {
    /// Filter dimension name -> values configured on the budget.
    async fn budget_filters(
        &self,
        account_id: &str,
        budget_name: &str,
    ) -> Result<BTreeMap<String, Vec<String>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAccount {
    pub id: AccountId,
    pub name: AccountName,
}

#[derive(Debug, Clone, Default)]
pub struct AccountPage {
    pub accounts: Vec<DirectoryAccount>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn list_accounts_page(&self, next_token: Option<String>) -> Result<AccountPage>;
}

#[derive(Debug, Clone)]
pub struct CostQueryRequest<'a> {
    pub window: &'a TimeWindow,
    pub group_by: GroupDimension,
    pub linked_accounts: Option<&'a [AccountId]>,
}

#[async_trait]
pub trait CostQuery: Send + Sync {
    async fn cost_groups(&self, request: &CostQueryRequest<'_>) -> Result<Vec<CostGroup>>;
}
