use crate::clients::{AccountDirectory, BudgetLookup};
use crate::errors::CostNotifyError;
use crate::model::{AccountId, AccountName};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

/// Linked accounts listed in the budget's cost filters, flattened across
/// filter dimensions. Duplicates are kept; an empty list is an error.
pub async fn resolve_accounts(
    budgets: &dyn BudgetLookup,
    master_account_id: &str,
    budget_name: &str,
) -> Result<Vec<AccountId>> {
    let filters = budgets
        .budget_filters(master_account_id, budget_name)
        .await?;

    let accounts: Vec<AccountId> = filters.into_values().flatten().collect();
    if accounts.is_empty() {
        return Err(CostNotifyError::NoLinkedAccounts {
            budget: budget_name.to_string(),
        }
        .into());
    }
    tracing::debug!("cost aggregation accounts: {}", accounts.join(", "));
    Ok(accounts)
}

/// Display names for the requested accounts. Ids missing from the
/// organization listing are left out of the map.
pub async fn resolve_names(
    directory: &dyn AccountDirectory,
    account_ids: &[AccountId],
) -> Result<HashMap<AccountId, AccountName>> {
    let wanted: HashSet<&str> = account_ids.iter().map(String::as_str).collect();
    let mut names = HashMap::new();
    let mut next_token = None;

    loop {
        let page = directory.list_accounts_page(next_token.take()).await?;
        for account in page.accounts {
            if wanted.contains(account.id.as_str()) {
                names.insert(account.id, account.name);
            }
        }
        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(
        "account names: {}",
        names.values().cloned().collect::<Vec<_>>().join(",")
    );
    Ok(names)
}

pub fn account_label(
    names: &HashMap<AccountId, AccountName>,
    account_id: &str,
) -> Result<AccountName, CostNotifyError> {
    names
        .get(account_id)
        .cloned()
        .ok_or_else(|| CostNotifyError::AccountNameMissing(account_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{AccountPage, DirectoryAccount};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct FakeBudgets {
        filters: Option<BTreeMap<String, Vec<String>>>,
    }

    #[async_trait]
    impl BudgetLookup for FakeBudgets {
        async fn budget_filters(
            &self,
            account_id: &str,
            budget_name: &str,
        ) -> Result<BTreeMap<String, Vec<String>>> {
            self.filters.clone().ok_or_else(|| {
                CostNotifyError::BudgetNotFound {
                    account: account_id.to_string(),
                    budget: budget_name.to_string(),
                }
                .into()
            })
        }
    }

    struct PagedDirectory {
        pages: Vec<Vec<(&'static str, &'static str)>>,
        requested_tokens: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl AccountDirectory for PagedDirectory {
        async fn list_accounts_page(&self, next_token: Option<String>) -> Result<AccountPage> {
            self.requested_tokens
                .lock()
                .expect("lock tokens")
                .push(next_token.clone());
            let index = next_token
                .as_deref()
                .map(|token| token.parse::<usize>().expect("numeric token"))
                .unwrap_or(0);
            let accounts = self.pages[index]
                .iter()
                .map(|(id, name)| DirectoryAccount {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect();
            let next_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
            Ok(AccountPage {
                accounts,
                next_token,
            })
        }
    }

    #[tokio::test]
    async fn flattens_every_filter_dimension() {
        let mut filters = BTreeMap::new();
        filters.insert(
            "LinkedAccount".to_string(),
            vec!["111".to_string(), "222".to_string()],
        );
        filters.insert("Other".to_string(), vec!["111".to_string()]);
        let budgets = FakeBudgets {
            filters: Some(filters),
        };

        let accounts = resolve_accounts(&budgets, "999", "monthly")
            .await
            .expect("accounts");
        assert_eq!(accounts, vec!["111", "222", "111"]);
    }

    #[tokio::test]
    async fn missing_budget_is_not_found() {
        let budgets = FakeBudgets { filters: None };
        let err = resolve_accounts(&budgets, "999", "missing")
            .await
            .expect_err("budget not found");
        assert!(matches!(
            err.downcast_ref::<CostNotifyError>(),
            Some(CostNotifyError::BudgetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn budget_without_filter_values_fails() {
        let mut filters = BTreeMap::new();
        filters.insert("LinkedAccount".to_string(), Vec::new());
        let budgets = FakeBudgets {
            filters: Some(filters),
        };

        let err = resolve_accounts(&budgets, "999", "monthly")
            .await
            .expect_err("no accounts");
        assert!(matches!(
            err.downcast_ref::<CostNotifyError>(),
            Some(CostNotifyError::NoLinkedAccounts { budget }) if budget == "monthly"
        ));

        let unfiltered = FakeBudgets {
            filters: Some(BTreeMap::new()),
        };
        assert!(resolve_accounts(&unfiltered, "999", "monthly").await.is_err());
    }

    #[tokio::test]
    async fn resolves_names_across_pages_and_omits_unknown() {
        let directory = PagedDirectory {
            pages: vec![
                vec![("111", "Dev"), ("555", "Other")],
                vec![("666", "Unrelated")],
                vec![("333", "Stg")],
            ],
            requested_tokens: Mutex::new(Vec::new()),
        };
        let ids = vec!["111".to_string(), "222".to_string(), "333".to_string()];

        let names = resolve_names(&directory, &ids).await.expect("names");
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("111").map(String::as_str), Some("Dev"));
        assert_eq!(names.get("333").map(String::as_str), Some("Stg"));
        assert!(!names.contains_key("222"));

        let tokens = directory.requested_tokens.lock().expect("lock tokens");
        assert_eq!(
            *tokens,
            vec![None, Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[tokio::test]
    async fn label_lookup_fails_for_unresolved_account() {
        let directory = PagedDirectory {
            pages: vec![vec![("111", "Dev")]],
            requested_tokens: Mutex::new(Vec::new()),
        };
        let ids = vec!["111".to_string(), "222".to_string()];
        let names = resolve_names(&directory, &ids).await.expect("names");

        assert_eq!(account_label(&names, "111").expect("label"), "Dev");
        let err = account_label(&names, "222").expect_err("missing name");
        assert_eq!(
            err.to_string(),
            "account 222 has no entry in the organization listing"
        );
    }
}
