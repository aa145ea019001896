use crate::clients::{
    AccountDirectory, AccountPage, BudgetLookup, CostQuery, CostQueryRequest, DirectoryAccount,
};
use crate::config::Config;
use crate::errors::CostNotifyError;
use crate::model::CostGroup;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_budgets::operation::describe_budget::DescribeBudgetError;
use aws_sdk_budgets::types::Budget;
use aws_sdk_costexplorer::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_costexplorer::types::{
    DateInterval, Dimension, DimensionValues, Expression, Granularity, Group, GroupDefinition,
    GroupDefinitionType, ResultByTime,
};
use std::collections::BTreeMap;

/// Used when neither the environment nor the profile names a region.
/// Budgets, Cost Explorer and Organizations are global endpoints anyway.
pub const DEFAULT_REGION: &str = "ap-northeast-1";
pub const COST_METRIC: &str = "UnblendedCost";

pub struct AwsClients {
    pub budgets: aws_sdk_budgets::Client,
    pub organizations: aws_sdk_organizations::Client,
    pub cost_explorer: aws_sdk_costexplorer::Client,
    pub sns: aws_sdk_sns::Client,
}

impl AwsClients {
    pub async fn load(config: &Config) -> Self {
        let shared = load_sdk_config(config).await;
        Self::from_sdk_config(&shared)
    }

    pub fn from_sdk_config(shared: &SdkConfig) -> Self {
        Self {
            budgets: aws_sdk_budgets::Client::new(shared),
            organizations: aws_sdk_organizations::Client::new(shared),
            cost_explorer: aws_sdk_costexplorer::Client::new(shared),
            sns: aws_sdk_sns::Client::new(shared),
        }
    }
}

pub async fn load_sdk_config(config: &Config) -> SdkConfig {
    let region = RegionProviderChain::default_provider().or_else(Region::from_static(DEFAULT_REGION));
    aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .retry_config(RetryConfig::standard().with_max_attempts(config.retry_count))
        .load()
        .await
}

pub(crate) fn map_sdk_error<E, R>(service: &'static str, err: SdkError<E, R>) -> CostNotifyError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service_err) => CostNotifyError::Api {
            service,
            code: service_err.code().unwrap_or("Unknown").to_string(),
            message: service_err
                .message()
                .unwrap_or("no message provided")
                .to_string(),
        },
        None => CostNotifyError::Transport {
            service,
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

#[async_trait]
impl BudgetLookup for aws_sdk_budgets::Client {
    async fn budget_filters(
        &self,
        account_id: &str,
        budget_name: &str,
    ) -> Result<BTreeMap<String, Vec<String>>> {
        let response = self
            .describe_budget()
            .account_id(account_id)
            .budget_name(budget_name)
            .send()
            .await
            .map_err(|err| budget_lookup_error(account_id, budget_name, err))?;

        let budget = response
            .budget()
            .ok_or_else(|| CostNotifyError::MalformedResponse {
                service: "Budgets",
                detail: format!("DescribeBudget returned no budget for {}", budget_name),
            })?;

        Ok(budget_filter_values(budget))
    }
}

fn budget_lookup_error<R>(
    account_id: &str,
    budget_name: &str,
    err: SdkError<DescribeBudgetError, R>,
) -> CostNotifyError
where
    R: std::fmt::Debug,
{
    let not_found = err
        .as_service_error()
        .is_some_and(DescribeBudgetError::is_not_found_exception);
    if not_found {
        return CostNotifyError::BudgetNotFound {
            account: account_id.to_string(),
            budget: budget_name.to_string(),
        };
    }
    map_sdk_error("Budgets", err)
}

// Budgets defined only through a filter expression leave this empty.
#[allow(deprecated)]
fn budget_filter_values(budget: &Budget) -> BTreeMap<String, Vec<String>> {
    budget
        .cost_filters()
        .map(|filters| {
            filters
                .iter()
                .map(|(dimension, values)| (dimension.clone(), values.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl AccountDirectory for aws_sdk_organizations::Client {
    async fn list_accounts_page(&self, next_token: Option<String>) -> Result<AccountPage> {
        let response = self
            .list_accounts()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| map_sdk_error("Organizations", err))?;

        let accounts = response
            .accounts()
            .iter()
            .filter_map(|account| {
                Some(DirectoryAccount {
                    id: account.id()?.to_string(),
                    name: account.name()?.to_string(),
                })
            })
            .collect();

        Ok(AccountPage {
            accounts,
            next_token: response
                .next_token()
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        })
    }
}

#[async_trait]
impl CostQuery for aws_sdk_costexplorer::Client {
    async fn cost_groups(&self, request: &CostQueryRequest<'_>) -> Result<Vec<CostGroup>> {
        let start = request.window.start_str();
        let interval = DateInterval::builder()
            .start(start.clone())
            .end(request.window.end_str())
            .build()
            .context("build cost query time period")?;
        let filter = request.linked_accounts.map(|accounts| {
            Expression::builder()
                .dimensions(
                    DimensionValues::builder()
                        .key(Dimension::LinkedAccount)
                        .set_values(Some(accounts.to_vec()))
                        .build(),
                )
                .build()
        });
        let group_by = GroupDefinition::builder()
            .r#type(GroupDefinitionType::Dimension)
            .key(request.group_by.as_str())
            .build();

        let results = collect_pages(|next_page_token| {
            let call = self
                .get_cost_and_usage()
                .time_period(interval.clone())
                .granularity(Granularity::Monthly)
                .metrics(COST_METRIC)
                .group_by(group_by.clone())
                .set_filter(filter.clone())
                .set_next_page_token(next_page_token);
            async move {
                let response = call
                    .send()
                    .await
                    .map_err(|err| map_sdk_error("Cost Explorer", err))?;
                Ok::<_, anyhow::Error>((
                    response.results_by_time().to_vec(),
                    response.next_page_token().map(str::to_string),
                ))
            }
        })
        .await?;
        let groups = groups_for_period(&results, &start)?;

        tracing::debug!(
            group_by = %request.group_by,
            groups = groups.len(),
            "fetched cost groups"
        );
        Ok(groups)
    }
}

/// Runs `fetch` until the service stops returning a continuation token.
async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>>,
{
    let mut items = Vec::new();
    let mut next_token = None;
    loop {
        let (page, token) = fetch(next_token.take()).await?;
        items.extend(page);
        match token.filter(|token| !token.is_empty()) {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }
    Ok(items)
}

/// Groups of the period beginning at `start`. A window spanning two months
/// yields two periods and only the first is reported.
fn groups_for_period(
    results: &[ResultByTime],
    start: &str,
) -> Result<Vec<CostGroup>, CostNotifyError> {
    let mut periods = results
        .iter()
        .filter(|period| period.time_period().is_some_and(|tp| tp.start() == start))
        .peekable();
    if periods.peek().is_none() {
        return Err(CostNotifyError::MalformedResponse {
            service: "Cost Explorer",
            detail: format!("no result period starting {}", start),
        });
    }
    periods
        .flat_map(|period| period.groups())
        .map(cost_group_from)
        .collect()
}

fn cost_group_from(group: &Group) -> Result<CostGroup, CostNotifyError> {
    let malformed = |detail: String| CostNotifyError::MalformedResponse {
        service: "Cost Explorer",
        detail,
    };
    let key = group
        .keys()
        .first()
        .cloned()
        .ok_or_else(|| malformed("group without keys".to_string()))?;
    let metric = group
        .metrics()
        .and_then(|metrics| metrics.get(COST_METRIC))
        .ok_or_else(|| malformed(format!("group {} has no {} metric", key, COST_METRIC)))?;
    let amount = metric
        .amount()
        .ok_or_else(|| malformed(format!("group {} has no amount", key)))?;

    Ok(CostGroup::new(
        key,
        amount,
        metric.unit().unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_budgets::types::error::NotFoundException;
    use aws_sdk_costexplorer::error::ErrorMetadata;
    use aws_sdk_costexplorer::operation::get_cost_and_usage::GetCostAndUsageError;
    use aws_sdk_costexplorer::types::MetricValue;
    use std::sync::Mutex;

    fn period(start: &str, end: &str, groups: Vec<Group>) -> ResultByTime {
        ResultByTime::builder()
            .time_period(
                DateInterval::builder()
                    .start(start)
                    .end(end)
                    .build()
                    .expect("date interval"),
            )
            .set_groups(Some(groups))
            .build()
    }

    fn group(key: &str, amount: &str) -> Group {
        Group::builder()
            .keys(key)
            .metrics(
                COST_METRIC,
                MetricValue::builder().amount(amount).unit("USD").build(),
            )
            .build()
    }

    #[test]
    fn reads_only_the_period_starting_at_window_start() {
        let results = vec![
            period(
                "2024-02-01",
                "2024-03-01",
                vec![group("EC2", "120.50"), group("Tax", "10.00")],
            ),
            period("2024-03-01", "2024-03-15", vec![group("EC2", "55.00")]),
        ];

        let groups = groups_for_period(&results, "2024-02-01").expect("groups");
        assert_eq!(
            groups,
            vec![
                CostGroup::new("EC2", "120.50", "USD"),
                CostGroup::new("Tax", "10.00", "USD"),
            ]
        );
    }

    #[test]
    fn missing_period_is_malformed() {
        let results = vec![period("2024-03-01", "2024-03-15", vec![group("EC2", "1.00")])];

        let err = groups_for_period(&results, "2024-02-01").expect_err("no period");
        assert!(matches!(
            err,
            CostNotifyError::MalformedResponse { service: "Cost Explorer", ref detail }
                if detail.contains("2024-02-01")
        ));
        assert!(groups_for_period(&[], "2024-02-01").is_err());
    }

    #[test]
    fn group_without_unblended_cost_is_malformed() {
        let blended_only = Group::builder()
            .keys("S3")
            .metrics(
                "BlendedCost",
                MetricValue::builder().amount("3.00").unit("USD").build(),
            )
            .build();
        let results = vec![period("2024-02-01", "2024-03-01", vec![blended_only])];

        let err = groups_for_period(&results, "2024-02-01").expect_err("missing metric");
        assert_eq!(
            err.to_string(),
            "malformed Cost Explorer response: group S3 has no UnblendedCost metric"
        );
    }

    #[tokio::test]
    async fn follows_continuation_tokens_until_exhausted() {
        let requested = Mutex::new(Vec::new());
        let pages = collect_pages(|token: Option<String>| {
            requested.lock().expect("lock tokens").push(token.clone());
            async move {
                let page = match token.as_deref() {
                    None => (vec![1, 2], Some("a".to_string())),
                    Some("a") => (vec![3], Some("b".to_string())),
                    Some(_) => (vec![4], Some(String::new())),
                };
                Ok::<_, anyhow::Error>(page)
            }
        })
        .await
        .expect("pages");

        assert_eq!(pages, vec![1, 2, 3, 4]);
        assert_eq!(
            *requested.lock().expect("lock tokens"),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn service_errors_keep_code_and_message() {
        let err: SdkError<GetCostAndUsageError, ()> = SdkError::service_error(
            GetCostAndUsageError::generic(
                ErrorMetadata::builder()
                    .code("LimitExceededException")
                    .message("Rate exceeded")
                    .build(),
            ),
            (),
        );

        let mapped = map_sdk_error("Cost Explorer", err);
        assert_eq!(
            mapped.to_string(),
            "Cost Explorer API error (LimitExceededException): Rate exceeded"
        );
        assert_eq!(mapped.kind(), crate::model::ErrorKind::Api);
    }

    #[test]
    fn dispatch_failures_are_transport_errors() {
        let err: SdkError<GetCostAndUsageError, ()> = SdkError::timeout_error("deadline elapsed");

        let mapped = map_sdk_error("Cost Explorer", err);
        assert!(matches!(
            mapped,
            CostNotifyError::Transport { service: "Cost Explorer", .. }
        ));
    }

    #[test]
    #[allow(deprecated)]
    fn reads_linked_accounts_from_cost_filters() {
        let budget = Budget::builder()
            .budget_name("monthly")
            .time_unit(aws_sdk_budgets::types::TimeUnit::Monthly)
            .budget_type(aws_sdk_budgets::types::BudgetType::Cost)
            .cost_filters("LinkedAccount", vec!["111".to_string(), "222".to_string()])
            .build()
            .expect("budget");

        let filters = budget_filter_values(&budget);
        assert_eq!(
            filters.get("LinkedAccount"),
            Some(&vec!["111".to_string(), "222".to_string()])
        );
    }

    #[test]
    fn unknown_budget_maps_to_budget_not_found() {
        let err: SdkError<DescribeBudgetError, ()> = SdkError::service_error(
            DescribeBudgetError::NotFoundException(
                NotFoundException::builder()
                    .message("Unable to get budget: monthly")
                    .build(),
            ),
            (),
        );

        let mapped = budget_lookup_error("999", "monthly", err);
        assert_eq!(mapped.to_string(), "budget monthly not found under account 999");
    }

    #[test]
    fn other_budget_errors_go_through_the_generic_mapping() {
        let err: SdkError<DescribeBudgetError, ()> = SdkError::service_error(
            DescribeBudgetError::generic(
                ErrorMetadata::builder()
                    .code("AccessDeniedException")
                    .message("not authorized")
                    .build(),
            ),
            (),
        );

        let mapped = budget_lookup_error("999", "monthly", err);
        assert!(matches!(
            mapped,
            CostNotifyError::Api { service: "Budgets", ref code, .. } if code == "AccessDeniedException"
        ));
    }
}
