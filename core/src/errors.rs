use crate::model::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CostNotifyError {
    #[error("required environment variable not set: {0}")]
    MissingEnv(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("both SNS_TOPIC_ARN and LINE_NOTIFY_TOKEN are set; choose one with NOTIFY_CHANNEL")]
    AmbiguousChannel,
    #[error("budget {budget} has no linked-account cost filter values")]
    NoLinkedAccounts { budget: String },
    #[error("budget {budget} not found under account {account}")]
    BudgetNotFound { account: String, budget: String },
    #[error("{service} API error ({code}): {message}")]
    Api {
        service: &'static str,
        code: String,
        message: String,
    },
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("LINE Notify returned HTTP {status}: {body}")]
    WebhookStatus { status: u16, body: String },
    #[error("account {0} has no entry in the organization listing")]
    AccountNameMissing(String),
    #[error("invalid cost amount {amount:?} for group {key}")]
    InvalidAmount { key: String, amount: String },
    #[error("malformed {service} response: {detail}")]
    MalformedResponse {
        service: &'static str,
        detail: String,
    },
}

impl CostNotifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingEnv(_)
            | Self::InvalidEnv { .. }
            | Self::AmbiguousChannel
            | Self::NoLinkedAccounts { .. } => ErrorKind::Config,
            Self::Api { .. } | Self::BudgetNotFound { .. } | Self::WebhookStatus { .. } => {
                ErrorKind::Api
            }
            Self::Transport { .. } => ErrorKind::Transport,
            Self::AccountNameMissing(_)
            | Self::InvalidAmount { .. }
            | Self::MalformedResponse { .. } => ErrorKind::Unexpected,
        }
    }
}
