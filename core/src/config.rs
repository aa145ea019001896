use crate::errors::CostNotifyError;
use crate::model::MessageLayout;
use crate::ranking::{Accumulation, TotalPolicy, TotalScope};
use crate::window::WindowMonth;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_RETRY_COUNT: u32 = 3;
pub const LINE_NOTIFY_ENDPOINT: &str = "https://notify-api.line.me/api/notify";

const REDACTED: &str = "********";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Line,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelKind::Email => "email",
            ChannelKind::Line => "line",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "email" | "sns" | "topic" => Ok(ChannelKind::Email),
            "line" => Ok(ChannelKind::Line),
            other => Err(format!("unknown notification channel: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelConfig {
    Topic { topic_arn: String },
    Line { token: String, endpoint: String },
}

impl ChannelConfig {
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelConfig::Topic { .. } => ChannelKind::Email,
            ChannelConfig::Line { .. } => ChannelKind::Line,
        }
    }
}

/// Per-deployment behavior that differs between the email and LINE reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantProfile {
    pub window: WindowMonth,
    pub total: TotalPolicy,
    pub layout: MessageLayout,
}

impl VariantProfile {
    pub fn for_channel(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Email => Self {
                window: WindowMonth::Previous,
                total: TotalPolicy {
                    scope: TotalScope::Unfiltered,
                    accumulation: Accumulation::TruncateEach,
                },
                layout: MessageLayout::Email,
            },
            ChannelKind::Line => Self {
                window: WindowMonth::Current,
                total: TotalPolicy {
                    scope: TotalScope::Unfiltered,
                    accumulation: Accumulation::SumThenTruncate,
                },
                layout: MessageLayout::Line,
            },
        }
    }
}

/// Immutable process-wide settings, read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub account_id: String,
    pub budget_name: String,
    pub channel: ChannelConfig,
    pub retry_count: u32,
    pub profile: VariantProfile,
}

impl Config {
    pub fn from_env() -> Result<Self, CostNotifyError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CostNotifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(CostNotifyError::MissingEnv(name));

        let account_id = require("ACCOUNT_ID")?;
        let budget_name = require("BUDGET_NAME")?;

        let topic_arn = get("SNS_TOPIC_ARN");
        let line_token = get("LINE_NOTIFY_TOKEN");
        let requested = get("NOTIFY_CHANNEL")
            .map(|raw| {
                raw.parse::<ChannelKind>()
                    .map_err(|_| CostNotifyError::InvalidEnv {
                        name: "NOTIFY_CHANNEL",
                        value: raw,
                    })
            })
            .transpose()?;

        let kind = match (requested, &topic_arn, &line_token) {
            (Some(kind), _, _) => kind,
            (None, Some(_), None) => ChannelKind::Email,
            (None, None, Some(_)) => ChannelKind::Line,
            (None, Some(_), Some(_)) => return Err(CostNotifyError::AmbiguousChannel),
            (None, None, None) => return Err(CostNotifyError::MissingEnv("SNS_TOPIC_ARN")),
        };

        let channel = match kind {
            ChannelKind::Email => ChannelConfig::Topic {
                topic_arn: topic_arn.ok_or(CostNotifyError::MissingEnv("SNS_TOPIC_ARN"))?,
            },
            ChannelKind::Line => ChannelConfig::Line {
                token: line_token.ok_or(CostNotifyError::MissingEnv("LINE_NOTIFY_TOKEN"))?,
                endpoint: get("LINE_NOTIFY_URL")
                    .unwrap_or_else(|| LINE_NOTIFY_ENDPOINT.to_string()),
            },
        };

        let retry_count = match get("RETRY_COUNT") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(count) if count > 0 => count,
                _ => {
                    return Err(CostNotifyError::InvalidEnv {
                        name: "RETRY_COUNT",
                        value: raw,
                    });
                }
            },
            None => DEFAULT_RETRY_COUNT,
        };

        let mut profile = VariantProfile::for_channel(kind);
        if let Some(raw) = get("COST_WINDOW") {
            profile.window = raw
                .parse::<WindowMonth>()
                .map_err(|_| CostNotifyError::InvalidEnv {
                    name: "COST_WINDOW",
                    value: raw,
                })?;
        }

        Ok(Self {
            account_id,
            budget_name,
            channel,
            retry_count,
            profile,
        })
    }

    /// Serializable view with notification secrets masked.
    pub fn redacted(&self) -> serde_json::Value {
        let channel = match &self.channel {
            ChannelConfig::Topic { topic_arn } => serde_json::json!({
                "kind": ChannelKind::Email,
                "topicArn": topic_arn,
            }),
            ChannelConfig::Line { endpoint, .. } => serde_json::json!({
                "kind": ChannelKind::Line,
                "token": REDACTED,
                "endpoint": endpoint,
            }),
        };
        serde_json::json!({
            "accountId": self.account_id,
            "budgetName": self.budget_name,
            "channel": channel,
            "retryCount": self.retry_count,
            "profile": self.profile,
        })
    }
}
