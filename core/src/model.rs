use crate::window::TimeWindow;
use serde::Serialize;
use std::fmt;

pub type AccountId = String;
pub type AccountName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One group of a cost-and-usage response, scoped to a single reporting period.
#[derive(Debug, Clone, PartialEq)]
pub struct CostGroup {
    pub key: String,
    pub amount: String,
    pub unit: String,
}

impl CostGroup {
    pub fn new(key: impl Into<String>, amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            amount: amount.into(),
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupDimension {
    Service,
    LinkedAccount,
}

impl GroupDimension {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupDimension::Service => "SERVICE",
            GroupDimension::LinkedAccount => "LINKED_ACCOUNT",
        }
    }
}

impl fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: usize,
    pub cost: String,
    pub unit: String,
    pub label: String,
}

impl fmt::Display for RankingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TOP{} {}{} : {}",
            self.rank, self.cost, self.unit, self.label
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCost {
    pub amount: i64,
    pub unit: String,
}

impl fmt::Display for TotalCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub window: TimeWindow,
    pub total: TotalCost,
    pub accounts: Vec<RankingEntry>,
    pub services: Vec<RankingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLayout {
    Email,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Config,
    Api,
    Transport,
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Config => "config",
            ErrorKind::Api => "api",
            ErrorKind::Transport => "transport",
            ErrorKind::Unexpected => "unexpected",
        };
        write!(f, "{}", label)
    }
}
