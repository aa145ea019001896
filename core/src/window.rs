use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which calendar month the aggregation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMonth {
    Previous,
    Current,
}

impl fmt::Display for WindowMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WindowMonth::Previous => "previous",
            WindowMonth::Current => "current",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for WindowMonth {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "previous" | "last" => Ok(WindowMonth::Previous),
            "current" | "this" => Ok(WindowMonth::Current),
            other => Err(format!("unknown window month: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    #[serde(serialize_with = "serialize_date")]
    pub start: NaiveDate,
    #[serde(serialize_with = "serialize_date")]
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }

    /// `YYYY-MM` of the start date.
    pub fn month_label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

pub fn compute_window(now: DateTime<Utc>, month: WindowMonth) -> TimeWindow {
    let today = now.date_naive();
    let first_of_month = today - chrono::Days::new(u64::from(today.day0()));
    let start = match month {
        WindowMonth::Current => first_of_month,
        WindowMonth::Previous => first_of_month
            .checked_sub_months(Months::new(1))
            .unwrap_or(first_of_month),
    };

    tracing::debug!(
        start = %start.format(DATE_FORMAT),
        end = %today.format(DATE_FORMAT),
        "computed UTC cost window"
    );

    TimeWindow { start, end: today }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}
