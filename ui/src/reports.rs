//! Notification layouts for a finished cost report.

use costnotify_core::model::{Message, MessageLayout, RankingEntry, Report};

pub const SUBJECT_PREFIX: &str = "【Cost Notification】";
pub const TOTAL_HEADER: &str = "【Total Cost】";
pub const ACCOUNT_HEADER: &str = "【Account Cost Ranking】";
pub const SERVICE_HEADER: &str = "【Service Cost Ranking】";

pub fn render_message(report: &Report, layout: MessageLayout) -> Message {
    match layout {
        MessageLayout::Email => Message {
            subject: format!("{}{}", SUBJECT_PREFIX, report.window.start_str()),
            body: render_sections(report),
        },
        MessageLayout::Line => {
            // LINE shows the month only: the start date minus its day.
            let subject = report.window.month_label();
            let body = format!("{}\n{}", subject, render_sections(report));
            Message { subject, body }
        }
    }
}

fn render_sections(report: &Report) -> String {
    [
        format!("{}\n{}", TOTAL_HEADER, report.total),
        format!("{}\n{}", ACCOUNT_HEADER, ranking_lines(&report.accounts)),
        format!("{}\n{}", SERVICE_HEADER, ranking_lines(&report.services)),
    ]
    .join("\n\n")
}

fn ranking_lines(entries: &[RankingEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use costnotify_core::model::{CostGroup, TotalCost};
    use costnotify_core::ranking::{
        Accumulation, TotalPolicy, TotalScope, rank_accounts, rank_services,
    };
    use costnotify_core::window::TimeWindow;
    use std::collections::HashMap;

    fn window() -> TimeWindow {
        TimeWindow {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).expect("start date"),
            end: NaiveDate::from_ymd_opt(2024, 3, 15).expect("end date"),
        }
    }

    fn sample_report(policy: TotalPolicy) -> Report {
        let services = rank_services(&[
            CostGroup::new("EC2", "120.50", "USD"),
            CostGroup::new("Tax", "10.00", "USD"),
            CostGroup::new("S3", "30.20", "USD"),
        ])
        .expect("service ranking");
        let names: HashMap<String, String> = [("111", "Dev"), ("222", "Ops")]
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        let (total, accounts) = rank_accounts(
            &[
                CostGroup::new("111", "100.00", "USD"),
                CostGroup::new("222", "50.70", "USD"),
            ],
            &names,
            policy,
        )
        .expect("account ranking");

        Report {
            window: window(),
            total,
            accounts,
            services,
        }
    }

    #[test]
    fn renders_email_layout() {
        let report = sample_report(TotalPolicy {
            scope: TotalScope::Unfiltered,
            accumulation: Accumulation::TruncateEach,
        });

        let message = render_message(&report, MessageLayout::Email);

        assert_eq!(message.subject, "【Cost Notification】2024-02-01");
        assert_eq!(
            message.body,
            "【Total Cost】\n150USD\n\n\
             【Account Cost Ranking】\nTOP1 100USD : Dev(111)\nTOP2 50USD : Ops(222)\n\n\
             【Service Cost Ranking】\nTOP1 120USD : EC2\nTOP2 30USD : S3"
        );
    }

    #[test]
    fn renders_line_layout_with_month_prefix() {
        let report = sample_report(TotalPolicy {
            scope: TotalScope::Unfiltered,
            accumulation: Accumulation::SumThenTruncate,
        });

        let message = render_message(&report, MessageLayout::Line);

        assert_eq!(message.subject, "2024-02");
        assert!(message.body.starts_with("2024-02\n【Total Cost】\n150USD\n\n"));
        assert!(message.body.contains("TOP1 100USD : Dev(111)"));
        assert!(message.body.contains("TOP2 50USD : Ops(222)"));
        assert!(message.body.ends_with("TOP1 120USD : EC2\nTOP2 30USD : S3"));
        assert!(!message.body.contains("Tax"));
    }

    #[test]
    fn empty_rankings_keep_headers() {
        let report = Report {
            window: window(),
            total: TotalCost {
                amount: 0,
                unit: String::new(),
            },
            accounts: Vec::new(),
            services: Vec::new(),
        };

        let message = render_message(&report, MessageLayout::Email);
        assert_eq!(
            message.body,
            "【Total Cost】\n0\n\n【Account Cost Ranking】\n\n\n【Service Cost Ranking】\n"
        );
    }
}
