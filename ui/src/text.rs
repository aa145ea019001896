use anyhow::Result;
use costnotify_core::model::{Message, OutputFormat, Report};
use serde_json::json;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub pretty: bool,
}

/// Output of `run --dry-run`: the message that would have been published.
pub fn render_dry_run(report: &Report, message: &Message, options: &RenderOptions) -> Result<String> {
    match options.format {
        OutputFormat::Json => {
            let payload = json!({
                "report": report,
                "message": message,
            });
            let json = if options.pretty {
                serde_json::to_string_pretty(&payload)?
            } else {
                serde_json::to_string(&payload)?
            };
            Ok(json)
        }
        OutputFormat::Text => Ok(format!(
            "== {} .. {} ==\nSubject: {}\n\n{}",
            report.window.start_str(),
            report.window.end_str(),
            message.subject,
            message.body
        )),
    }
}
