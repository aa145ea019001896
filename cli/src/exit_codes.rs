use costnotify_core::model::ErrorKind;
use costnotify_core::service::error_kind;

/// Exit status for failures that stop the process before the handler runs.
pub fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    match error_kind(err) {
        ErrorKind::Config => 3,
        ErrorKind::Api | ErrorKind::Transport | ErrorKind::Unexpected => 1,
    }
}

/// Headline logged before the cause chain, one per error category.
pub fn headline_for_kind(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Config => "Configuration is incomplete or invalid.",
        ErrorKind::Api => "An error occurred with the AWS API.",
        ErrorKind::Transport => "An error occurred in the transport layer.",
        ErrorKind::Unexpected => "An unexpected error occurred.",
    }
}
