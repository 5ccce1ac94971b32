//! Fatal error type for a report run

use serde_json::json;
use tap_zoomph_core::HttpError;

/// Error that ends a report run.
///
/// Every variant is fatal for the invocation; [`ReportError::log_critical`]
/// writes the structured context the operator needs.
#[derive(Debug)]
pub enum ReportError {
    /// Request failed permanently or ran out of retries
    Transport(HttpError),
    /// 2xx response whose body is not what the API contract promises
    Malformed {
        url: String,
        reason: String,
        body: String,
    },
    /// Report still not ready after the configured number of polls
    PollLimit { url: String, attempts: u32 },
    /// Record sink could not be written
    Sink(std::io::Error),
    /// Run requested on a workflow that had already failed
    Aborted,
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::Malformed { reason, .. } => write!(f, "malformed response: {reason}"),
            Self::PollLimit { attempts, .. } => {
                write!(f, "report not ready after {attempts} polls")
            }
            Self::Sink(e) => write!(f, "sink: {e}"),
            Self::Aborted => write!(f, "workflow already failed"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Sink(e) => Some(e),
            Self::Malformed { .. } | Self::PollLimit { .. } | Self::Aborted => None,
        }
    }
}

impl From<HttpError> for ReportError {
    fn from(e: HttpError) -> Self {
        Self::Transport(e)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        Self::Sink(e)
    }
}

impl ReportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// `{"url", "status", "message"}` context of the failure
    pub fn context(&self) -> serde_json::Value {
        match self {
            Self::Transport(e) => json!({
                "url": e.url(),
                "status": e.status(),
                "message": e.body(),
            }),
            Self::Malformed { url, reason, body } => json!({
                "url": url,
                "status": null,
                "message": format!("{reason}: {body}"),
            }),
            Self::PollLimit { url, attempts } => json!({
                "url": url,
                "status": null,
                "message": format!("report not ready after {attempts} polls"),
            }),
            Self::Sink(e) => json!({
                "url": null,
                "status": null,
                "message": e.to_string(),
            }),
            Self::Aborted => json!({
                "url": null,
                "status": null,
                "message": self.to_string(),
            }),
        }
    }

    pub fn log_critical(&self) {
        log::error!("{}", self.context());
    }
}
