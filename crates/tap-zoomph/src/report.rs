//! Report request, handle and poll result types

use serde_json::Value;

/// Submission for one report. Built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    partners: Vec<Value>,
    feed_id: Option<Value>,
    query: String,
}

impl ReportRequest {
    /// `start` and `end` are inserted verbatim into the upstream filter
    /// expression `created>{start} AND created<{end}`.
    pub fn new(partners: Vec<Value>, feed_id: Option<Value>, start: &str, end: &str) -> Self {
        Self {
            partners,
            feed_id,
            query: format!("created>{start} AND created<{end}"),
        }
    }

    pub fn partners(&self) -> &[Value] {
        &self.partners
    }

    pub fn feed_id(&self) -> Option<&Value> {
        self.feed_id.as_ref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Form body: one `Partners` pair per partner, then `FeedId`, then `Query`.
    /// A missing feed id is left out.
    pub fn form(&self) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = self
            .partners
            .iter()
            .map(|p| ("Partners".to_string(), scalar_to_string(p)))
            .collect();
        if let Some(feed_id) = &self.feed_id {
            form.push(("FeedId".to_string(), scalar_to_string(feed_id)));
        }
        form.push(("Query".to_string(), self.query.clone()));
        form
    }
}

/// Identifiers are opaque: strings go out bare, anything else as JSON text.
fn scalar_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Server-assigned handle of a submitted report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportHandle {
    pub report_id: u64,
}

impl std::fmt::Display for ReportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "report {}", self.report_id)
    }
}

/// Outcome of one poll. `Report: null` (or absent) means still processing.
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    Pending,
    Ready(Vec<Value>),
}
