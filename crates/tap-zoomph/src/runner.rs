//! Main execution logic for one tap invocation

use std::io::Write;

use anyhow::Context;
use chrono::Utc;
use reqwest::Url;
use tap_zoomph_core::{HttpTransport, SingerSink, ThreadSleeper};

use crate::api::ReportClient;
use crate::config::{Config, end_bound};
use crate::error::ReportError;
use crate::report::ReportRequest;
use crate::state::State;
use crate::workflow::{ReportWorkflow, SyncSummary};

/// How a run that got as far as talking to the API ended
#[derive(Debug)]
pub enum RunOutcome {
    Completed(SyncSummary),
    /// Already logged with full context
    Failed(ReportError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Submit one report, wait for it, and write the Singer stream to `out`.
///
/// Setup problems (missing token, bad endpoint, bad `start_date`) are
/// returned as `Err`; failures of the report itself as [`RunOutcome::Failed`].
pub fn run(config: &Config, state: &State, out: impl Write) -> anyhow::Result<RunOutcome> {
    let access_token = config.access_token()?;
    let endpoint = Url::parse(&config.endpoint)
        .with_context(|| format!("Invalid endpoint: {}", config.endpoint))?;

    if let Some(end_date) = &config.end_date {
        log::debug!("end_date {end_date} ignored, reports end at now + 1 day");
    }
    if !state.is_empty() {
        log::debug!("State given but not applied, start_date bounds the report");
    }

    let now = Utc::now();
    let request = ReportRequest::new(
        config.partners.clone().unwrap_or_default(),
        config.feed_id.clone(),
        &config.start_bound(now)?,
        &end_bound(now),
    );
    log::info!(
        "tap-zoomph starting: partners={}, feed_id={}, query={:?}",
        request.partners().len(),
        request
            .feed_id()
            .map_or_else(|| "-".to_string(), ToString::to_string),
        request.query()
    );

    let client = ReportClient::new(
        HttpTransport,
        ThreadSleeper,
        endpoint,
        access_token,
        config.retry_policy(),
    );
    let mut sink = SingerSink::new(out);

    match ReportWorkflow::new(&client, request, config.poll_settings()).run(&mut sink) {
        Ok(summary) => {
            log::info!(
                "Report {} done: {} records after {} poll(s)",
                summary.report_id,
                summary.records,
                summary.poll_attempts
            );
            Ok(RunOutcome::Completed(summary))
        }
        Err(e) => Ok(RunOutcome::Failed(e)),
    }
}
