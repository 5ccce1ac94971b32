//! Report workflow: submit, poll until ready, emit.
//!
//! ```text
//! Submitting -> PollingForReady -> Ready -> Emitting -> Done
//!      |               |  ^
//!      |               +--+  Report still null: fixed sleep, poll again
//!      +---------------+---> Failed
//! ```
//!
//! Polling has no bound unless [`PollSettings::max_attempts`] is set; a
//! report that never becomes ready keeps the run waiting. Request-level
//! failures are retried inside [`ReportClient`], not here.

use std::time::Duration;

use serde_json::Value;
use tap_zoomph_core::{RecordSink, Sleeper, Transport, redact_url};

use crate::api::ReportClient;
use crate::error::ReportError;
use crate::report::{PollResult, ReportHandle, ReportRequest};
use crate::schema::{KEY_PROPERTY, STREAM, schema};

/// Externally visible workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Submitting,
    PollingForReady,
    Ready,
    Emitting,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait between polls of a report that is not ready yet
    pub interval: Duration,
    /// Give up after this many polls. `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

/// What a completed run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSummary {
    pub report_id: u64,
    pub poll_attempts: u32,
    pub records: usize,
}

enum State {
    Submitting,
    PollingForReady(ReportHandle),
    Ready(ReportHandle, Vec<Value>),
    Emitting(ReportHandle, Vec<Value>),
    Done(SyncSummary),
    Failed,
}

/// One report run as an explicit state machine.
///
/// [`step`](Self::step) performs a single transition; [`run`](Self::run)
/// steps until `Done` or the first error.
pub struct ReportWorkflow<'c, T, S> {
    client: &'c ReportClient<T, S>,
    request: ReportRequest,
    poll: PollSettings,
    state: State,
    poll_attempts: u32,
}

impl<'c, T: Transport, S: Sleeper> ReportWorkflow<'c, T, S> {
    pub fn new(client: &'c ReportClient<T, S>, request: ReportRequest, poll: PollSettings) -> Self {
        Self {
            client,
            request,
            poll,
            state: State::Submitting,
            poll_attempts: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Submitting => Phase::Submitting,
            State::PollingForReady(_) => Phase::PollingForReady,
            State::Ready(..) => Phase::Ready,
            State::Emitting(..) => Phase::Emitting,
            State::Done(_) => Phase::Done,
            State::Failed => Phase::Failed,
        }
    }

    /// Polls issued so far
    pub fn poll_attempts(&self) -> u32 {
        self.poll_attempts
    }

    /// Perform one transition and return the phase reached.
    ///
    /// On error the workflow is left in [`Phase::Failed`] and the failure
    /// context is logged. `Done` and `Failed` are terminal: stepping them
    /// does nothing.
    pub fn step(&mut self, sink: &mut dyn RecordSink) -> Result<Phase, ReportError> {
        let state = std::mem::replace(&mut self.state, State::Failed);
        match self.advance(state, sink) {
            Ok(next) => {
                self.state = next;
                Ok(self.phase())
            }
            Err(e) => {
                e.log_critical();
                Err(e)
            }
        }
    }

    /// Step until the report has been emitted.
    ///
    /// A workflow whose earlier [`step`](Self::step) failed is not resumed:
    /// `run` returns [`ReportError::Aborted`] without another request.
    pub fn run(mut self, sink: &mut dyn RecordSink) -> Result<SyncSummary, ReportError> {
        loop {
            self.step(sink)?;
            match self.state {
                State::Done(summary) => return Ok(summary),
                State::Failed => return Err(ReportError::Aborted),
                _ => {}
            }
        }
    }

    fn advance(&mut self, state: State, sink: &mut dyn RecordSink) -> Result<State, ReportError> {
        match state {
            State::Submitting => {
                let handle = self.client.submit_report(&self.request)?;
                log::debug!("Polling {}", redact_url(&self.client.poll_url(handle)));
                Ok(State::PollingForReady(handle))
            }
            State::PollingForReady(handle) => {
                self.poll_attempts += 1;
                match self.client.fetch_report(handle)? {
                    PollResult::Ready(rows) => {
                        log::info!(
                            "{handle} ready: {} rows after {} poll(s)",
                            rows.len(),
                            self.poll_attempts
                        );
                        Ok(State::Ready(handle, rows))
                    }
                    PollResult::Pending => {
                        if let Some(max) = self.poll.max_attempts {
                            if self.poll_attempts >= max {
                                return Err(ReportError::PollLimit {
                                    url: redact_url(&self.client.poll_url(handle)),
                                    attempts: self.poll_attempts,
                                });
                            }
                        }
                        log::info!(
                            "{handle} not ready (poll {}), sleeping {:?}",
                            self.poll_attempts,
                            self.poll.interval
                        );
                        self.client.sleeper().sleep(self.poll.interval);
                        Ok(State::PollingForReady(handle))
                    }
                }
            }
            State::Ready(handle, rows) => {
                sink.write_schema(STREAM, &schema(), &[KEY_PROPERTY])?;
                Ok(State::Emitting(handle, rows))
            }
            State::Emitting(handle, rows) => {
                for row in &rows {
                    if row.get(KEY_PROPERTY).is_none() {
                        log::warn!("{handle}: row without {KEY_PROPERTY}");
                    }
                    sink.write_records(STREAM, std::slice::from_ref(row))?;
                }
                Ok(State::Done(SyncSummary {
                    report_id: handle.report_id,
                    poll_attempts: self.poll_attempts,
                    records: rows.len(),
                }))
            }
            terminal @ (State::Done(_) | State::Failed) => Ok(terminal),
        }
    }
}
