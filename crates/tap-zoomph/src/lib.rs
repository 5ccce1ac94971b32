//! tap-zoomph - Zoomph partner-mention report tap
//!
//! Submits an asynchronous mention report, polls until it is generated and
//! emits its rows as a Singer stream.

pub mod api;
pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod schema;
pub mod state;
pub mod workflow;

#[cfg(test)]
mod testing;

// Re-exports
pub use api::{DEFAULT_ENDPOINT, ReportClient};
pub use config::Config;
pub use error::ReportError;
pub use report::{PollResult, ReportHandle, ReportRequest};
pub use runner::{RunOutcome, run};
pub use state::State;
pub use workflow::{Phase, PollSettings, ReportWorkflow, SyncSummary};
