//! tap-zoomph core - plumbing for report-style extraction taps
//!
//! Blocking HTTP transport with retry classification, a constant jittered
//! retry policy, the Singer record sink and logging setup.

pub mod http;
pub mod logging;
pub mod retry;
pub mod sink;

// Re-exports for convenience
pub use http::{HttpError, HttpTransport, Transport, redact_url};
pub use logging::init_logging;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper, retry_with_backoff};
pub use sink::{RecordSink, SingerSink};
