//! Test doubles: scripted transport, recording sleeper, collecting sink

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tap_zoomph_core::{HttpError, RecordSink, RetryPolicy, Sleeper, Transport};

/// Attempts as in production, delay fixed at 30s so recorded sleeps are exact.
pub fn test_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        interval: Duration::from_secs(30),
        max_jitter: Duration::ZERO,
    }
}

type Scripted = Result<&'static str, u16>;

#[derive(Default)]
struct Script {
    posts: VecDeque<Scripted>,
    gets: VecDeque<Scripted>,
    post_log: Vec<(String, Vec<(String, String)>)>,
    get_log: Vec<String>,
}

/// Replays queued responses; `Err(status)` becomes an [`HttpError::Status`].
/// Panics on a request nothing was queued for.
#[derive(Clone, Default)]
pub struct FakeTransport(Rc<RefCell<Script>>);

impl FakeTransport {
    pub fn push_post(&self, response: Scripted) {
        self.0.borrow_mut().posts.push_back(response);
    }

    pub fn push_get(&self, response: Scripted) {
        self.0.borrow_mut().gets.push_back(response);
    }

    pub fn posts(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.0.borrow().post_log.clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.0.borrow().get_log.clone()
    }
}

fn replay(url: &Url, response: Option<Scripted>) -> Result<String, HttpError> {
    match response {
        Some(Ok(body)) => Ok(body.to_string()),
        Some(Err(status)) => Err(HttpError::Status {
            url: url.to_string(),
            status,
            body: format!("scripted {status}"),
        }),
        None => panic!("unexpected request to {url}"),
    }
}

impl Transport for FakeTransport {
    fn post_form(&self, url: &Url, form: &[(String, String)]) -> Result<String, HttpError> {
        let mut script = self.0.borrow_mut();
        script.post_log.push((url.to_string(), form.to_vec()));
        let next = script.posts.pop_front();
        replay(url, next)
    }

    fn get(&self, url: &Url) -> Result<String, HttpError> {
        let mut script = self.0.borrow_mut();
        script.get_log.push(url.to_string());
        let next = script.gets.pop_front();
        replay(url, next)
    }
}

#[derive(Clone, Default)]
pub struct RecordingSleeper(Rc<RefCell<Vec<Duration>>>);

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.0.borrow().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.0.borrow_mut().push(duration);
    }
}

/// Keeps every call so tests can check ordering and batch sizes.
#[derive(Default)]
pub struct CollectingSink {
    pub schemas: Vec<(String, Value, Vec<String>)>,
    pub batches: Vec<(String, Vec<Value>)>,
    pub fail_writes: bool,
}

impl RecordSink for CollectingSink {
    fn write_schema(
        &mut self,
        stream: &str,
        schema: &Value,
        key_properties: &[&str],
    ) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.schemas.push((
            stream.to_string(),
            schema.clone(),
            key_properties.iter().map(|k| k.to_string()).collect(),
        ));
        Ok(())
    }

    fn write_records(&mut self, stream: &str, records: &[Value]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.batches.push((stream.to_string(), records.to_vec()));
        Ok(())
    }
}
