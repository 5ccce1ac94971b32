//! Blocking HTTP transport over a shared async client.
//!
//! Uses async reqwest internally on a current-thread runtime, but presents
//! a sync interface so the report workflow stays a plain loop.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Url;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-request timeout (report payloads can be large)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Error types for transport operations
#[derive(Debug)]
pub enum HttpError {
    /// Server answered with a non-2xx status
    Status {
        url: String,
        status: u16,
        body: String,
    },
    /// Request never produced a response (connect, timeout, body read)
    Request { url: String, message: String },
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, body, .. } => write!(f, "HTTP {status}: {body}"),
            Self::Request { message, .. } => write!(f, "HTTP error: {message}"),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create a request error from reqwest, keeping only the redacted URL
    pub fn from_reqwest(url: &Url, e: reqwest::Error) -> Self {
        // reqwest's message embeds the full URL, token included
        Self::Request {
            url: redact_url(url),
            message: e.without_url().to_string(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Request { url, .. } => url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request { .. } => None,
        }
    }

    /// Response body, or the transport message when there was no response
    pub fn body(&self) -> &str {
        match self {
            Self::Status { body, .. } => body,
            Self::Request { message, .. } => message,
        }
    }

    /// 429 and 5xx are worth another attempt; so is anything that never got
    /// a status. Other 4xx are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Request { .. } => true,
        }
    }
}

/// Copy of `url` with the `access_token` query value masked, for logging.
pub fn redact_url(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "access_token") {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// One logical HTTP exchange. Implementations return the response body on
/// 2xx and an [`HttpError`] otherwise; retrying is the caller's concern.
pub trait Transport {
    /// POST a form-encoded body. Keys may repeat.
    fn post_form(&self, url: &Url, form: &[(String, String)]) -> Result<String, HttpError>;

    /// GET and return the body as text.
    fn get(&self, url: &Url) -> Result<String, HttpError>;
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations. Single-threaded: the workflow
/// only ever has one request in flight.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// [`Transport`] backed by the shared reqwest client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    fn execute(&self, url: &Url, request: reqwest::RequestBuilder) -> Result<String, HttpError> {
        SHARED_RUNTIME.block_on(async {
            let response = request
                .send()
                .await
                .map_err(|e| HttpError::from_reqwest(url, e))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::from_reqwest(url, e))?;
            if status.is_success() {
                Ok(body)
            } else {
                Err(HttpError::Status {
                    url: redact_url(url),
                    status: status.as_u16(),
                    body,
                })
            }
        })
    }
}

impl Transport for HttpTransport {
    fn post_form(&self, url: &Url, form: &[(String, String)]) -> Result<String, HttpError> {
        self.execute(url, http_client().post(url.clone()).form(form))
    }

    fn get(&self, url: &Url) -> Result<String, HttpError> {
        self.execute(url, http_client().get(url.clone()))
    }
}
