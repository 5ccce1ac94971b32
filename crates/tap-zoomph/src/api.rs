//! Zoomph partner-mention report API client

use reqwest::Url;
use serde_json::Value;
use tap_zoomph_core::{RetryPolicy, Sleeper, Transport, redact_url, retry_with_backoff};

use crate::error::ReportError;
use crate::report::{PollResult, ReportHandle, ReportRequest};
use crate::schema::FIELDS;

pub const DEFAULT_ENDPOINT: &str = "https://api.zoomph.com/partnermention/report";

/// Submit and poll calls against one report endpoint, each wrapped in the
/// transport retry policy.
pub struct ReportClient<T, S> {
    transport: T,
    sleeper: S,
    endpoint: Url,
    access_token: String,
    retry: RetryPolicy,
}

impl<T, S> std::fmt::Debug for ReportClient<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<T: Transport, S: Sleeper> ReportClient<T, S> {
    pub fn new(
        transport: T,
        sleeper: S,
        endpoint: Url,
        access_token: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            endpoint,
            access_token: access_token.into(),
            retry,
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// `{endpoint}?access_token={token}`
    pub fn submit_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token);
        url
    }

    /// `{endpoint}/{reportId}?access_token={token}&fields=..`, one `fields`
    /// pair per entry of [`FIELDS`], in order.
    pub fn poll_url(&self, handle: ReportHandle) -> Url {
        let mut url = self.endpoint.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), handle.report_id);
        url.set_path(&path);
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token)
            .extend_pairs(FIELDS.iter().map(|field| ("fields", *field)));
        url
    }

    /// POST the report request and read `ReportId` from the response.
    pub fn submit_report(&self, request: &ReportRequest) -> Result<ReportHandle, ReportError> {
        let url = self.submit_url();
        let form = request.form();
        log::info!("Submitting report: {}", request.query());

        let body = retry_with_backoff("submit report", &self.retry, &self.sleeper, || {
            self.transport.post_form(&url, &form)
        })?;
        log::debug!("Submit response: {body}");

        let parsed = parse_json(&url, &body)?;
        let report_id = parsed
            .get("ReportId")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed(&url, "missing or non-numeric ReportId", &body))?;

        log::info!("Report {report_id} submitted");
        Ok(ReportHandle { report_id })
    }

    /// GET the report once. A `null` or absent `Report` is [`PollResult::Pending`].
    pub fn fetch_report(&self, handle: ReportHandle) -> Result<PollResult, ReportError> {
        let url = self.poll_url(handle);
        let body = retry_with_backoff("fetch report", &self.retry, &self.sleeper, || {
            self.transport.get(&url)
        })?;

        let mut parsed = parse_json(&url, &body)?;
        if !parsed.is_object() {
            return Err(malformed(&url, "response is not a JSON object", &body));
        }
        match parsed.get_mut("Report").map(Value::take) {
            None | Some(Value::Null) => Ok(PollResult::Pending),
            Some(Value::Array(rows)) => Ok(PollResult::Ready(rows)),
            Some(_) => Err(malformed(&url, "Report is neither an array nor null", &body)),
        }
    }
}

fn parse_json(url: &Url, body: &str) -> Result<Value, ReportError> {
    serde_json::from_str(body).map_err(|e| malformed(url, &format!("invalid JSON ({e})"), body))
}

fn malformed(url: &Url, reason: &str, body: &str) -> ReportError {
    ReportError::Malformed {
        url: redact_url(url),
        reason: reason.to_string(),
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{FakeTransport, RecordingSleeper, test_retry};

    fn client(transport: FakeTransport) -> ReportClient<FakeTransport, RecordingSleeper> {
        ReportClient::new(
            transport,
            RecordingSleeper::default(),
            Url::parse(DEFAULT_ENDPOINT).unwrap(),
            "tok",
            test_retry(),
        )
    }

    #[test]
    fn submit_url_carries_token() {
        let c = client(FakeTransport::default());
        assert_eq!(
            c.submit_url().as_str(),
            "https://api.zoomph.com/partnermention/report?access_token=tok"
        );
    }

    #[test]
    fn poll_url_lists_every_field_once_in_order() {
        let c = client(FakeTransport::default());
        let url = c.poll_url(ReportHandle { report_id: 42 });

        assert_eq!(url.path(), "/partnermention/report/42");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("access_token".to_string(), "tok".to_string()));
        let fields: Vec<&str> = pairs[1..]
            .iter()
            .map(|(k, v)| {
                assert_eq!(k, "fields");
                v.as_str()
            })
            .collect();
        assert_eq!(fields, FIELDS.to_vec());
    }

    #[test]
    fn poll_url_is_stable() {
        let c = client(FakeTransport::default());
        let h = ReportHandle { report_id: 7 };
        assert_eq!(c.poll_url(h), c.poll_url(h));
    }

    #[test]
    fn poll_url_tolerates_trailing_slash() {
        let c = ReportClient::new(
            FakeTransport::default(),
            RecordingSleeper::default(),
            Url::parse("https://api.example.com/report/").unwrap(),
            "tok",
            test_retry(),
        );
        assert_eq!(c.poll_url(ReportHandle { report_id: 3 }).path(), "/report/3");
    }

    #[test]
    fn submit_reads_report_id() {
        let transport = FakeTransport::default();
        transport.push_post(Ok(r#"{"ReportId": 991, "Status": "Queued"}"#));
        let c = client(transport.clone());

        let req = ReportRequest::new(vec![json!(1)], Some(json!(2)), "s", "e");
        let handle = c.submit_report(&req).unwrap();

        assert_eq!(handle.report_id, 991);
        let posts = transport.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1, req.form());
    }

    #[test]
    fn submit_without_report_id_is_malformed() {
        let transport = FakeTransport::default();
        transport.push_post(Ok(r#"{"Error": "nope"}"#));
        let c = client(transport);

        let err = c
            .submit_report(&ReportRequest::new(vec![], None, "s", "e"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Malformed { .. }));
        assert!(err.context()["url"].as_str().unwrap().contains("access_token=***"));
    }

    #[test]
    fn submit_non_json_is_malformed() {
        let transport = FakeTransport::default();
        transport.push_post(Ok("<html>"));
        let err = client(transport)
            .submit_report(&ReportRequest::new(vec![], None, "s", "e"))
            .unwrap_err();
        assert!(matches!(err, ReportError::Malformed { .. }));
    }

    #[test]
    fn submit_retries_server_errors_five_times() {
        let transport = FakeTransport::default();
        for _ in 0..5 {
            transport.push_post(Err(500));
        }
        let c = client(transport.clone());

        let err = c
            .submit_report(&ReportRequest::new(vec![], None, "s", "e"))
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.posts().len(), 5);
        assert_eq!(c.sleeper().sleeps().len(), 4);
    }

    #[test]
    fn submit_client_error_is_not_retried() {
        let transport = FakeTransport::default();
        transport.push_post(Err(400));
        let c = client(transport.clone());

        let err = c
            .submit_report(&ReportRequest::new(vec![], None, "s", "e"))
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(transport.posts().len(), 1);
        assert!(c.sleeper().sleeps().is_empty());
    }

    #[test]
    fn fetch_null_report_is_pending() {
        let transport = FakeTransport::default();
        transport.push_get(Ok(r#"{"Report": null}"#));
        let result = client(transport)
            .fetch_report(ReportHandle { report_id: 1 })
            .unwrap();
        assert_eq!(result, PollResult::Pending);
    }

    #[test]
    fn fetch_absent_report_is_pending() {
        let transport = FakeTransport::default();
        transport.push_get(Ok(r#"{"Status": "Processing"}"#));
        let result = client(transport)
            .fetch_report(ReportHandle { report_id: 1 })
            .unwrap();
        assert_eq!(result, PollResult::Pending);
    }

    #[test]
    fn fetch_empty_report_is_ready() {
        let transport = FakeTransport::default();
        transport.push_get(Ok(r#"{"Report": []}"#));
        let result = client(transport)
            .fetch_report(ReportHandle { report_id: 1 })
            .unwrap();
        assert_eq!(result, PollResult::Ready(vec![]));
    }

    #[test]
    fn fetch_rows_keep_order() {
        let transport = FakeTransport::default();
        transport.push_get(Ok(r#"{"Report": [{"Id": 2}, {"Id": 1}]}"#));
        let result = client(transport)
            .fetch_report(ReportHandle { report_id: 1 })
            .unwrap();
        assert_eq!(result, PollResult::Ready(vec![json!({"Id": 2}), json!({"Id": 1})]));
    }

    #[test]
    fn fetch_report_of_wrong_type_is_malformed() {
        let transport = FakeTransport::default();
        transport.push_get(Ok(r#"{"Report": "soon"}"#));
        let err = client(transport)
            .fetch_report(ReportHandle { report_id: 1 })
            .unwrap_err();
        assert!(matches!(err, ReportError::Malformed { .. }));
    }

    #[test]
    fn fetch_non_object_is_malformed() {
        let transport = FakeTransport::default();
        transport.push_get(Ok("[]"));
        let err = client(transport)
            .fetch_report(ReportHandle { report_id: 1 })
            .unwrap_err();
        assert!(matches!(err, ReportError::Malformed { .. }));
    }
}
