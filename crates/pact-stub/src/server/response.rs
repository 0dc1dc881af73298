//! Responses produced by request handlers.

use crate::contract::ResponseTemplate;
use crate::matcher::NoMatch;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// Header marking responses produced for unmatched requests
pub const NO_MATCH_HEADER: &str = "x-pact-stub-no-match";

/// A response ready to be written back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl StubResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replay a recorded interaction response.
    ///
    /// Structured bodies get `Content-Type: application/json` unless the
    /// template sets a content type itself.
    pub fn from_template(template: &ResponseTemplate) -> Self {
        let mut response = StubResponse {
            status: template.status,
            headers: template.headers.clone(),
            body: Bytes::from(template.body_bytes()),
        };
        if template.has_json_body() && !template.has_header("content-type") {
            response = response.with_header("Content-Type", "application/json");
        }
        response
    }

    /// The 500 response written when no interaction matched.
    pub fn no_match(no_match: &NoMatch) -> Self {
        StubResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            no_match.to_json().to_string(),
        )
        .with_header("Content-Type", "application/json")
        .with_header(NO_MATCH_HEADER, "true")
    }

    /// Convert into a hyper response.
    ///
    /// Invalid status codes or headers fall back to a minimal 500 response.
    pub fn into_hyper(self) -> Response<Full<Bytes>> {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(self.body)).unwrap_or_else(|_| {
            let mut response = Response::new(Full::new(Bytes::from("Response build error")));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_template_adds_json_content_type() {
        let template = ResponseTemplate::from_value(&json!({"status": 200, "body": {"id": 1}}));
        let response = StubResponse::from_template(&template);
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from(r#"{"id":1}"#));
        assert_eq!(
            response.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn test_from_template_keeps_authored_content_type() {
        let template = ResponseTemplate::from_value(&json!({
            "status": 200,
            "headers": {"content-type": "application/vnd.widget+json"},
            "body": {"id": 1}
        }));
        let response = StubResponse::from_template(&template);
        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.headers[0].1, "application/vnd.widget+json");
    }

    #[test]
    fn test_into_hyper() {
        let response = StubResponse::new(201, "created")
            .with_header("X-Id", "7")
            .into_hyper();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-id"], "7");
    }

    #[test]
    fn test_invalid_status_falls_back_to_500() {
        let response = StubResponse::new(42, "").into_hyper();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
