//! Normalized view of an inbound HTTP request.

use crate::predicate::parse_query_string;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::Request;
use std::collections::HashMap;

/// The request as seen by a [`RequestHandler`](super::RequestHandler).
///
/// The path is percent-decoded. Header names are lowercased; repeated
/// headers are joined with `", "`.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, Vec<String>>,
    pub raw_query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl NormalizedRequest {
    /// Build a request from a method and a path with optional query string.
    pub fn new(method: impl Into<String>, path_and_query: &str) -> Self {
        let (path, raw_query) = match path_and_query.split_once('?') {
            Some((path, query)) => (decode_path(path), Some(query.to_string())),
            None => (decode_path(path_and_query), None),
        };
        Self {
            method: method.into(),
            path,
            query: raw_query
                .as_deref()
                .map(parse_query_string)
                .unwrap_or_default(),
            raw_query,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.add_header(name, &value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.headers
            .entry(name.to_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    /// Body decoded as text, lossily
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Collect a hyper request into a normalized request.
    ///
    /// A body that fails to arrive is treated as empty.
    pub async fn from_hyper(req: Request<Incoming>) -> Self {
        let (parts, body) = req.into_parts();

        let mut normalized = NormalizedRequest::new(
            parts.method.as_str(),
            parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/"),
        );
        for (name, value) in &parts.headers {
            normalized.add_header(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        normalized.body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => Bytes::new(),
        };
        normalized
    }
}

/// Percent-decode a path. `+` stays literal; it only means space in queries.
fn decode_path(path: &str) -> String {
    urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
