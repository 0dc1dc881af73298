//! Type definitions for a loaded pact document.
//!
//! Pacts are authored externally and are frequently loosely shaped, so the
//! model is built field by field from a parsed JSON value: a missing or
//! mistyped field becomes absent/empty instead of failing the load.

use crate::predicate::{parse_query_string, PathPattern};
use serde_json::{Map, Value};
use std::collections::HashMap;

// ============================================================================
// Document
// ============================================================================

/// A loaded contract: the ordered interactions plus descriptive metadata.
///
/// Immutable once built. Reloading produces a new `Pact` that replaces the
/// old one wholesale.
#[derive(Debug, Clone, Default)]
pub struct Pact {
    pub consumer: Option<String>,
    pub provider: Option<String>,
    /// Value of `metadata.pactSpecification.version` when present
    pub specification_version: Option<String>,
    pub interactions: Vec<Interaction>,
}

impl Pact {
    /// Build a document from an already parsed JSON value.
    ///
    /// Never fails: a non-object root or a non-array `interactions` key yields
    /// a document with no interactions.
    pub fn from_value(value: &Value) -> Self {
        let Some(root) = value.as_object() else {
            return Pact::default();
        };

        let interactions = root
            .get("interactions")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Interaction::from_value).collect())
            .unwrap_or_default();

        let metadata = root.get("metadata").and_then(Value::as_object);
        let specification_version = metadata
            .and_then(|m| {
                m.get("pactSpecification")
                    .or_else(|| m.get("pact-specification"))
            })
            .and_then(|spec| spec.get("version"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Pact {
            consumer: participant_name(root, "consumer"),
            provider: participant_name(root, "provider"),
            specification_version,
            interactions,
        }
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

fn participant_name(root: &Map<String, Value>, key: &str) -> Option<String> {
    root.get(key)
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// ============================================================================
// Interaction
// ============================================================================

/// One request matcher / response template pair.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    pub description: Option<String>,
    /// Provider state names. Pact v2 carries a single `providerState`,
    /// v3 a `providerStates` list of `{name, params}` objects; both land here.
    pub provider_states: Vec<String>,
    pub request: RequestMatcher,
    pub response: ResponseTemplate,
}

impl Interaction {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Interaction::default();
        };

        let mut provider_states = Vec::new();
        if let Some(state) = obj
            .get("providerState")
            .or_else(|| obj.get("provider_state"))
            .and_then(Value::as_str)
        {
            provider_states.push(state.to_string());
        }
        if let Some(states) = obj.get("providerStates").and_then(Value::as_array) {
            provider_states.extend(
                states
                    .iter()
                    .filter_map(|s| s.get("name").and_then(Value::as_str))
                    .map(str::to_string),
            );
        }

        Interaction {
            description: obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            provider_states,
            request: obj
                .get("request")
                .map(RequestMatcher::from_value)
                .unwrap_or_default(),
            response: obj
                .get("response")
                .map(ResponseTemplate::from_value)
                .unwrap_or_default(),
        }
    }

    /// Whether this interaction was recorded under the given provider state.
    pub fn has_provider_state(&self, state: &str) -> bool {
        self.provider_states.iter().any(|s| s == state)
    }
}

// ============================================================================
// Request matcher
// ============================================================================

/// The request side of an interaction.
///
/// Absent fields place no constraint on the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestMatcher {
    pub method: Option<String>,
    pub path: Option<PathPattern>,
    /// Expected query parameters, name -> values
    pub query: Option<HashMap<String, Vec<String>>>,
    /// Expected headers with lowercased names
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestMatcher {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return RequestMatcher::default();
        };

        let path_regex = path_regex_rule(obj.get("matchingRules"));
        let path = obj
            .get("path")
            .and_then(Value::as_str)
            .map(|p| PathPattern::compile(p, path_regex.as_deref()));

        RequestMatcher {
            method: obj
                .get("method")
                .and_then(Value::as_str)
                .map(str::to_string),
            path,
            query: obj.get("query").and_then(query_from_value),
            headers: obj
                .get("headers")
                .map(headers_from_value)
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
            body: obj.get("body").filter(|b| !b.is_null()).cloned(),
        }
    }
}

/// Extract the regex for `path` from pact matching rules.
///
/// v2: `{"$.path": {"match": "regex", "regex": "..."}}`
/// v3: `{"path": {"matchers": [{"match": "regex", "regex": "..."}]}}`
fn path_regex_rule(rules: Option<&Value>) -> Option<String> {
    let rules = rules?.as_object()?;

    if let Some(rule) = rules.get("$.path") {
        if rule.get("match").and_then(Value::as_str) == Some("regex") || rule.get("regex").is_some()
        {
            return rule.get("regex").and_then(Value::as_str).map(str::to_string);
        }
    }

    rules
        .get("path")?
        .get("matchers")?
        .as_array()?
        .iter()
        .find(|m| m.get("match").and_then(Value::as_str) == Some("regex"))
        .and_then(|m| m.get("regex"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Normalize both pact query encodings to name -> values.
fn query_from_value(value: &Value) -> Option<HashMap<String, Vec<String>>> {
    match value {
        Value::String(s) => Some(parse_query_string(s)),
        Value::Object(map) => Some(
            map.iter()
                .map(|(name, v)| {
                    let values = match v {
                        Value::Array(items) => items.iter().map(scalar_to_string).collect(),
                        other => vec![scalar_to_string(other)],
                    };
                    (name.clone(), values)
                })
                .collect(),
        ),
        _ => None,
    }
}

fn headers_from_value(value: &Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .map(|(name, v)| {
            let value = match v {
                Value::Array(items) => items
                    .iter()
                    .map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                other => scalar_to_string(other),
            };
            (name.clone(), value)
        })
        .collect()
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Response template
// ============================================================================

/// The canned response replayed for a matched interaction.
#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    pub status: u16,
    /// Headers in document order, names as authored
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for ResponseTemplate {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl ResponseTemplate {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return ResponseTemplate::default();
        };

        // Status may be written as a number or a numeric string
        let status = obj
            .get("status")
            .and_then(|s| match s {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(200);

        ResponseTemplate {
            status,
            headers: obj
                .get("headers")
                .map(headers_from_value)
                .unwrap_or_default(),
            body: obj.get("body").filter(|b| !b.is_null()).cloned(),
        }
    }

    /// Serialize the body as written into the response.
    ///
    /// String bodies are written as their raw text, everything else as JSON.
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            None => Vec::new(),
            Some(Value::String(s)) => s.clone().into_bytes(),
            Some(other) => other.to_string().into_bytes(),
        }
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// True when the body is structured JSON (not text)
    pub fn has_json_body(&self) -> bool {
        matches!(self.body, Some(Value::Object(_)) | Some(Value::Array(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_v2_interaction() {
        let doc = json!({
            "consumer": {"name": "web"},
            "provider": {"name": "widgets"},
            "interactions": [{
                "description": "get widget",
                "providerState": "widget 1 exists",
                "request": {
                    "method": "GET",
                    "path": "/widgets/1",
                    "query": "verbose=true&tag=a&tag=b",
                    "headers": {"Accept": "application/json"}
                },
                "response": {"status": 200, "body": {"id": 1}}
            }],
            "metadata": {"pactSpecification": {"version": "2.0.0"}}
        });

        let pact = Pact::from_value(&doc);
        assert_eq!(pact.consumer.as_deref(), Some("web"));
        assert_eq!(pact.provider.as_deref(), Some("widgets"));
        assert_eq!(pact.specification_version.as_deref(), Some("2.0.0"));
        assert_eq!(pact.len(), 1);

        let interaction = &pact.interactions[0];
        assert_eq!(interaction.description.as_deref(), Some("get widget"));
        assert!(interaction.has_provider_state("widget 1 exists"));
        assert_eq!(interaction.request.method.as_deref(), Some("GET"));
        assert_eq!(
            interaction.request.headers,
            vec![("accept".to_string(), "application/json".to_string())]
        );
        let query = interaction.request.query.as_ref().unwrap();
        assert_eq!(query["verbose"], vec!["true"]);
        assert_eq!(query["tag"], vec!["a", "b"]);
        assert_eq!(interaction.response.status, 200);
        assert_eq!(interaction.response.body, Some(json!({"id": 1})));
    }

    #[test]
    fn test_parse_v3_provider_states_and_query_map() {
        let doc = json!({
            "interactions": [{
                "providerStates": [{"name": "a"}, {"name": "b", "params": {"id": 1}}],
                "request": {"method": "GET", "path": "/", "query": {"q": ["x", "y"], "n": "1"}}
            }]
        });
        let pact = Pact::from_value(&doc);
        let interaction = &pact.interactions[0];
        assert_eq!(interaction.provider_states, vec!["a", "b"]);
        let query = interaction.request.query.as_ref().unwrap();
        assert_eq!(query["q"], vec!["x", "y"]);
        assert_eq!(query["n"], vec!["1"]);
    }

    #[test]
    fn test_loose_documents_degrade_to_empty() {
        assert!(Pact::from_value(&json!([1, 2, 3])).is_empty());
        assert!(Pact::from_value(&json!({"interactions": "nope"})).is_empty());

        let pact = Pact::from_value(&json!({"interactions": [{}, 42]}));
        assert_eq!(pact.len(), 2);
        let interaction = &pact.interactions[0];
        assert!(interaction.description.is_none());
        assert!(interaction.provider_states.is_empty());
        assert!(interaction.request.method.is_none());
        assert!(interaction.request.path.is_none());
        assert_eq!(interaction.response.status, 200);
    }

    #[test]
    fn test_response_status_as_string_and_null_body() {
        let response = ResponseTemplate::from_value(&json!({"status": "404", "body": null}));
        assert_eq!(response.status, 404);
        assert!(response.body.is_none());
        assert!(response.body_bytes().is_empty());
    }

    #[test]
    fn test_response_body_bytes() {
        let text = ResponseTemplate::from_value(&json!({"body": "plain text"}));
        assert_eq!(text.body_bytes(), b"plain text");
        assert!(!text.has_json_body());

        let json_body = ResponseTemplate::from_value(&json!({"body": {"a": [1, 2]}}));
        assert_eq!(json_body.body_bytes(), br#"{"a":[1,2]}"#);
        assert!(json_body.has_json_body());
    }

    #[test]
    fn test_path_regex_rule_v2_and_v3() {
        let v2 = RequestMatcher::from_value(&json!({
            "path": "/widgets/1",
            "matchingRules": {"$.path": {"match": "regex", "regex": "/widgets/[0-9]+"}}
        }));
        assert!(v2.path.as_ref().unwrap().matches("/widgets/42"));

        let v3 = RequestMatcher::from_value(&json!({
            "path": "/widgets/1",
            "matchingRules": {"path": {"matchers": [{"match": "regex", "regex": "/widgets/[0-9]+"}]}}
        }));
        assert!(v3.path.as_ref().unwrap().matches("/widgets/7"));
        assert!(!v3.path.as_ref().unwrap().matches("/widgets/abc"));
    }

    #[test]
    fn test_header_list_values_are_joined() {
        let request = RequestMatcher::from_value(&json!({
            "headers": {"X-Tags": ["a", "b"]}
        }));
        assert_eq!(
            request.headers,
            vec![("x-tags".to_string(), "a, b".to_string())]
        );
    }
}
