//! Interaction matching.
//!
//! Selects at most one interaction of a loaded pact for an incoming request.
//! Interactions are checked in document order and the first one satisfying
//! the filters and every request field wins, so authors can order
//! interactions from most specific to least specific fallback.

use crate::contract::{Interaction, Pact};
use crate::filter::Filters;
use crate::predicate::{body_matches, headers_match, query_matches, BodyMatchOptions};
use crate::server::NormalizedRequest;
use serde::Serialize;

/// Outcome of matching one request against a pact.
#[derive(Debug)]
pub enum MatchResult<'a> {
    Matched {
        /// Position of the interaction in the document
        index: usize,
        interaction: &'a Interaction,
    },
    NoMatch(NoMatch),
}

impl MatchResult<'_> {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

/// Diagnostic details for a request no interaction satisfied.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoMatch {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub provider_state_filter: String,
    pub description_filter: String,
    pub body_matching: bool,
    /// Interactions in the pact
    pub interactions: usize,
    /// Interactions left after applying the filters
    pub eligible: usize,
}

impl NoMatch {
    pub fn message(&self) -> String {
        format!(
            "No interaction in the pact matched {} {}",
            self.method, self.path
        )
    }

    /// JSON diagnostic body written back to the caller.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message(),
            "request": {
                "method": self.method,
                "path": self.path,
                "query": self.query,
            },
            "filters": {
                "providerState": self.provider_state_filter,
                "description": self.description_filter,
            },
            "bodyMatching": self.body_matching,
            "interactions": self.interactions,
            "eligibleInteractions": self.eligible,
        })
    }
}

/// Match a request against the interactions of a pact.
pub fn match_interaction<'a>(
    request: &NormalizedRequest,
    pact: &'a Pact,
    filters: &Filters,
    match_body: bool,
    options: BodyMatchOptions,
) -> MatchResult<'a> {
    let mut eligible = 0;

    for (index, interaction) in pact.interactions.iter().enumerate() {
        if !filters.admits(interaction) {
            continue;
        }
        eligible += 1;

        if request_matches(interaction, request, match_body, options) {
            return MatchResult::Matched { index, interaction };
        }
    }

    MatchResult::NoMatch(NoMatch {
        method: request.method.clone(),
        path: request.path.clone(),
        query: request.raw_query.clone(),
        provider_state_filter: filters.provider_state.clone(),
        description_filter: filters.description.clone(),
        body_matching: match_body,
        interactions: pact.len(),
        eligible,
    })
}

/// Check the request fields of one interaction in order: method, path,
/// headers, query, then body when enabled.
fn request_matches(
    interaction: &Interaction,
    request: &NormalizedRequest,
    match_body: bool,
    options: BodyMatchOptions,
) -> bool {
    let matcher = &interaction.request;

    if let Some(method) = &matcher.method {
        if !method.eq_ignore_ascii_case(&request.method) {
            return false;
        }
    }

    if let Some(path) = &matcher.path {
        if !path.matches(&request.path) {
            return false;
        }
    }

    if !headers_match(&matcher.headers, &request.headers) {
        return false;
    }

    if let Some(query) = &matcher.query {
        if !query_matches(query, &request.query) {
            return false;
        }
    }

    if match_body {
        if let Some(body) = &matcher.body {
            if !body_matches(body, &request.body, options) {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pact(doc: serde_json::Value) -> Pact {
        Pact::from_value(&doc)
    }

    fn widget_pact() -> Pact {
        pact(json!({
            "interactions": [
                {
                    "description": "get widget",
                    "providerState": "widget 1 exists",
                    "request": {"method": "GET", "path": "/widgets/1"},
                    "response": {"status": 200, "body": {"id": 1}}
                },
                {
                    "description": "get missing widget",
                    "providerState": "no widgets",
                    "request": {"method": "GET", "path": "/widgets/1"},
                    "response": {"status": 404}
                },
                {
                    "description": "create widget",
                    "request": {
                        "method": "POST",
                        "path": "/widgets",
                        "headers": {"Content-Type": "application/json"},
                        "body": {"name": "bolt"}
                    },
                    "response": {"status": 201, "body": {"id": 2, "name": "bolt"}}
                }
            ]
        }))
    }

    fn matched_index(result: &MatchResult<'_>) -> Option<usize> {
        match result {
            MatchResult::Matched { index, .. } => Some(*index),
            MatchResult::NoMatch(_) => None,
        }
    }

    fn run(pact: &Pact, request: &NormalizedRequest, filters: &Filters) -> Option<usize> {
        matched_index(&match_interaction(
            request,
            pact,
            filters,
            true,
            BodyMatchOptions::default(),
        ))
    }

    #[test]
    fn test_widget_scenario() {
        let pact = pact(json!({"interactions": [{
            "description": "get widget",
            "request": {"method": "GET", "path": "/widgets/1"},
            "response": {"status": 200, "body": {"id": 1}}
        }]}));
        let filters = Filters::default();

        let result = match_interaction(
            &NormalizedRequest::new("GET", "/widgets/1"),
            &pact,
            &filters,
            true,
            BodyMatchOptions::default(),
        );
        match result {
            MatchResult::Matched { interaction, .. } => {
                assert_eq!(interaction.response.status, 200);
                assert_eq!(interaction.response.body, Some(json!({"id": 1})));
            }
            MatchResult::NoMatch(_) => panic!("expected a match"),
        }

        assert!(run(&pact, &NormalizedRequest::new("GET", "/widgets/2"), &filters).is_none());
    }

    #[test]
    fn test_first_match_in_document_order_wins() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("GET", "/widgets/1");
        assert_eq!(run(&pact, &request, &Filters::default()), Some(0));
    }

    #[test]
    fn test_provider_state_filter_selects_interaction() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("GET", "/widgets/1");

        let filters = Filters::default().with_provider_state("no widgets");
        assert_eq!(run(&pact, &request, &filters), Some(1));

        let unknown = Filters::default().with_provider_state("nothing like this");
        assert_eq!(run(&pact, &request, &unknown), None);
    }

    #[test]
    fn test_description_filter() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("GET", "/widgets/1");
        let filters = Filters::default().with_description("get missing widget");
        assert_eq!(run(&pact, &request, &filters), Some(1));
    }

    #[test]
    fn test_cleared_filters_restore_original_match() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("GET", "/widgets/1");
        let before = run(&pact, &request, &Filters::default());

        let filtered = Filters::default()
            .with_provider_state("no widgets")
            .with_description("get missing widget");
        assert_ne!(run(&pact, &request, &filtered), before);
        assert_eq!(run(&pact, &request, &Filters::default()), before);
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("get", "/widgets/1");
        assert_eq!(run(&pact, &request, &Filters::default()), Some(0));

        let wrong = NormalizedRequest::new("DELETE", "/widgets/1");
        assert_eq!(run(&pact, &wrong, &Filters::default()), None);
    }

    #[test]
    fn test_headers_and_body() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("POST", "/widgets")
            .with_header("content-type", "application/json")
            .with_header("X-Trace", "abc")
            .with_body(r#"{"name": "bolt", "size": 3}"#);
        assert_eq!(run(&pact, &request, &Filters::default()), Some(2));

        let no_header = NormalizedRequest::new("POST", "/widgets").with_body(r#"{"name": "bolt"}"#);
        assert_eq!(run(&pact, &no_header, &Filters::default()), None);

        let wrong_body = NormalizedRequest::new("POST", "/widgets")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"name": "nut"}"#);
        assert_eq!(run(&pact, &wrong_body, &Filters::default()), None);
    }

    #[test]
    fn test_body_ignored_when_body_matching_disabled() {
        let pact = widget_pact();
        let request = NormalizedRequest::new("POST", "/widgets")
            .with_header("Content-Type", "application/json")
            .with_body("anything at all");
        let result = match_interaction(
            &request,
            &pact,
            &Filters::default(),
            false,
            BodyMatchOptions::default(),
        );
        assert_eq!(matched_index(&result), Some(2));
    }

    #[test]
    fn test_query_matching() {
        let pact = pact(json!({"interactions": [
            {"request": {"method": "GET", "path": "/search", "query": "q=bolt&tag=a&tag=b"}},
            {"request": {"method": "GET", "path": "/search", "query": {"q": ["nut"]}}}
        ]}));
        let filters = Filters::default();

        let reordered = NormalizedRequest::new("GET", "/search?tag=b&q=bolt&tag=a&page=2");
        assert_eq!(run(&pact, &reordered, &filters), Some(0));

        let v3 = NormalizedRequest::new("GET", "/search?q=nut");
        assert_eq!(run(&pact, &v3, &filters), Some(1));

        let missing = NormalizedRequest::new("GET", "/search?tag=a&tag=b");
        assert_eq!(run(&pact, &missing, &filters), None);
    }

    #[test]
    fn test_placeholder_path_fallback_ordering() {
        let pact = pact(json!({"interactions": [
            {"request": {"method": "GET", "path": "/widgets/special"}, "response": {"status": 418}},
            {"request": {"method": "GET", "path": "/widgets/{id}"}, "response": {"status": 200}}
        ]}));
        let filters = Filters::default();
        assert_eq!(
            run(&pact, &NormalizedRequest::new("GET", "/widgets/special"), &filters),
            Some(0)
        );
        assert_eq!(
            run(&pact, &NormalizedRequest::new("GET", "/widgets/9"), &filters),
            Some(1)
        );
    }

    #[test]
    fn test_encoded_request_path_matches_recorded_path() {
        let pact = pact(json!({"interactions": [
            {"request": {"method": "GET", "path": "/widgets/a b"}, "response": {"status": 200}}
        ]}));
        assert_eq!(
            run(&pact, &NormalizedRequest::new("GET", "/widgets/a%20b"), &Filters::default()),
            Some(0)
        );
    }

    #[test]
    fn test_absent_request_fields_match_anything() {
        let pact = pact(json!({"interactions": [{"response": {"status": 204}}]}));
        let request = NormalizedRequest::new("PATCH", "/anything?x=1").with_body("{}");
        assert_eq!(run(&pact, &request, &Filters::default()), Some(0));
    }

    #[test]
    fn test_no_match_diagnostics() {
        let pact = widget_pact();
        let filters = Filters::default().with_provider_state("widget 1 exists");
        let result = match_interaction(
            &NormalizedRequest::new("GET", "/widgets/2?full=true"),
            &pact,
            &filters,
            true,
            BodyMatchOptions::default(),
        );
        let MatchResult::NoMatch(no_match) = result else {
            panic!("expected no match");
        };
        assert_eq!(no_match.interactions, 3);
        assert_eq!(no_match.eligible, 1);
        assert_eq!(no_match.query.as_deref(), Some("full=true"));

        let body = no_match.to_json();
        assert_eq!(body["request"]["method"], "GET");
        assert_eq!(body["request"]["path"], "/widgets/2");
        assert_eq!(body["filters"]["providerState"], "widget 1 exists");
        assert!(body["error"].as_str().unwrap().contains("/widgets/2"));
    }

    #[test]
    fn test_empty_pact_never_matches() {
        let pact = Pact::default();
        let result = match_interaction(
            &NormalizedRequest::new("GET", "/"),
            &pact,
            &Filters::default(),
            true,
            BodyMatchOptions::default(),
        );
        assert!(!result.is_match());
    }
}
