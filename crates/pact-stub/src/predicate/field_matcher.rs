//! Header and query parameter matching.
//!
//! Both are subset checks: every expected entry must be present on the
//! request, extra entries on the request are ignored.

use std::collections::HashMap;

/// Check that every expected header is present with an equal value.
///
/// `expected` names must already be lowercased; `actual` is keyed by
/// lowercased header name. Values are compared after normalizing the
/// whitespace around comma separators, so `a,b` and `a, b` are equal.
pub fn headers_match(expected: &[(String, String)], actual: &HashMap<String, String>) -> bool {
    expected.iter().all(|(name, expected_value)| {
        actual
            .get(name)
            .is_some_and(|v| normalize_header_value(v) == normalize_header_value(expected_value))
    })
}

fn normalize_header_value(value: &str) -> String {
    value
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
}

/// Check that every expected query parameter is present with equal values.
///
/// Multi-valued parameters are compared as multisets, so value order does
/// not matter but value counts do.
pub fn query_matches(
    expected: &HashMap<String, Vec<String>>,
    actual: &HashMap<String, Vec<String>>,
) -> bool {
    expected.iter().all(|(name, expected_values)| {
        actual.get(name).is_some_and(|actual_values| {
            let mut e: Vec<&str> = expected_values.iter().map(String::as_str).collect();
            let mut a: Vec<&str> = actual_values.iter().map(String::as_str).collect();
            e.sort_unstable();
            a.sort_unstable();
            e == a
        })
    })
}

/// Parse a query string into name -> values, URL-decoding keys and values.
///
/// Repeated keys accumulate values in order of appearance. A key without
/// `=` gets an empty value.
pub fn parse_query_string(query: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.trim_start_matches('?').split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode(key))
            .or_default()
            .push(decode(value));
    }
    params
}

fn decode(s: &str) -> String {
    // Form encoding uses '+' for spaces
    let s = s.replace('+', " ");
    urlencoding::decode(&s)
        .map(|d| d.into_owned())
        .unwrap_or(s)
}
