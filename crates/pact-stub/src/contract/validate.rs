//! Contract validation: a syntax check run before any listener is touched.

use super::types::Pact;
use crate::error::StubError;
use serde_json::Value;

/// Check that the contract text is well-formed JSON.
///
/// Only syntax is enforced; the shape of the document is handled leniently
/// by [`Pact::from_value`].
pub fn validate_contract(text: &str) -> Result<Value, StubError> {
    serde_json::from_str::<Value>(text).map_err(|e| StubError::InvalidContract(e.to_string()))
}

impl Pact {
    /// Parse contract text into a document, failing only on invalid JSON.
    pub fn parse(text: &str) -> Result<Self, StubError> {
        let value = validate_contract(text)?;
        Ok(Pact::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_of_any_shape_passes() {
        assert!(validate_contract("{}").is_ok());
        assert!(validate_contract("[]").is_ok());
        assert!(validate_contract("\"just a string\"").is_ok());
        assert!(validate_contract(r#"{"interactions": []}"#).is_ok());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        for text in ["", "{", "not json", r#"{"interactions": [}"#] {
            let err = validate_contract(text).unwrap_err();
            assert!(
                matches!(err, StubError::InvalidContract(_)),
                "expected InvalidContract for {text:?}"
            );
        }
    }

    #[test]
    fn test_parse_yields_ordered_interactions() {
        let pact = Pact::parse(
            r#"{"interactions": [{"description": "first"}, {"description": "second"}]}"#,
        )
        .unwrap();
        let descriptions: Vec<_> = pact
            .interactions
            .iter()
            .map(|i| i.description.as_deref().unwrap())
            .collect();
        assert_eq!(descriptions, vec!["first", "second"]);
    }
}
