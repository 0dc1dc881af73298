//! Provider-state and description filters.

use crate::contract::Interaction;
use serde::Serialize;

/// Active interaction filters.
///
/// An empty field places no constraint. Values are replaced as a whole
/// snapshot; see [`Stub::filter_on_provider_state`](crate::Stub::filter_on_provider_state).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub provider_state: String,
    pub description: String,
}

impl Filters {
    pub fn with_provider_state(&self, value: impl Into<String>) -> Self {
        Self {
            provider_state: value.into(),
            ..self.clone()
        }
    }

    pub fn with_description(&self, value: impl Into<String>) -> Self {
        Self {
            description: value.into(),
            ..self.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.provider_state.is_empty() && self.description.is_empty()
    }

    /// Whether an interaction is eligible under these filters.
    pub fn admits(&self, interaction: &Interaction) -> bool {
        let state_ok =
            self.provider_state.is_empty() || interaction.has_provider_state(&self.provider_state);
        let description_ok = self.description.is_empty()
            || interaction.description.as_deref() == Some(self.description.as_str());
        state_ok && description_ok
    }
}
