//! Pact contract documents.
//!
//! - `types`: the document model (interactions, request matchers, response templates)
//! - `validate`: syntax validation and parsing
//! - `source`: retrieval of contract text from a literal, a file or a pact broker

mod source;
mod types;
mod validate;

pub use source::{BrokerAuth, ContractSource, FetchOptions};
pub use types::{Interaction, Pact, RequestMatcher, ResponseTemplate};
pub use validate::validate_contract;
