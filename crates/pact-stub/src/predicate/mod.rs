//! Request field predicates used by the interaction matcher.
//!
//! # Module Structure
//!
//! - `path_matcher` - exact, placeholder-segment and regex path matching
//! - `field_matcher` - header and query parameter subset checks
//! - `body_matcher` - partial structural JSON body matching

mod body_matcher;
mod field_matcher;
mod path_matcher;

pub use body_matcher::{body_matches, json_partial_match, BodyMatchOptions};
pub use field_matcher::{headers_match, parse_query_string, query_matches};
pub use path_matcher::{PathPattern, Segment};
