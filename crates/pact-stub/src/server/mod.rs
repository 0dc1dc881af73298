//! HTTP plumbing: the listener, the normalized request it produces and the
//! response it writes back.

mod listener;
mod request;
mod response;

pub use listener::{Listener, RequestHandler};
pub use request::NormalizedRequest;
pub use response::{StubResponse, NO_MATCH_HEADER};
