//! reqwest-backed xAI implementation of the `x_search` backend.
//!
//! `request` builds the Responses body, `xai` owns configuration and the single HTTP
//! attempt, `normalize` turns whatever comes back into a `SearchResult`.

pub mod normalize;
pub mod request;
pub mod xai;

pub use normalize::normalize;
pub use request::{build_request, ResponsesRequest, XSearchToolConfig};
pub use xai::{XaiClient, XaiConfig};
