//! Helpers for normalising the URLs and public paths handed to the service worker.
//!
//! Most values reach these helpers through string concatenation of a base and a sub-path, so
//! duplicate separators are expected and repaired here rather than at every call site.

mod detect;
mod normalize;

pub use detect::is_url;
pub use normalize::{fix_url, join_url};
