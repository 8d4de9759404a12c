//! Endpoint resolver trait.

use crate::Result;

/// Maps a logical path such as `["api", "Auth", "refresh"]` to a request URL.
///
/// [`ApiUrl`](crate::ApiUrl) is the stock implementation.
pub trait EndpointResolver: Send + Sync {
    /// Resolve path segments into a fully-qualified URL.
    fn resolve(&self, segments: &[&str]) -> Result<String>;
}
