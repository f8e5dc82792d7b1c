// Recoverable fault types for the network resource model
//
// Precondition violations (updates after a terminal state, streaming after
// exact metrics, negative byte counts) are programmer errors and fail fast
// instead of surfacing here.

use thiserror::Error;

use crate::network::RequestId;

/// Content retrieval faults, resolved through the deferred content result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The resource load failed before content could be retrieved.
    /// This message is user-facing and fixed.
    #[error("An error occurred trying to load the resource.")]
    LoadingFailed,

    /// The content-fetch capability reported a failure
    #[error("Content request failed: {0}")]
    Unavailable(String),
}

/// Report-routing faults raised by the session registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A report referenced a request the session is not tracking
    #[error("Unknown request: {0}")]
    UnknownRequest(RequestId),
}
