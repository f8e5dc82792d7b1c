// Inspector-facing value types, report payload shapes, and error definitions
//
// This module is part of the CortenBrowser inspector network model.

pub mod errors;
pub mod headers;
pub mod network;

// Re-export commonly used types
pub use errors::{ContentError, SessionError};
pub use headers::Headers;
pub use network::{
    FrameId, InitiatorLocation, LoaderId, MetricsPayload, MimeComponents, NetworkPriority,
    RedirectPayload, RequestId, ResourceType, ResponsePayload, ResponseSource, ScriptRef,
    TextRange, TimingPayload,
};
