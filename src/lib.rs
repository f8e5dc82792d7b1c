//! Network resource model for CortenBrowser developer tools
//!
//! This crate re-exports the inspector's network-resource lifecycle model
//! with a clean public interface. A `Resource` tracks one observed network
//! transfer (request, redirects, response, completion) and reconciles
//! streamed size estimates against the backend's one-shot load metrics,
//! emitting typed change notifications along the way.
//!
//! # Example
//!
//! ```
//! use corten_inspector::{InspectorSession, RequestId, ResourceDescriptor, SessionConfig};
//!
//! let session = InspectorSession::new(SessionConfig::default());
//! let resource = session.observe_request(
//!     RequestId("req-1".to_string()),
//!     ResourceDescriptor {
//!         url: "https://example.com/".to_string(),
//!         mime_type: "text/html".to_string(),
//!         ..ResourceDescriptor::default()
//!     },
//! );
//!
//! assert!(!resource.read().has_response());
//! ```

pub use inspector_types::{
    ContentError, FrameId, Headers, InitiatorLocation, LoaderId, MetricsPayload, MimeComponents,
    NetworkPriority, RedirectPayload, RequestId, ResourceType, ResponsePayload, ResponseSource,
    ScriptRef, SessionError, TextRange, TimingPayload,
};
pub use resource_model::{
    ConnectionIdentifierMap, ContentFetcher, ContentFuture, EventLog, InspectorSession, Resource,
    ResourceContent, ResourceDescriptor, ResourceEvent, ResourceObserver, ResourceOptions,
    ResourceTimingData, SessionConfig,
};
