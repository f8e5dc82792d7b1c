//! Network resource lifecycle and metrics reconciliation
//!
//! This module implements the inspector's model of a single observed network
//! transfer. A [`Resource`] is created when a request is observed, mutated in
//! place through redirects, the response, streamed data chunks, and an
//! optional one-shot authoritative metrics report, and becomes terminal via
//! exactly one of finish or fail.
//!
//! # Features
//! - **Lifecycle state machine**: Pending → (Redirected)* → ResponseReceived → Finished | Failed
//! - **Size reconciliation**: streamed estimates, superseded by exact load metrics
//! - **Typed change notifications**: synchronous, ordered, after the state mutation
//! - **Deferred content retrieval**: one shared fetch resolved by the terminal transition

pub mod content;
pub mod events;
pub mod resource;
pub mod session;
pub mod timing;

// Re-export main types
pub use content::{ContentFetcher, ContentFuture, ResourceContent};
pub use events::{EventLog, ResourceEvent, ResourceObserver};
pub use resource::{Resource, ResourceDescriptor, ResourceOptions};
pub use session::{ConnectionIdentifierMap, InspectorSession, SessionConfig, SessionConfigBuilder};
pub use timing::ResourceTimingData;
