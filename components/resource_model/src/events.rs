// Typed change notifications for resource state

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use inspector_types::{RequestId, ResourceType};

use crate::resource::Resource;

/// Change notification emitted by a resource.
///
/// Events are dispatched synchronously, after the state mutation that caused
/// them, in a fixed order per operation; a listener always observes fully
/// updated state. Each variant carries the minimal payload a consumer needs
/// to diff against its previous view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload")]
pub enum ResourceEvent {
    UrlChanged { previous_url: String },
    MimeTypeChanged { previous_mime_type: String },
    TypeChanged { previous_type: ResourceType },
    RequestHeadersChanged,
    ResponseReceived,
    LoadingFinished,
    LoadingFailed,
    TimestampsChanged,
    SizeChanged { previous_size: Option<u64> },
    TransferSizeChanged,
    CacheStatusChanged,
    InitiatedResourcesChanged { request_id: RequestId },
}

/// Synchronous observer of resource change notifications
pub trait ResourceObserver: Send + Sync {
    /// Called after the state mutation that produced `event`
    fn on_event(&self, resource: &Resource, event: &ResourceEvent);
}

/// Recording observer that collects every event it sees.
///
/// Useful for consumers that diff lazily, and as the standard listener in
/// tests.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<ResourceEvent>>,
}

impl EventLog {
    /// Create an empty, shareable event log
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of all recorded events, in dispatch order
    pub fn events(&self) -> Vec<ResourceEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Number of recorded events matching `predicate`
    pub fn count_matching(&self, predicate: impl Fn(&ResourceEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|event| predicate(event)).count()
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ResourceObserver for EventLog {
    fn on_event(&self, _resource: &Resource, event: &ResourceEvent) {
        self.events.lock().push(event.clone());
    }
}
