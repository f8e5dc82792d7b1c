// Debug-target session: configuration, connection aliasing, resource registry

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use inspector_types::{
    MetricsPayload, RedirectPayload, RequestId, ResponsePayload, SessionError,
};

use crate::resource::{Resource, ResourceDescriptor, ResourceOptions};

/// Session-scoped alias table for backend connection tokens.
///
/// Maps each opaque token to an easier-to-read small integer: the first token
/// seen maps to 1, identifiers are assigned monotonically and never reused,
/// and the same token always resolves to the same identifier for the life of
/// the session.
#[derive(Debug)]
pub struct ConnectionIdentifierMap {
    identifiers: DashMap<String, u64>,
    next_identifier: AtomicU64,
}

impl Default for ConnectionIdentifierMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionIdentifierMap {
    /// Create an empty alias table
    pub fn new() -> Self {
        Self {
            identifiers: DashMap::new(),
            next_identifier: AtomicU64::new(1),
        }
    }

    /// Resolve a backend connection token to its session-stable alias
    pub fn resolve(&self, token: &str) -> u64 {
        *self
            .identifiers
            .entry(token.to_string())
            .or_insert_with(|| self.next_identifier.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of distinct tokens seen
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Whether no token has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Configuration for an inspector session
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    prefer_content_length_over_transfer_size: bool,
}

impl SessionConfig {
    /// Create a new builder for SessionConfig
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Whether resources prefer a Content-Length header over the reported
    /// transfer size when estimating encoded size.
    ///
    /// Workaround for backends whose reported transfer size is actually the
    /// decoded size. Off by default.
    pub fn prefer_content_length_over_transfer_size(&self) -> bool {
        self.prefer_content_length_over_transfer_size
    }
}

/// Builder for SessionConfig
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    prefer_content_length_over_transfer_size: Option<bool>,
}

impl SessionConfigBuilder {
    /// Prefer Content-Length over the reported transfer size
    pub fn prefer_content_length_over_transfer_size(mut self, enabled: bool) -> Self {
        self.prefer_content_length_over_transfer_size = Some(enabled);
        self
    }

    /// Build the SessionConfig, defaulting unset options
    pub fn build(self) -> SessionConfig {
        SessionConfig {
            prefer_content_length_over_transfer_size: self
                .prefer_content_length_over_transfer_size
                .unwrap_or(false),
        }
    }
}

/// One debug-target session.
///
/// Owns the resources observed for its target, the connection-identifier
/// alias table shared by those resources, and the session configuration.
/// Reports are routed to resources by request id; routing an unknown id is a
/// recoverable fault, never a panic.
pub struct InspectorSession {
    id: Uuid,
    config: SessionConfig,
    connections: Arc<ConnectionIdentifierMap>,
    resources: DashMap<RequestId, Arc<RwLock<Resource>>>,
}

impl InspectorSession {
    /// Create a session for one debug target
    pub fn new(config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "inspector session created");
        Self {
            id,
            config,
            connections: Arc::new(ConnectionIdentifierMap::new()),
            resources: DashMap::new(),
        }
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session's connection-identifier alias table
    pub fn connections(&self) -> &Arc<ConnectionIdentifierMap> {
        &self.connections
    }

    /// Track a newly observed request.
    ///
    /// If the descriptor names an initiating resource this session tracks,
    /// the new resource is registered in that initiator's initiated-resources
    /// list.
    pub fn observe_request(
        &self,
        request_id: RequestId,
        mut descriptor: ResourceDescriptor,
    ) -> Arc<RwLock<Resource>> {
        debug!(request_id = %request_id, url = %descriptor.url, "request observed");

        descriptor.request_id.get_or_insert_with(|| request_id.clone());
        let initiator = descriptor.initiator.clone();

        let options = ResourceOptions {
            prefer_content_length_over_transfer_size: self
                .config
                .prefer_content_length_over_transfer_size(),
            connections: Arc::clone(&self.connections),
        };
        let resource = Arc::new(RwLock::new(Resource::new(descriptor, options)));
        self.resources.insert(request_id.clone(), Arc::clone(&resource));

        if let Some(initiator_id) = initiator.and_then(|location| location.resource) {
            if let Some(initiator_resource) = self.resources.get(&initiator_id) {
                initiator_resource.write().add_initiated_resource(request_id);
            }
        }

        resource
    }

    /// Look up a tracked resource
    pub fn resource(&self, request_id: &RequestId) -> Option<Arc<RwLock<Resource>>> {
        self.resources.get(request_id).map(|entry| entry.value().clone())
    }

    /// Whether a request is being tracked
    pub fn has_resource(&self, request_id: &RequestId) -> bool {
        self.resources.contains_key(request_id)
    }

    /// Number of tracked resources
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Drop all tracked resources
    pub fn clear(&self) {
        debug!(session = %self.id, "clearing tracked resources");
        self.resources.clear();
    }

    // =========================================================================
    // Report routing
    // =========================================================================

    /// Route a redirect report
    pub fn redirect_received(
        &self,
        request_id: &RequestId,
        payload: &RedirectPayload,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| resource.update_for_redirect(payload))
    }

    /// Route a response report
    pub fn response_received(
        &self,
        request_id: &RequestId,
        payload: &ResponsePayload,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| resource.update_for_response(payload))
    }

    /// Route a one-shot load metrics report
    pub fn metrics_received(
        &self,
        request_id: &RequestId,
        metrics: &MetricsPayload,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| resource.update_with_metrics(metrics))
    }

    /// Route a streamed decoded-data chunk report
    pub fn data_received(
        &self,
        request_id: &RequestId,
        data_length: u64,
        elapsed_time: Option<f64>,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| {
            resource.increase_size(data_length, elapsed_time)
        })
    }

    /// Route a streamed encoded-data length report
    pub fn transfer_size_updated(
        &self,
        request_id: &RequestId,
        encoded_data_length: u64,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| {
            resource.increase_transfer_size(encoded_data_length)
        })
    }

    /// Route a terminal finish report
    pub fn loading_finished(
        &self,
        request_id: &RequestId,
        elapsed_time: Option<f64>,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| resource.mark_finished(elapsed_time))
    }

    /// Route a terminal failure report
    pub fn loading_failed(
        &self,
        request_id: &RequestId,
        canceled: bool,
        elapsed_time: Option<f64>,
    ) -> Result<(), SessionError> {
        self.with_resource(request_id, |resource| {
            resource.mark_failed(canceled, elapsed_time)
        })
    }

    fn with_resource(
        &self,
        request_id: &RequestId,
        update: impl FnOnce(&mut Resource),
    ) -> Result<(), SessionError> {
        match self.resources.get(request_id) {
            Some(entry) => {
                update(&mut entry.write());
                Ok(())
            }
            None => {
                warn!(request_id = %request_id, "report for unknown request");
                Err(SessionError::UnknownRequest(request_id.clone()))
            }
        }
    }
}

impl Default for InspectorSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use inspector_types::{Headers, InitiatorLocation};

    use super::*;
    use crate::events::{EventLog, ResourceEvent};

    fn descriptor(url: &str) -> ResourceDescriptor {
        ResourceDescriptor {
            url: url.to_string(),
            mime_type: "text/html".to_string(),
            ..ResourceDescriptor::default()
        }
    }

    // =========================================================================
    // Connection identifier aliasing
    // =========================================================================

    #[test]
    fn test_first_identifier_is_one() {
        let connections = ConnectionIdentifierMap::new();
        assert_eq!(connections.resolve("opaque-token-a"), 1);
    }

    #[test]
    fn test_identifiers_are_stable_and_distinct() {
        let connections = ConnectionIdentifierMap::new();
        let a = connections.resolve("token-a");
        let b = connections.resolve("token-b");
        let c = connections.resolve("token-c");

        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(connections.resolve("token-b"), 2);
        assert_eq!(connections.resolve("token-a"), 1);
        assert_eq!(connections.len(), 3);
    }

    #[test]
    fn test_sessions_alias_independently() {
        let first = InspectorSession::default();
        let second = InspectorSession::default();

        assert_eq!(first.connections().resolve("shared-token"), 1);
        first.connections().resolve("other");
        // A fresh session starts numbering from 1 again.
        assert_eq!(second.connections().resolve("shared-token"), 1);
    }

    // =========================================================================
    // Config
    // =========================================================================

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert!(!config.prefer_content_length_over_transfer_size());
    }

    #[test]
    fn test_config_builder() {
        let config = SessionConfig::builder()
            .prefer_content_length_over_transfer_size(true)
            .build();
        assert!(config.prefer_content_length_over_transfer_size());

        let defaulted = SessionConfig::builder().build();
        assert!(!defaulted.prefer_content_length_over_transfer_size());
    }

    // =========================================================================
    // Registry and routing
    // =========================================================================

    #[test]
    fn test_observe_and_route() {
        let session = InspectorSession::default();
        let request_id = RequestId("req-1".to_string());
        let resource = session.observe_request(request_id.clone(), descriptor("https://a.example/"));

        assert!(session.has_resource(&request_id));
        assert_eq!(session.resource_count(), 1);
        assert_eq!(
            resource.read().request_id(),
            Some(&request_id)
        );

        session
            .data_received(&request_id, 256, Some(1.0))
            .unwrap();
        session.loading_finished(&request_id, Some(2.0)).unwrap();

        let resource = resource.read();
        assert_eq!(resource.size(), Some(256));
        assert!(resource.finished());
    }

    #[test]
    fn test_unknown_request_is_recoverable() {
        let session = InspectorSession::default();
        let unknown = RequestId("missing".to_string());

        let result = session.loading_finished(&unknown, Some(1.0));
        assert_eq!(result, Err(SessionError::UnknownRequest(unknown)));
    }

    #[test]
    fn test_metrics_use_session_alias_table() {
        let session = InspectorSession::default();
        let first = RequestId("req-1".to_string());
        let second = RequestId("req-2".to_string());
        session.observe_request(first.clone(), descriptor("https://a.example/"));
        session.observe_request(second.clone(), descriptor("https://b.example/"));

        let metrics = MetricsPayload {
            connection_identifier: Some("conn-xyz".to_string()),
            ..MetricsPayload::default()
        };
        session.metrics_received(&first, &metrics).unwrap();
        session.metrics_received(&second, &metrics).unwrap();

        // Both resources observed the same backend connection.
        let first_alias = session.resource(&first).unwrap().read().connection_identifier();
        let second_alias = session.resource(&second).unwrap().read().connection_identifier();
        assert_eq!(first_alias, Some(1));
        assert_eq!(second_alias, Some(1));
    }

    #[test]
    fn test_initiator_registration() {
        let session = InspectorSession::default();
        let parent_id = RequestId("req-parent".to_string());
        let parent = session.observe_request(parent_id.clone(), descriptor("https://a.example/"));

        let log = EventLog::new();
        parent.write().add_observer(log.clone());

        let child_id = RequestId("req-child".to_string());
        session.observe_request(
            child_id.clone(),
            ResourceDescriptor {
                initiator: Some(InitiatorLocation {
                    resource: Some(parent_id),
                    line: 12,
                    column: 4,
                }),
                ..descriptor("https://a.example/app.js")
            },
        );

        assert_eq!(parent.read().initiated_resources(), &[child_id.clone()]);
        assert_eq!(
            log.events(),
            vec![ResourceEvent::InitiatedResourcesChanged {
                request_id: child_id
            }]
        );
    }

    #[test]
    fn test_session_config_reaches_resources() {
        let session = InspectorSession::new(
            SessionConfig::builder()
                .prefer_content_length_over_transfer_size(true)
                .build(),
        );
        let request_id = RequestId("req-1".to_string());
        let resource = session.observe_request(request_id.clone(), descriptor("https://a.example/"));

        session
            .response_received(
                &request_id,
                &ResponsePayload {
                    url: "https://a.example/".to_string(),
                    mime_type: "text/html".to_string(),
                    resource_type: None,
                    response_headers: [("Content-Length", "128")].into_iter().collect(),
                    status_code: 200,
                    status_text: "OK".to_string(),
                    elapsed_time: Some(1.0),
                    timing: None,
                    source: None,
                },
            )
            .unwrap();
        session.transfer_size_updated(&request_id, 999).unwrap();

        assert_eq!(
            resource.read().estimated_network_encoded_size(),
            Some(128)
        );
    }

    #[test]
    fn test_clear() {
        let session = InspectorSession::default();
        let request_id = RequestId("req-1".to_string());
        session.observe_request(request_id.clone(), descriptor("https://a.example/"));
        assert!(session.has_resource(&request_id));

        session.clear();
        assert!(!session.has_resource(&request_id));
        assert_eq!(session.resource_count(), 0);
    }

    #[test]
    fn test_redirect_then_response_routing() {
        let session = InspectorSession::default();
        let request_id = RequestId("req-1".to_string());
        let resource =
            session.observe_request(request_id.clone(), descriptor("http://a.example/"));

        session
            .redirect_received(
                &request_id,
                &RedirectPayload {
                    url: "https://a.example/".to_string(),
                    request_headers: Headers::new(),
                    elapsed_time: Some(0.2),
                },
            )
            .unwrap();

        assert_eq!(resource.read().url(), "https://a.example/");
        assert_eq!(resource.read().last_redirect_time(), Some(0.2));
    }
}
