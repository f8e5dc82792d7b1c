//! Integration tests for the resource model driven through a session
//!
//! Tests that JSON report payloads route through InspectorSession into the
//! resource state machine the way a network-report source would push them.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use inspector_types::{
    ContentError, MetricsPayload, RedirectPayload, RequestId, ResponsePayload,
};
use resource_model::{
    ContentFetcher, EventLog, InspectorSession, ResourceContent, ResourceDescriptor, ResourceEvent,
    SessionConfig,
};

struct StaticFetcher;

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch_content(&self) -> Result<ResourceContent, ContentError> {
        Ok(ResourceContent {
            body: "body-bytes".to_string(),
            base64_encoded: false,
        })
    }
}

fn observe(session: &InspectorSession, request_id: &str, url: &str) -> RequestId {
    let request_id = RequestId(request_id.to_string());
    session.observe_request(
        request_id.clone(),
        ResourceDescriptor {
            url: url.to_string(),
            mime_type: String::new(),
            method: Some("GET".to_string()),
            request_sent_time: Some(0.1),
            ..ResourceDescriptor::default()
        },
    );
    request_id
}

#[tokio::test]
async fn test_full_lifecycle_with_json_reports() {
    let session = InspectorSession::new(SessionConfig::default());
    let request_id = observe(&session, "req-1", "http://example.com/page");

    let resource = session.resource(&request_id).unwrap();
    let log = EventLog::new();
    resource.write().add_observer(log.clone());

    // Redirect to HTTPS.
    let redirect: RedirectPayload = serde_json::from_value(json!({
        "url": "https://example.com/page",
        "requestHeaders": {"Host": "example.com"},
        "elapsedTime": 0.2
    }))
    .unwrap();
    session.redirect_received(&request_id, &redirect).unwrap();

    // Response with timing.
    let response: ResponsePayload = serde_json::from_value(json!({
        "url": "https://example.com/page",
        "mimeType": "text/html",
        "type": "Document",
        "responseHeaders": {"Content-Type": "text/html", "Content-Encoding": "gzip"},
        "statusCode": 200,
        "statusText": "OK",
        "elapsedTime": 0.5,
        "timing": {"requestStart": 0.25, "responseStart": 0.45},
        "source": "Network"
    }))
    .unwrap();
    session.response_received(&request_id, &response).unwrap();

    // Streamed chunks, then the authoritative metrics report.
    session.data_received(&request_id, 4000, Some(0.6)).unwrap();
    session.data_received(&request_id, 96, Some(0.7)).unwrap();
    session.transfer_size_updated(&request_id, 1500).unwrap();

    let metrics: MetricsPayload = serde_json::from_value(json!({
        "protocol": "h2",
        "priority": "High",
        "remoteAddress": "93.184.216.34:443",
        "connectionIdentifier": "backend-conn-1",
        "requestHeaderBytesSent": 250,
        "requestBodyBytesSent": 0,
        "responseHeaderBytesReceived": 180,
        "responseBodyBytesReceived": 1500,
        "responseBodyDecodedSize": 4096
    }))
    .unwrap();
    session.metrics_received(&request_id, &metrics).unwrap();
    session.loading_finished(&request_id, Some(0.8)).unwrap();

    {
        let resource = resource.read();
        assert_eq!(resource.url(), "https://example.com/page");
        assert!(resource.finished());
        assert!(resource.compressed());
        assert_eq!(resource.protocol(), Some("h2"));
        assert_eq!(resource.connection_identifier(), Some(1));
        // Exact metrics supersede the 4096-byte estimate with the same value
        // and the 1500-byte transfer estimate with the exact one.
        assert_eq!(resource.size(), Some(4096));
        assert_eq!(resource.network_total_transfer_size(), Some(180 + 1500));
        assert_eq!(resource.estimated_total_transfer_size(), Some(180 + 1500));
        assert_eq!(resource.duration(), Some(0.8 - 0.25));
    }

    // One UrlChanged (redirect), none from the same-URL response.
    assert_eq!(
        log.count_matching(|event| matches!(event, ResourceEvent::UrlChanged { .. })),
        1
    );
    assert_eq!(
        log.count_matching(|event| matches!(event, ResourceEvent::LoadingFinished)),
        1
    );

    // Content is fetched directly once finished.
    let content = resource
        .write()
        .request_content(Arc::new(StaticFetcher))
        .await
        .unwrap();
    assert_eq!(content.body, "body-bytes");
}

#[tokio::test]
async fn test_pending_content_resolves_across_session() {
    let session = InspectorSession::new(SessionConfig::default());
    let request_id = observe(&session, "req-1", "https://example.com/slow");
    let resource = session.resource(&request_id).unwrap();

    let pending = resource.write().request_content(Arc::new(StaticFetcher));
    assert!(futures::FutureExt::now_or_never(pending.clone()).is_none());

    session.loading_finished(&request_id, Some(1.0)).unwrap();
    assert_eq!(pending.await.unwrap().body, "body-bytes");
}

#[tokio::test]
async fn test_canceled_load_rejects_content() {
    let session = InspectorSession::new(SessionConfig::default());
    let request_id = observe(&session, "req-1", "https://example.com/canceled");
    let resource = session.resource(&request_id).unwrap();

    let pending = resource.write().request_content(Arc::new(StaticFetcher));
    session.loading_failed(&request_id, true, Some(1.0)).unwrap();

    assert_eq!(pending.await, Err(ContentError::LoadingFailed));
    let resource = resource.read();
    assert!(resource.failed());
    assert!(resource.canceled());
}

#[test]
fn test_304_revalidation_scenario() {
    let session = InspectorSession::new(SessionConfig::default());
    let request_id = observe(&session, "req-1", "https://example.com/styles.css");
    let resource = session.resource(&request_id).unwrap();
    let log = EventLog::new();
    resource.write().add_observer(log.clone());

    let response: ResponsePayload = serde_json::from_value(json!({
        "url": "https://example.com/styles.css",
        "mimeType": "text/css",
        "responseHeaders": {},
        "statusCode": 304,
        "statusText": "Not Modified",
        "elapsedTime": 0.3
    }))
    .unwrap();
    session.response_received(&request_id, &response).unwrap();

    let resource = resource.read();
    assert!(resource.cached());
    assert_eq!(
        resource.estimated_total_transfer_size(),
        resource.estimated_response_headers_size()
    );
    assert_eq!(
        log.count_matching(|event| matches!(event, ResourceEvent::CacheStatusChanged)),
        1
    );
    assert_eq!(
        log.count_matching(|event| matches!(event, ResourceEvent::TransferSizeChanged)),
        0
    );
}

#[test]
fn test_unknown_request_reports_are_ignored_gracefully() {
    let session = InspectorSession::new(SessionConfig::default());
    let unknown = RequestId("ghost".to_string());

    assert!(session.data_received(&unknown, 10, None).is_err());
    assert!(session.loading_failed(&unknown, false, None).is_err());
    assert_eq!(session.resource_count(), 0);
}
