// Model of one observed network transfer and its lifecycle
//
// A Resource is created when a request is observed, mutated in place by the
// report stream (redirects, the response, streamed data chunks, one optional
// metrics report), and becomes terminal via exactly one of finish or fail.
// Size accounting runs on two tracks: a running estimate summed from
// streamed chunks, and exact values from the one-shot network load metrics.
// Receiving metrics freezes the estimate track.

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::watch;
use tracing::{debug, error, warn};
use url::Url;

use inspector_types::{
    FrameId, Headers, InitiatorLocation, LoaderId, MetricsPayload, MimeComponents,
    NetworkPriority, RedirectPayload, RequestId, ResourceType, ResponsePayload, ResponseSource,
    ScriptRef,
};

use crate::content::{
    content_after_completion, fetch_content, ready_content, Completion, ContentFetcher,
    ContentFuture,
};
use crate::events::{ResourceEvent, ResourceObserver};
use crate::session::ConnectionIdentifierMap;
use crate::timing::ResourceTimingData;

const HEADER_BASE_SIZE: u64 = 12; // Length of "HTTP/1.1 ", " ", and "\r\n".
const HEADER_PAD: u64 = 4; // Length of ": " and "\r\n".

/// Construction-time facts about an observed request
#[derive(Debug, Clone, Default)]
pub struct ResourceDescriptor {
    /// Request URL (required)
    pub url: String,
    /// Reported MIME type, possibly empty
    pub mime_type: String,
    /// Raw enumerated resource type; derived from the MIME type when absent
    /// or unrecognized
    pub resource_type: Option<String>,
    pub loader_id: Option<LoaderId>,
    pub request_id: Option<RequestId>,
    pub method: Option<String>,
    pub request_headers: Headers,
    pub request_body: Option<String>,
    /// Elapsed time the request was sent, seconds
    pub request_sent_time: Option<f64>,
    /// Elapsed time of the original will-be-sent report, before any redirects
    pub original_request_sent_time: Option<f64>,
    pub initiator: Option<InitiatorLocation>,
    pub parent_frame: Option<FrameId>,
}

/// Session-scoped collaborators a resource is created with
#[derive(Debug, Clone)]
pub struct ResourceOptions {
    /// Prefer a Content-Length header over the reported transfer size when
    /// estimating encoded size (workaround for backends that report decoded
    /// transfer sizes)
    pub prefer_content_length_over_transfer_size: bool,
    /// Connection-token alias table shared across the session
    pub connections: Arc<ConnectionIdentifierMap>,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            prefer_content_length_over_transfer_size: false,
            connections: Arc::new(ConnectionIdentifierMap::new()),
        }
    }
}

/// Model of one observed network transfer.
///
/// All mutation entry points are synchronous; change notifications fire in a
/// fixed order after the state they describe is committed. Once finished or
/// failed, lifecycle-affecting operations are rejected, but read access
/// stays valid for the inspector's history.
pub struct Resource {
    url: String,
    url_components: Mutex<Option<Url>>,
    mime_type: String,
    mime_components: Mutex<Option<MimeComponents>>,
    resource_type: ResourceType,
    loader_id: Option<LoaderId>,
    request_id: Option<RequestId>,
    method: Option<String>,
    request_body: Option<String>,
    request_headers: Headers,
    response_headers: Headers,
    parent_frame: Option<FrameId>,
    initiator: Option<InitiatorLocation>,
    initiated_resources: Vec<RequestId>,
    scripts: Vec<ScriptRef>,

    original_request_sent_time: Option<f64>,
    request_sent_time: Option<f64>,
    last_redirect_time: Option<f64>,
    response_received_time: Option<f64>,
    last_data_received_time: Option<f64>,
    finished_or_failed_time: Option<f64>,

    status_code: Option<u16>,
    status_text: Option<String>,
    finished: bool,
    failed: bool,
    canceled: bool,
    cached: bool,
    received_network_load_metrics: bool,
    response_source: ResponseSource,
    timing: ResourceTimingData,
    protocol: Option<String>,
    priority: NetworkPriority,
    remote_address: Option<String>,
    connection_identifier: Option<u64>,

    // Exact sizes if loaded over the network or cache.
    request_headers_transfer_size: Option<u64>,
    request_body_transfer_size: Option<u64>,
    response_headers_transfer_size: Option<u64>,
    response_body_transfer_size: Option<u64>,
    response_body_size: Option<u64>,
    cached_response_body_size: Option<u64>,

    // Estimated sizes (if the backend does not provide metrics).
    estimated_size: Option<u64>,
    estimated_transfer_size: Option<u64>,
    estimated_response_headers_size: Option<u64>,

    prefer_content_length: bool,
    connections: Arc<ConnectionIdentifierMap>,

    completion: watch::Sender<Completion>,
    pending_content: Option<ContentFuture>,
    observers: Vec<Arc<dyn ResourceObserver>>,
}

impl Resource {
    /// Create a resource for an observed request
    pub fn new(descriptor: ResourceDescriptor, options: ResourceOptions) -> Self {
        assert!(!descriptor.url.is_empty(), "a resource requires a url");

        let resource_type = resolve_type(
            descriptor.resource_type.as_deref(),
            &descriptor.mime_type,
        );
        let (completion, _) = watch::channel(Completion::Pending);

        Self {
            url: descriptor.url,
            url_components: Mutex::new(None),
            mime_type: descriptor.mime_type,
            mime_components: Mutex::new(None),
            resource_type,
            loader_id: descriptor.loader_id,
            request_id: descriptor.request_id,
            method: descriptor.method,
            request_body: descriptor.request_body,
            request_headers: descriptor.request_headers,
            response_headers: Headers::new(),
            parent_frame: descriptor.parent_frame,
            initiator: descriptor.initiator,
            initiated_resources: Vec::new(),
            scripts: Vec::new(),
            original_request_sent_time: descriptor.original_request_sent_time,
            request_sent_time: descriptor.request_sent_time,
            last_redirect_time: None,
            response_received_time: None,
            last_data_received_time: None,
            finished_or_failed_time: None,
            status_code: None,
            status_text: None,
            finished: false,
            failed: false,
            canceled: false,
            cached: false,
            received_network_load_metrics: false,
            response_source: ResponseSource::Unknown,
            timing: ResourceTimingData::empty(),
            protocol: None,
            priority: NetworkPriority::Unknown,
            remote_address: None,
            connection_identifier: None,
            request_headers_transfer_size: None,
            request_body_transfer_size: None,
            response_headers_transfer_size: None,
            response_body_transfer_size: None,
            response_body_size: None,
            cached_response_body_size: None,
            estimated_size: None,
            estimated_transfer_size: None,
            estimated_response_headers_size: None,
            prefer_content_length: options.prefer_content_length_over_transfer_size,
            connections: options.connections,
            completion,
            pending_content: None,
            observers: Vec::new(),
        }
    }

    /// Register a synchronous change observer
    pub fn add_observer(&mut self, observer: Arc<dyn ResourceObserver>) {
        self.observers.push(observer);
    }

    fn dispatch(&self, event: ResourceEvent) {
        let observers = self.observers.clone();
        for observer in &observers {
            observer.on_event(self, &event);
        }
    }

    // =========================================================================
    // Identity and request facet
    // =========================================================================

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parsed components of the current URL, cached until the URL changes
    pub fn url_components(&self) -> Option<Url> {
        let mut cached = self.url_components.lock();
        if cached.is_none() {
            *cached = Url::parse(&self.url).ok();
        }
        cached.clone()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Parsed MIME components, cached until the MIME type changes
    pub fn mime_type_components(&self) -> MimeComponents {
        let mut cached = self.mime_components.lock();
        cached
            .get_or_insert_with(|| MimeComponents::parse(&self.mime_type))
            .clone()
    }

    /// A MIME type matching the resolved resource type.
    ///
    /// Resources are often transferred with a MIME type that doesn't match
    /// the purpose the resource was loaded for. When the two disagree, this
    /// substitutes the default MIME type for the resolved type where one
    /// exists, and otherwise reports the actual MIME type.
    pub fn synthetic_mime_type(&self) -> &str {
        if self.resource_type == ResourceType::from_mime_type(&self.mime_type) {
            return &self.mime_type;
        }
        match self.resource_type {
            ResourceType::Stylesheet => "text/css",
            ResourceType::Script => "text/javascript",
            _ => &self.mime_type,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn loader_id(&self) -> Option<&LoaderId> {
        self.loader_id.as_ref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn request_body(&self) -> Option<&str> {
        self.request_body.as_deref()
    }

    pub fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    /// Case-insensitive Content-Type of the request body, if any
    pub fn request_data_content_type(&self) -> Option<&str> {
        self.request_headers.get("Content-Type")
    }

    pub fn parent_frame(&self) -> Option<&FrameId> {
        self.parent_frame.as_ref()
    }

    /// Set or clear the parent-frame back-reference (owned by the frame tree)
    pub fn set_parent_frame(&mut self, frame: Option<FrameId>) {
        self.parent_frame = frame;
    }

    pub fn initiator(&self) -> Option<&InitiatorLocation> {
        self.initiator.as_ref()
    }

    pub fn initiated_resources(&self) -> &[RequestId] {
        &self.initiated_resources
    }

    /// Record that this resource initiated the load of `request_id`
    pub fn add_initiated_resource(&mut self, request_id: RequestId) {
        self.initiated_resources.push(request_id.clone());
        self.dispatch(ResourceEvent::InitiatedResourcesChanged { request_id });
    }

    // =========================================================================
    // Response facet and lifecycle flags
    // =========================================================================

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    pub fn response_headers(&self) -> &Headers {
        &self.response_headers
    }

    /// Whether a response has arrived
    pub fn has_response(&self) -> bool {
        self.status_code.is_some()
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn canceled(&self) -> bool {
        self.canceled
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn response_source(&self) -> ResponseSource {
        self.response_source
    }

    pub fn timing(&self) -> &ResourceTimingData {
        &self.timing
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn priority(&self) -> NetworkPriority {
        self.priority
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    /// Small session-scoped alias of the backend connection token
    pub fn connection_identifier(&self) -> Option<u64> {
        self.connection_identifier
    }

    pub fn scripts(&self) -> &[ScriptRef] {
        &self.scripts
    }

    // =========================================================================
    // Timestamps
    // =========================================================================

    pub fn original_request_sent_time(&self) -> Option<f64> {
        self.original_request_sent_time
    }

    pub fn request_sent_time(&self) -> Option<f64> {
        self.request_sent_time
    }

    pub fn last_redirect_time(&self) -> Option<f64> {
        self.last_redirect_time
    }

    pub fn response_received_time(&self) -> Option<f64> {
        self.response_received_time
    }

    pub fn last_data_received_time(&self) -> Option<f64> {
        self.last_data_received_time
    }

    pub fn finished_or_failed_time(&self) -> Option<f64> {
        self.finished_or_failed_time
    }

    /// Earliest known timestamp for this resource
    pub fn first_timestamp(&self) -> Option<f64> {
        self.timing
            .start_time()
            .or(self.request_sent_time)
            .or(self.last_redirect_time)
            .or(self.response_received_time)
            .or(self.last_data_received_time)
            .or(self.finished_or_failed_time)
    }

    /// Latest known timestamp for this resource
    pub fn last_timestamp(&self) -> Option<f64> {
        self.timing
            .response_end()
            .or(self.last_data_received_time)
            .or(self.response_received_time)
            .or(self.last_redirect_time)
            .or(self.request_sent_time)
    }

    /// Total load duration; unset until both stage marks exist
    pub fn duration(&self) -> Option<f64> {
        match (self.timing.response_end(), self.timing.request_start()) {
            (Some(end), Some(start)) => Some(end - start),
            _ => None,
        }
    }

    /// Time to first response byte
    pub fn latency(&self) -> Option<f64> {
        match (self.timing.response_start(), self.timing.request_start()) {
            (Some(response), Some(request)) => Some(response - request),
            _ => None,
        }
    }

    /// Time spent receiving the response body
    pub fn receive_duration(&self) -> Option<f64> {
        match (self.timing.response_end(), self.timing.response_start()) {
            (Some(end), Some(start)) => Some(end - start),
            _ => None,
        }
    }

    // =========================================================================
    // Size accounting
    // =========================================================================

    pub fn request_headers_transfer_size(&self) -> Option<u64> {
        self.request_headers_transfer_size
    }

    pub fn request_body_transfer_size(&self) -> Option<u64> {
        self.request_body_transfer_size
    }

    pub fn response_headers_transfer_size(&self) -> Option<u64> {
        self.response_headers_transfer_size
    }

    pub fn response_body_transfer_size(&self) -> Option<u64> {
        self.response_body_transfer_size
    }

    pub fn cached_response_body_size(&self) -> Option<u64> {
        self.cached_response_body_size
    }

    pub fn estimated_size(&self) -> Option<u64> {
        self.estimated_size
    }

    pub fn estimated_transfer_size(&self) -> Option<u64> {
        self.estimated_transfer_size
    }

    pub fn estimated_response_headers_size(&self) -> Option<u64> {
        self.estimated_response_headers_size
    }

    /// Whether exact load metrics have been received
    pub fn received_network_load_metrics(&self) -> bool {
        self.received_network_load_metrics
    }

    /// Best-known decoded body size
    pub fn size(&self) -> Option<u64> {
        if let Some(size) = self.cached_response_body_size {
            return Some(size);
        }
        match self.response_body_size {
            Some(size) if size != 0 => Some(size),
            _ => self.estimated_size,
        }
    }

    /// Exact encoded body size, from metrics
    pub fn network_encoded_size(&self) -> Option<u64> {
        self.response_body_transfer_size
    }

    /// Exact decoded body size, from metrics
    pub fn network_decoded_size(&self) -> Option<u64> {
        self.response_body_size
    }

    /// Exact headers-plus-body transfer size, from metrics
    pub fn network_total_transfer_size(&self) -> Option<u64> {
        match (
            self.response_headers_transfer_size,
            self.response_body_transfer_size,
        ) {
            (Some(headers), Some(body)) => Some(headers + body),
            _ => None,
        }
    }

    /// Best-known encoded body size, falling back through the estimate track
    pub fn estimated_network_encoded_size(&self) -> Option<u64> {
        if let Some(exact) = self.network_encoded_size() {
            return Some(exact);
        }

        if self.cached {
            return Some(0);
        }

        // Some backends report the decoded transfer size instead of the
        // encoded size, so a Content-Length header can be the better signal.
        if self.prefer_content_length {
            if let Some(content_length) = self.content_length() {
                return Some(content_length);
            }
        }

        if let Some(estimate) = self.estimated_transfer_size {
            return Some(estimate);
        }

        // Without a reported transfer size, Content-Length reflects the raw
        // transfer length even when the network stack decoded the stream.
        // This won't hold for chunked content encodings, so fall back to the
        // decoded size estimate when Content-Length is absent.
        self.content_length().or(self.estimated_size)
    }

    /// Best-known headers-plus-body transfer size
    pub fn estimated_total_transfer_size(&self) -> Option<u64> {
        if let Some(exact) = self.network_total_transfer_size() {
            return Some(exact);
        }

        if self.status_code == Some(304) {
            // Not modified
            return self.estimated_response_headers_size;
        }

        if self.cached {
            return Some(0);
        }

        match (
            self.estimated_response_headers_size,
            self.estimated_network_encoded_size(),
        ) {
            (Some(headers), Some(encoded)) => Some(headers + encoded),
            _ => None,
        }
    }

    /// Whether the response body was served with gzip or deflate encoding
    pub fn compressed(&self) -> bool {
        static COMPRESSED_ENCODINGS: OnceLock<Regex> = OnceLock::new();
        let Some(content_encoding) = self.response_headers.get("Content-Encoding") else {
            return false;
        };
        COMPRESSED_ENCODINGS
            .get_or_init(|| Regex::new(r"\b(?:gzip|deflate)\b").expect("static pattern"))
            .is_match(content_encoding)
    }

    fn content_length(&self) -> Option<u64> {
        self.response_headers
            .get("Content-Length")
            .and_then(|value| value.trim().parse::<u64>().ok())
    }

    // =========================================================================
    // Lifecycle updates
    // =========================================================================

    /// Apply a redirect report. Legal only while non-terminal.
    pub fn update_for_redirect(&mut self, payload: &RedirectPayload) {
        assert!(!self.finished, "redirect applied to a finished resource");
        assert!(!self.failed, "redirect applied to a failed resource");

        debug!(url = %payload.url, "redirect received");

        let old_url = mem::replace(&mut self.url, payload.url.clone());
        self.request_headers = payload.request_headers.clone();
        self.last_redirect_time = payload.elapsed_time;

        if old_url != self.url {
            // Drop the parsed components so the URL is re-parsed on demand.
            *self.url_components.lock() = None;
            self.dispatch(ResourceEvent::UrlChanged {
                previous_url: old_url,
            });
        }

        self.dispatch(ResourceEvent::RequestHeadersChanged);
        self.dispatch(ResourceEvent::TimestampsChanged);
    }

    /// Apply the response report. Legal only while non-terminal.
    pub fn update_for_response(&mut self, payload: &ResponsePayload) {
        assert!(!self.finished, "response applied to a finished resource");
        assert!(!self.failed, "response applied to a failed resource");

        debug!(url = %payload.url, status = payload.status_code, "response received");

        let old_url = mem::replace(&mut self.url, payload.url.clone());
        let old_mime_type = mem::replace(&mut self.mime_type, payload.mime_type.clone());
        let old_type = self.resource_type;

        self.resource_type = resolve_type(payload.resource_type.as_deref(), &self.mime_type);
        self.status_code = Some(payload.status_code);
        self.status_text = Some(payload.status_text.clone());
        self.response_headers = payload.response_headers.clone();
        self.response_received_time = payload.elapsed_time;
        self.timing = ResourceTimingData::from_payload(payload.timing.as_ref());

        if let Some(source) = payload.source.as_deref() {
            self.response_source = response_source_from_payload(source);
        }

        let mut headers_size =
            payload.status_code.to_string().len() as u64 + payload.status_text.len() as u64
                + HEADER_BASE_SIZE;
        for (name, value) in self.response_headers.iter() {
            headers_size += name.len() as u64 + value.len() as u64 + HEADER_PAD;
        }
        self.estimated_response_headers_size = Some(headers_size);

        if payload.status_code == 304
            || matches!(
                self.response_source,
                ResponseSource::MemoryCache | ResponseSource::DiskCache
            )
        {
            self.mark_cached();
        }

        if old_url != self.url {
            // Drop the parsed components so the URL is re-parsed on demand.
            *self.url_components.lock() = None;
            self.dispatch(ResourceEvent::UrlChanged {
                previous_url: old_url,
            });
        }

        if old_mime_type != self.mime_type {
            *self.mime_components.lock() = None;
            self.dispatch(ResourceEvent::MimeTypeChanged {
                previous_mime_type: old_mime_type,
            });
        }

        if old_type != self.resource_type {
            self.dispatch(ResourceEvent::TypeChanged {
                previous_type: old_type,
            });
        }

        debug_assert!(self.estimated_size.is_none());
        debug_assert!(self.estimated_transfer_size.is_none());

        // A Content-Length header makes the transfer size computable without
        // further data reports, so notify listeners of that change. The 304
        // case already settled to the header estimate during mark_cached.
        if self.response_headers.contains("Content-Length") {
            self.dispatch(ResourceEvent::TransferSizeChanged);
        }

        self.dispatch(ResourceEvent::ResponseReceived);
        self.dispatch(ResourceEvent::TimestampsChanged);
    }

    /// Apply the one-shot authoritative load metrics report.
    ///
    /// Partial reports are legal: absent fields leave their state untouched.
    /// The five byte counts are written as a group; a group with missing or
    /// negative members is a programmer error.
    pub fn update_with_metrics(&mut self, metrics: &MetricsPayload) {
        debug!("network load metrics received");

        self.received_network_load_metrics = true;

        if let Some(protocol) = &metrics.protocol {
            self.protocol = Some(protocol.clone());
        }
        if let Some(priority) = metrics.priority.as_deref() {
            self.priority = priority_from_payload(priority);
        }
        if let Some(remote_address) = &metrics.remote_address {
            self.remote_address = Some(remote_address.clone());
        }
        if let Some(token) = &metrics.connection_identifier {
            self.connection_identifier = Some(self.connections.resolve(token));
        }
        if let Some(request_headers) = &metrics.request_headers {
            self.request_headers = request_headers.clone();
            self.dispatch(ResourceEvent::RequestHeadersChanged);
        }

        if metrics.request_header_bytes_sent.is_some() {
            let (
                Some(request_header_bytes),
                Some(request_body_bytes),
                Some(response_header_bytes),
                Some(response_body_bytes),
                Some(response_body_decoded),
            ) = (
                metrics.request_header_bytes_sent,
                metrics.request_body_bytes_sent,
                metrics.response_header_bytes_received,
                metrics.response_body_bytes_received,
                metrics.response_body_decoded_size,
            )
            else {
                panic!("network load metrics byte counts arrive as a full group");
            };

            for bytes in [
                request_header_bytes,
                request_body_bytes,
                response_header_bytes,
                response_body_bytes,
                response_body_decoded,
            ] {
                assert!(bytes >= 0, "negative byte count in network load metrics");
            }

            self.request_headers_transfer_size = Some(request_header_bytes as u64);
            self.request_body_transfer_size = Some(request_body_bytes as u64);
            self.response_headers_transfer_size = Some(response_header_bytes as u64);
            self.response_body_transfer_size = Some(response_body_bytes as u64);
            self.response_body_size = Some(response_body_decoded as u64);

            self.dispatch(ResourceEvent::SizeChanged {
                previous_size: self.estimated_size,
            });
            self.dispatch(ResourceEvent::TransferSizeChanged);
        }
    }

    /// Record the exact body size of a cached response. Set at most once.
    pub fn set_cached_response_body_size(&mut self, size: u64) {
        assert!(
            self.cached_response_body_size.is_none(),
            "cached response body size is set at most once"
        );
        self.cached_response_body_size = Some(size);
    }

    /// Accumulate a streamed decoded-data chunk into the size estimate.
    /// Illegal once exact metrics have been received.
    pub fn increase_size(&mut self, data_length: u64, elapsed_time: Option<f64>) {
        assert!(
            !self.received_network_load_metrics,
            "streamed size reported after network load metrics"
        );

        let previous_size = Some(self.estimated_size.unwrap_or(0));
        self.estimated_size = Some(self.estimated_size.unwrap_or(0) + data_length);
        self.last_data_received_time = elapsed_time;

        self.dispatch(ResourceEvent::SizeChanged { previous_size });

        // While no better signal exists, the decoded size estimate is also
        // the transfer size estimate.
        if self.estimated_transfer_size.is_none()
            && !self.cached
            && self.status_code != Some(304)
            && !self.response_headers.contains("Content-Length")
        {
            self.dispatch(ResourceEvent::TransferSizeChanged);
        }
    }

    /// Accumulate a streamed encoded-data length into the transfer estimate.
    /// Illegal once exact metrics have been received.
    pub fn increase_transfer_size(&mut self, encoded_data_length: u64) {
        assert!(
            !self.received_network_load_metrics,
            "streamed transfer size reported after network load metrics"
        );

        self.estimated_transfer_size =
            Some(self.estimated_transfer_size.unwrap_or(0) + encoded_data_length);

        self.dispatch(ResourceEvent::TransferSizeChanged);
    }

    /// Mark the resource served from cache. Idempotent.
    pub fn mark_cached(&mut self) {
        if self.cached {
            return;
        }

        self.cached = true;
        self.dispatch(ResourceEvent::CacheStatusChanged);

        // The transfer size starts reporting 0 once cached, unless status is
        // 304 where the header estimate already applies.
        if self.status_code != Some(304) {
            self.dispatch(ResourceEvent::TransferSizeChanged);
        }
    }

    /// Served-from-memory-cache report from backends without a response source
    pub fn served_from_memory_cache(&mut self) {
        debug_assert_eq!(self.response_source, ResponseSource::Unknown);
        self.response_source = ResponseSource::MemoryCache;
        self.mark_cached();
    }

    /// Served-from-disk-cache report from backends without a response source
    pub fn served_from_disk_cache(&mut self) {
        debug_assert_eq!(self.response_source, ResponseSource::Unknown);
        self.response_source = ResponseSource::DiskCache;
        self.mark_cached();
    }

    /// Terminal success. Illegal after a failure.
    pub fn mark_finished(&mut self, elapsed_time: Option<f64>) {
        assert!(!self.failed, "cannot finish a failed resource");

        debug!(url = %self.url, "loading finished");

        self.finished = true;
        self.finished_or_failed_time = elapsed_time;
        if let Some(time) = elapsed_time {
            self.timing.mark_response_end(time);
        }

        let _ = self.completion.send(Completion::Finished);
        self.pending_content = None;

        self.dispatch(ResourceEvent::LoadingFinished);
        self.dispatch(ResourceEvent::TimestampsChanged);
    }

    /// Terminal failure, optionally from cancellation. Illegal after a finish.
    pub fn mark_failed(&mut self, canceled: bool, elapsed_time: Option<f64>) {
        assert!(!self.finished, "cannot fail a finished resource");

        debug!(url = %self.url, canceled, "loading failed");

        self.failed = true;
        self.canceled = canceled;
        self.finished_or_failed_time = elapsed_time;

        let _ = self.completion.send(Completion::Failed);

        self.dispatch(ResourceEvent::LoadingFailed);
        self.dispatch(ResourceEvent::TimestampsChanged);
    }

    /// Undo a finish applied in error (duplicate or out-of-order backend
    /// report). Only legal while finished and not failed.
    pub fn revert_finished(&mut self) {
        assert!(!self.failed, "cannot revert a failed resource");
        assert!(self.finished, "only a finished resource can be reverted");

        self.finished = false;
        self.finished_or_failed_time = None;

        let _ = self.completion.send(Completion::Pending);
    }

    /// Associate a script discovered inside this resource.
    ///
    /// A generic or XHR resource found to contain script is promoted to the
    /// Script type; a type is never demoted.
    pub fn associate_with_script(&mut self, script: ScriptRef) {
        self.scripts.push(script);

        if matches!(
            self.resource_type,
            ResourceType::Other | ResourceType::XHR
        ) {
            let previous_type = mem::replace(&mut self.resource_type, ResourceType::Script);
            self.dispatch(ResourceEvent::TypeChanged { previous_type });
        }
    }

    /// Find the script whose range contains the given source position
    pub fn script_for_position(&self, line: u32, column: u32) -> Option<&ScriptRef> {
        for script in &self.scripts {
            let range = &script.range;
            if range.start_line <= line && range.end_line >= line {
                if range.start_line == line && column < range.start_column {
                    continue;
                }
                if range.end_line == line && column > range.end_column {
                    continue;
                }
                return Some(script);
            }
        }
        None
    }

    // =========================================================================
    // Content retrieval
    // =========================================================================

    /// Request the resource content through the supplied fetch capability.
    ///
    /// Before the terminal transition this returns a memoized shared future
    /// that resolves once the resource finishes (delegating one fetch) or
    /// fails (rejecting with a fixed message); concurrent callers share the
    /// same outcome. After the terminal transition the paths are direct.
    pub fn request_content(&mut self, fetcher: Arc<dyn ContentFetcher>) -> ContentFuture {
        if self.finished {
            return fetch_content(fetcher);
        }

        if self.failed {
            return ready_content(Err(inspector_types::ContentError::LoadingFailed));
        }

        self.pending_content
            .get_or_insert_with(|| {
                content_after_completion(self.completion.subscribe(), fetcher)
            })
            .clone()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("url", &self.url)
            .field("mime_type", &self.mime_type)
            .field("resource_type", &self.resource_type)
            .field("status_code", &self.status_code)
            .field("finished", &self.finished)
            .field("failed", &self.failed)
            .field("canceled", &self.canceled)
            .field("cached", &self.cached)
            .finish_non_exhaustive()
    }
}

fn resolve_type(raw: Option<&str>, mime_type: &str) -> ResourceType {
    match raw {
        Some(name) => match ResourceType::from_protocol_name(name) {
            Some(resource_type) => resource_type,
            None => {
                warn!(resource_type = name, "unknown resource type, deriving from MIME type");
                ResourceType::from_mime_type(mime_type)
            }
        },
        None => ResourceType::from_mime_type(mime_type),
    }
}

fn response_source_from_payload(raw: &str) -> ResponseSource {
    ResponseSource::from_protocol_name(raw).unwrap_or_else(|| {
        error!(source = raw, "unknown response source");
        ResponseSource::Unknown
    })
}

fn priority_from_payload(raw: &str) -> NetworkPriority {
    NetworkPriority::from_protocol_name(raw).unwrap_or_else(|| {
        error!(priority = raw, "unknown metrics priority");
        NetworkPriority::Unknown
    })
}
