// Network resource types and report payload shapes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::headers::Headers;

/// Unique request identifier, opaque correlation key from the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loader identifier, opaque correlation key from the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LoaderId(pub String);

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Frame identifier used for the parent-frame back-reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FrameId(pub String);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Semantic category of a resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Font,
    Script,
    XHR,
    Fetch,
    WebSocket,
    Other,
}

impl ResourceType {
    /// Parse the raw enumerated name reported by the backend.
    ///
    /// Returns `None` for unrecognized names; callers degrade to deriving
    /// the type from the MIME type instead.
    pub fn from_protocol_name(name: &str) -> Option<Self> {
        match name {
            "Document" => Some(ResourceType::Document),
            "Stylesheet" => Some(ResourceType::Stylesheet),
            "Image" => Some(ResourceType::Image),
            "Font" => Some(ResourceType::Font),
            "Script" => Some(ResourceType::Script),
            "XHR" => Some(ResourceType::XHR),
            "Fetch" => Some(ResourceType::Fetch),
            "WebSocket" => Some(ResourceType::WebSocket),
            "Other" => Some(ResourceType::Other),
            _ => None,
        }
    }

    /// Derive a resource type from a MIME type.
    ///
    /// Resources are often transferred with a MIME type that doesn't match
    /// the purpose the resource was loaded for; this mapping reflects the
    /// purpose the inspector assumes for a bare MIME type.
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type.is_empty() {
            return ResourceType::Other;
        }

        let mime_type = MimeComponents::parse(mime_type).mime_type;

        match mime_type.as_str() {
            "text/html" | "text/xml" | "text/plain" | "application/xhtml+xml"
            | "image/svg+xml" => ResourceType::Document,

            "text/css" | "text/xsl" | "text/x-less" | "text/x-sass" | "text/x-scss" => {
                ResourceType::Stylesheet
            }

            "application/pdf" => ResourceType::Image,

            "application/x-font-type1" | "application/x-font-ttf" | "application/x-font-woff"
            | "application/x-truetype-font" => ResourceType::Font,

            "text/javascript" | "text/ecmascript" | "application/javascript"
            | "application/ecmascript" | "application/x-javascript" | "application/json"
            | "application/x-json" | "text/x-javascript" | "text/x-json"
            | "text/javascript1.1" | "text/javascript1.2" | "text/javascript1.3"
            | "text/jscript" | "text/livescript" | "text/x-livescript" | "text/typescript"
            | "text/x-clojure" | "text/x-coffeescript" => ResourceType::Script,

            _ if mime_type.starts_with("image/") => ResourceType::Image,
            _ if mime_type.starts_with("font/") => ResourceType::Font,

            _ => ResourceType::Other,
        }
    }
}

/// Network priority reported by the backend load metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkPriority {
    Unknown,
    Low,
    Medium,
    High,
}

impl NetworkPriority {
    /// Parse the raw enumerated name reported in a metrics payload
    pub fn from_protocol_name(name: &str) -> Option<Self> {
        match name {
            "Low" => Some(NetworkPriority::Low),
            "Medium" => Some(NetworkPriority::Medium),
            "High" => Some(NetworkPriority::High),
            _ => None,
        }
    }
}

/// Where a response was served from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResponseSource {
    Unknown,
    Network,
    MemoryCache,
    DiskCache,
}

impl ResponseSource {
    /// Parse the raw enumerated name reported in a response payload
    pub fn from_protocol_name(name: &str) -> Option<Self> {
        match name {
            "Unknown" => Some(ResponseSource::Unknown),
            "Network" => Some(ResponseSource::Network),
            "MemoryCache" => Some(ResponseSource::MemoryCache),
            "DiskCache" => Some(ResponseSource::DiskCache),
            _ => None,
        }
    }
}

/// Parsed components of a MIME type string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeComponents {
    /// The bare type/subtype, without parameters
    pub mime_type: String,
    /// Raw `key=value` parameter segments, trimmed, in order
    pub parameters: Vec<String>,
}

impl MimeComponents {
    /// Split a raw MIME string into the bare type and its parameters
    pub fn parse(raw: &str) -> Self {
        let mut segments = raw.split(';').map(str::trim);
        let mime_type = segments.next().unwrap_or("").to_string();
        let parameters = segments
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            mime_type,
            parameters,
        }
    }
}

/// Line/column range occupied by a script within its resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// A script associated with a resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRef {
    /// Script identifier
    pub id: String,
    /// Range the script text occupies in the resource
    pub range: TextRange,
}

/// Source position that initiated a resource load.
///
/// When `resource` names another tracked resource, the new resource
/// registers itself in that initiator's initiated-resources list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitiatorLocation {
    /// Request id of the initiating resource, if the initiator is a resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<RequestId>,
    pub line: u32,
    pub column: u32,
}

/// Redirect report pushed by the network-report source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedirectPayload {
    /// URL of the redirected request
    pub url: String,
    /// Request headers of the redirected request
    #[serde(default)]
    pub request_headers: Headers,
    /// Elapsed time the redirect was received, seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
}

/// Response report pushed by the network-report source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePayload {
    /// Response URL
    pub url: String,
    /// Reported MIME type
    pub mime_type: String,
    /// Raw enumerated resource type, if the backend knows it
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Response headers
    #[serde(default)]
    pub response_headers: Headers,
    /// HTTP status code
    pub status_code: u16,
    /// HTTP status text
    pub status_text: String,
    /// Elapsed time the response was received, seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    /// Raw network-stage timing payload, replaced wholesale on the resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingPayload>,
    /// Raw enumerated response source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One-shot authoritative network load metrics report.
///
/// Partial reports are legal: absent fields leave the resource untouched.
/// The five byte counts arrive as a group; they are signed here so that a
/// negative backend value is representable and can be rejected on apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    /// Opaque backend connection token, aliased to a small integer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_identifier: Option<String>,
    /// Authoritative request headers, replacing the whole mapping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<Headers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_header_bytes_sent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body_bytes_sent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_header_bytes_received: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body_bytes_received: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body_decoded_size: Option<i64>,
}

/// Raw network-stage timestamps, elapsed seconds; absent stages stay unset
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimingPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_lookup_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_lookup_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_connection_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_end: Option<f64>,
}
