// Network-stage timing for a single resource load

use inspector_types::TimingPayload;

/// Timestamps for the network stages of one load, elapsed seconds.
///
/// Owned exclusively by its resource and replaced wholesale whenever a full
/// timing payload arrives; absent stages stay unset. The only mutation after
/// construction is [`mark_response_end`](Self::mark_response_end), applied by
/// the owning resource at finish time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceTimingData {
    start_time: Option<f64>,
    domain_lookup_start: Option<f64>,
    domain_lookup_end: Option<f64>,
    connect_start: Option<f64>,
    connect_end: Option<f64>,
    secure_connection_start: Option<f64>,
    request_start: Option<f64>,
    response_start: Option<f64>,
    response_end: Option<f64>,
}

impl ResourceTimingData {
    /// Timing data with every stage unset
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build stage timestamps from a raw backend payload.
    ///
    /// A missing payload yields all-unset timing data.
    pub fn from_payload(payload: Option<&TimingPayload>) -> Self {
        let Some(payload) = payload else {
            return Self::default();
        };
        Self {
            start_time: payload.start_time,
            domain_lookup_start: payload.domain_lookup_start,
            domain_lookup_end: payload.domain_lookup_end,
            connect_start: payload.connect_start,
            connect_end: payload.connect_end,
            secure_connection_start: payload.secure_connection_start,
            request_start: payload.request_start,
            response_start: payload.response_start,
            response_end: payload.response_end,
        }
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn domain_lookup_start(&self) -> Option<f64> {
        self.domain_lookup_start
    }

    pub fn domain_lookup_end(&self) -> Option<f64> {
        self.domain_lookup_end
    }

    pub fn connect_start(&self) -> Option<f64> {
        self.connect_start
    }

    pub fn connect_end(&self) -> Option<f64> {
        self.connect_end
    }

    pub fn secure_connection_start(&self) -> Option<f64> {
        self.secure_connection_start
    }

    pub fn request_start(&self) -> Option<f64> {
        self.request_start
    }

    pub fn response_start(&self) -> Option<f64> {
        self.response_start
    }

    pub fn response_end(&self) -> Option<f64> {
        self.response_end
    }

    /// Backfill the response-end mark when the timing payload omitted one.
    /// An existing mark is never overwritten.
    pub fn mark_response_end(&mut self, time: f64) {
        if self.response_end.is_none() {
            self.response_end = Some(time);
        }
    }
}
