use std::time::Duration;

/// Endpoint tuning: buffer capacity, handshake timeouts, stream depth.
///
/// The short timeouts are per-attempt baselines; each handshake resets to
/// them and escalates from there. The long timeouts cover the payload-sized
/// transfers inside a handshake.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Endpoint buffer capacity. Bounds the payload of a single call to
    /// `buffer_len - 4` (magic + CRC overhead).
    pub buffer_len: usize,
    /// Baseline send budget for header and acknowledgement packets.
    pub put_short_timeout: Duration,
    /// Baseline receive budget for header and acknowledgement packets.
    pub get_short_timeout: Duration,
    /// Send budget for payload packets.
    pub put_long_timeout: Duration,
    /// Receive budget for payload packets.
    pub get_long_timeout: Duration,
    /// Upper bound on the stream writer queue depth. Forced to 1 on
    /// half-duplex transports.
    pub stream_queue_depth_max: u32,
    /// Slave dispatch registry capacity.
    pub dispatch_capacity: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            buffer_len: 512,
            put_short_timeout: Duration::from_millis(3),
            get_short_timeout: Duration::from_millis(3),
            put_long_timeout: Duration::from_millis(5000),
            get_long_timeout: Duration::from_millis(5000),
            stream_queue_depth_max: 255,
            dispatch_capacity: 32,
        }
    }
}

impl EndpointConfig {
    /// Override the endpoint buffer capacity.
    pub fn with_buffer_len(mut self, buffer_len: usize) -> Self {
        self.buffer_len = buffer_len;
        self
    }

    /// Override the short (header/ack) timeout baselines.
    pub fn with_short_timeouts(mut self, put: Duration, get: Duration) -> Self {
        self.put_short_timeout = put;
        self.get_short_timeout = get;
        self
    }

    /// Override the long (payload) timeouts.
    pub fn with_long_timeouts(mut self, put: Duration, get: Duration) -> Self {
        self.put_long_timeout = put;
        self.get_long_timeout = get;
        self
    }

    /// Override the stream writer queue depth bound.
    pub fn with_stream_queue_depth_max(mut self, depth: u32) -> Self {
        self.stream_queue_depth_max = depth;
        self
    }

    /// Override the slave dispatch registry capacity.
    pub fn with_dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }
}

/// Per-call budgets for [`Master::call`](crate::Master::call) composites.
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Outer deadline for the command handshake.
    pub send_timeout: Duration,
    /// Outer deadline for the result handshake.
    pub recv_timeout: Duration,
    /// Treat a zero-length result as [`RpcError::EmptyResult`](crate::RpcError::EmptyResult).
    pub fail_on_empty: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(1000),
            recv_timeout: Duration::from_millis(1000),
            fail_on_empty: false,
        }
    }
}

impl CallOptions {
    /// Override the command handshake deadline.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Override the result handshake deadline.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Fail calls whose result is empty.
    pub fn with_fail_on_empty(mut self, fail_on_empty: bool) -> Self {
        self.fail_on_empty = fail_on_empty;
        self
    }
}
