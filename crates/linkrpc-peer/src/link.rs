use std::time::Duration;

use linkrpc_frame::check_packet;
use linkrpc_transport::{Clock, Transport};
use tracing::trace;

use crate::config::EndpointConfig;
use crate::retry::RetryTimeouts;

/// Shared endpoint core: the transport, the clock, the call buffer and the
/// adaptive short timeouts.
///
/// The buffer is allocated once at construction and holds exactly one
/// framed payload at a time; both handshake directions and the streaming
/// mode reuse it.
pub(crate) struct Link<T, C> {
    pub(crate) transport: T,
    pub(crate) clock: C,
    pub(crate) buf: Vec<u8>,
    pub(crate) timeouts: RetryTimeouts,
    pub(crate) put_long_timeout: Duration,
    pub(crate) get_long_timeout: Duration,
    pub(crate) stream_queue_depth_max: u32,
}

impl<T: Transport, C: Clock> Link<T, C> {
    pub(crate) fn new(transport: T, clock: C, config: &EndpointConfig) -> Self {
        let stream_queue_depth_max = if transport.half_duplex() {
            1
        } else {
            config.stream_queue_depth_max
        };

        Self {
            transport,
            clock,
            buf: vec![0; config.buffer_len],
            timeouts: RetryTimeouts::new(config.put_short_timeout, config.get_short_timeout),
            put_long_timeout: config.put_long_timeout,
            get_long_timeout: config.get_long_timeout,
            stream_queue_depth_max,
        }
    }

    /// Send a pre-encoded frame. Failures are detected by the peer's missing
    /// acknowledgement, not here.
    pub(crate) fn send(&mut self, frame: &[u8], timeout: Duration) {
        if let Err(err) = self.transport.put_bytes(frame, timeout) {
            trace!(%err, len = frame.len(), "send failed");
        }
    }

    /// Send the first `len` bytes of the call buffer.
    pub(crate) fn send_buf(&mut self, len: usize, timeout: Duration) {
        if let Err(err) = self.transport.put_bytes(&self.buf[..len], timeout) {
            trace!(%err, len, "buffer send failed");
        }
    }

    /// Receive a frame of exactly `dst.len()` bytes and validate it against
    /// `magic`. A short read, magic mismatch or CRC mismatch is
    /// indistinguishable from noise and reported as a miss.
    pub(crate) fn recv_frame(&mut self, magic: u16, dst: &mut [u8], timeout: Duration) -> bool {
        if let Err(err) = self.transport.get_bytes(dst, timeout) {
            trace!(%err, expected = magic, "receive failed");
            return false;
        }
        check_packet(dst, magic)
    }

    /// Receive a validated frame of exactly `len` bytes into the call buffer.
    pub(crate) fn recv_buf(&mut self, magic: u16, len: usize, timeout: Duration) -> bool {
        if let Err(err) = self.transport.get_bytes(&mut self.buf[..len], timeout) {
            trace!(%err, expected = magic, "receive failed");
            return false;
        }
        check_packet(&self.buf[..len], magic)
    }
}
