use std::time::Duration;

use linkrpc_frame::{
    empty_packet, encode_packet, hash_name, pack_u32, payload, unpack_u32, COMMAND_DATA_MAGIC,
    COMMAND_HEADER_MAGIC, PACKET_OVERHEAD, RESULT_DATA_MAGIC, RESULT_HEADER_MAGIC,
};
use linkrpc_transport::{Clock, SystemClock, Transport};
use tracing::trace;

use crate::config::{CallOptions, EndpointConfig};
use crate::error::{Result, RpcError};
use crate::link::Link;

/// The calling side of the link.
///
/// Drives the four-phase command handshake and the four-phase result
/// handshake. One call is in flight at a time; the result borrow returned by
/// [`get_result`](Self::get_result) and the `call` composites is valid until
/// the next operation.
pub struct Master<T, C = SystemClock> {
    link: Link<T, C>,
    result_header_ack: [u8; PACKET_OVERHEAD],
    result_data_ack: [u8; PACKET_OVERHEAD],
}

impl<T: Transport> Master<T> {
    /// Create a master over `transport` with the process clock.
    pub fn new(transport: T, config: EndpointConfig) -> Self {
        Self::with_clock(transport, SystemClock, config)
    }
}

impl<T: Transport, C: Clock> Master<T, C> {
    /// Create a master over `transport` with an explicit clock.
    pub fn with_clock(transport: T, clock: C, config: EndpointConfig) -> Self {
        Self {
            link: Link::new(transport, clock, &config),
            result_header_ack: empty_packet(RESULT_HEADER_MAGIC),
            result_data_ack: empty_packet(RESULT_DATA_MAGIC),
        }
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.link.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.link.transport
    }

    /// Submit a command: the first half of a call.
    ///
    /// Encodes the payload once, then retries the header/ack/data/ack
    /// exchange until it completes or `deadline` elapses. Short timeouts
    /// escalate by 3/2 per failed attempt, capped at the deadline.
    pub fn put_command(&mut self, command: u32, data: &[u8], deadline: Duration) -> Result<()> {
        let needed = data.len() + PACKET_OVERHEAD;
        if self.link.buf.len() < needed {
            return Err(RpcError::BufferExhausted {
                needed,
                capacity: self.link.buf.len(),
            });
        }

        let mut header_fields = [0u8; 8];
        pack_u32(&mut header_fields[..4], command);
        pack_u32(&mut header_fields[4..], data.len() as u32);
        let mut out_header = [0u8; 8 + PACKET_OVERHEAD];
        encode_packet(&mut out_header, COMMAND_HEADER_MAGIC, &header_fields)?;
        encode_packet(&mut self.link.buf, COMMAND_DATA_MAGIC, data)?;

        self.link.timeouts.reset();
        let put_long = self.link.put_long_timeout;
        let start = self.link.clock.now();
        let mut header_ack = [0u8; PACKET_OVERHEAD];
        let mut data_ack = [0u8; PACKET_OVERHEAD];

        while self.link.clock.now().duration_since(start) < deadline {
            header_ack.fill(0);
            data_ack.fill(0);
            self.link.transport.flush();

            let (put_short, get_short) = self.link.timeouts.shorts();
            self.link.send(&out_header, put_short);
            if self.link.recv_frame(COMMAND_HEADER_MAGIC, &mut header_ack, get_short) {
                self.link.send_buf(needed, put_long);
                if self.link.recv_frame(COMMAND_DATA_MAGIC, &mut data_ack, get_short) {
                    return Ok(());
                }
            }

            self.link.timeouts.escalate_multiplicative(deadline);
            trace!(command, "command attempt missed, timeouts escalated");
        }

        Err(RpcError::DeadlineExpired(deadline))
    }

    /// Retrieve the result: the second half of a call.
    ///
    /// Polls the slave with empty RESULT packets until it answers with the
    /// result length and payload, or `deadline` elapses. A result larger
    /// than the endpoint buffer ends the call immediately.
    pub fn get_result(&mut self, deadline: Duration) -> Result<&[u8]> {
        self.link.timeouts.reset();
        let get_long = self.link.get_long_timeout;
        let start = self.link.clock.now();
        let mut header = [0u8; 4 + PACKET_OVERHEAD];

        while self.link.clock.now().duration_since(start) < deadline {
            header.fill(0);
            self.link.transport.flush();

            let (put_short, get_short) = self.link.timeouts.shorts();
            self.link.send(&self.result_header_ack, put_short);
            if self.link.recv_frame(RESULT_HEADER_MAGIC, &mut header, get_short) {
                let result_len = unpack_u32(payload(&header)) as usize;
                let total = result_len.saturating_add(PACKET_OVERHEAD);
                if self.link.buf.len() < total {
                    return Err(RpcError::BufferExhausted {
                        needed: total,
                        capacity: self.link.buf.len(),
                    });
                }
                self.link.send(&self.result_data_ack, put_short);
                if self.link.recv_buf(RESULT_DATA_MAGIC, total, get_long) {
                    return Ok(&self.link.buf[2..2 + result_len]);
                }
            }

            self.link.timeouts.escalate_multiplicative(deadline);
            trace!("result attempt missed, timeouts escalated");
        }

        Err(RpcError::DeadlineExpired(deadline))
    }

    /// Call `name` with `data` using default [`CallOptions`].
    pub fn call(&mut self, name: &str, data: &[u8]) -> Result<&[u8]> {
        self.call_with(name, data, &CallOptions::default())
    }

    /// Call `name` with `data` and explicit budgets.
    pub fn call_with(&mut self, name: &str, data: &[u8], options: &CallOptions) -> Result<&[u8]> {
        self.call_by_id(hash_name(name), data, options)
    }

    /// Call a pre-hashed command identifier.
    pub fn call_by_id(&mut self, command: u32, data: &[u8], options: &CallOptions) -> Result<&[u8]> {
        self.put_command(command, data, options.send_timeout)?;
        let result = self.get_result(options.recv_timeout)?;
        if options.fail_on_empty && result.is_empty() {
            return Err(RpcError::EmptyResult);
        }
        Ok(result)
    }

    /// Call `name` and copy the result into `out`, returning the copied
    /// length (truncated to `out`). `out` is zeroed on every failure.
    pub fn call_into(
        &mut self,
        name: &str,
        data: &[u8],
        out: &mut [u8],
        options: &CallOptions,
    ) -> Result<usize> {
        match self.call_with(name, data, options) {
            Ok(result) => {
                let n = result.len().min(out.len());
                out[..n].copy_from_slice(&result[..n]);
                Ok(n)
            }
            Err(err) => {
                out.fill(0);
                Err(err)
            }
        }
    }

    /// Become the consuming side of a stream. See [`crate::stream`].
    pub fn stream_reader(
        &mut self,
        on_chunk: impl FnMut(&[u8]) -> bool,
        queue_depth: u32,
        read_timeout: Duration,
    ) -> Result<()> {
        self.link.stream_reader(on_chunk, queue_depth, read_timeout)
    }

    /// Become the producing side of a stream. See [`crate::stream`].
    pub fn stream_writer(
        &mut self,
        next_chunk: impl FnMut(&mut Vec<u8>) -> bool,
        write_timeout: Duration,
    ) -> Result<()> {
        self.link.stream_writer(next_chunk, write_timeout)
    }
}
