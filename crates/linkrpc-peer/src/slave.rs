use std::time::Duration;

use linkrpc_frame::{
    empty_packet, encode_packet, hash_name, pack_u32, payload, unpack_u32, COMMAND_DATA_MAGIC,
    COMMAND_HEADER_MAGIC, PACKET_OVERHEAD, RESULT_DATA_MAGIC, RESULT_HEADER_MAGIC,
};
use linkrpc_transport::{Clock, SystemClock, Transport};
use tracing::trace;

use crate::config::EndpointConfig;
use crate::error::{Result, RpcError};
use crate::link::Link;
use crate::registry::CallbackRegistry;

/// A one-shot or recurring slave-side hook.
pub type Hook = Box<dyn FnMut()>;

/// The serving side of the link.
///
/// Owns the command dispatch table, waits for one command at a time,
/// invokes the matching callback and ships the response back through the
/// mirror handshake.
pub struct Slave<T, C = SystemClock> {
    link: Link<T, C>,
    registry: CallbackRegistry,
    response: Vec<u8>,
    command_header_ack: [u8; PACKET_OVERHEAD],
    command_data_ack: [u8; PACKET_OVERHEAD],
    schedule_cb: Option<Hook>,
    loop_cb: Option<Hook>,
}

impl<T: Transport> Slave<T> {
    /// Create a slave over `transport` with the process clock.
    pub fn new(transport: T, config: EndpointConfig) -> Self {
        Self::with_clock(transport, SystemClock, config)
    }
}

impl<T: Transport, C: Clock> Slave<T, C> {
    /// Create a slave over `transport` with an explicit clock.
    pub fn with_clock(transport: T, clock: C, config: EndpointConfig) -> Self {
        Self {
            registry: CallbackRegistry::with_capacity(config.dispatch_capacity),
            response: Vec::with_capacity(config.buffer_len),
            link: Link::new(transport, clock, &config),
            command_header_ack: empty_packet(COMMAND_HEADER_MAGIC),
            command_data_ack: empty_packet(COMMAND_DATA_MAGIC),
            schedule_cb: None,
            loop_cb: None,
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

    /// Register or replace the procedure for `name`.
    ///
    /// The callback receives the command payload and appends its response;
    /// an unmatched command answers with an empty response instead.
    pub fn register_callback<F>(&mut self, name: &str, callback: F) -> Result<()>
    where
        F: FnMut(&[u8], &mut Vec<u8>) + 'static,
    {
        self.registry.register(hash_name(name), Box::new(callback))
    }

    /// Install a one-shot hook that runs after the next successful result
    /// put. The hook is cleared after that command either way.
    pub fn schedule_callback<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.schedule_cb = Some(Box::new(callback));
    }

    /// Install a recurring hook run once per loop iteration.
    pub fn setup_loop_callback<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.loop_cb = Some(Box::new(callback));
    }

    /// Serve forever.
    pub fn run(&mut self, send_timeout: Duration, recv_timeout: Duration) -> ! {
        loop {
            self.poll(send_timeout, recv_timeout);
        }
    }

    /// One service iteration: wait for a command up to `recv_timeout`,
    /// dispatch it, return the result within `send_timeout`, run hooks.
    pub fn poll(&mut self, send_timeout: Duration, recv_timeout: Duration) {
        match self.get_command(recv_timeout) {
            Ok((command, len)) => {
                let Self {
                    link,
                    registry,
                    response,
                    ..
                } = self;

                response.clear();
                match registry.lookup_mut(command) {
                    Some(callback) => callback(&link.buf[2..2 + len], response),
                    None => trace!(command, "no callback registered"),
                }

                let put_ok = self.put_result(send_timeout).is_ok();
                let scheduled = self.schedule_cb.take();
                if put_ok {
                    if let Some(mut hook) = scheduled {
                        hook();
                    }
                }
            }
            Err(err) => trace!(%err, "no command this iteration"),
        }

        if let Some(hook) = self.loop_cb.as_mut() {
            hook();
        }
    }

    /// Mirror of the master's command handshake. Returns the command
    /// identifier and payload length; the payload sits in the call buffer.
    fn get_command(&mut self, deadline: Duration) -> Result<(u32, usize)> {
        self.link.timeouts.reset();
        let get_long = self.link.get_long_timeout;
        let start = self.link.clock.now();
        let mut header = [0u8; 8 + PACKET_OVERHEAD];

        while self.link.clock.now().duration_since(start) < deadline {
            header.fill(0);
            self.link.transport.flush();

            let (put_short, get_short) = self.link.timeouts.shorts();
            if self.link.recv_frame(COMMAND_HEADER_MAGIC, &mut header, get_short) {
                let fields = payload(&header);
                let command = unpack_u32(&fields[..4]);
                let data_len = unpack_u32(&fields[4..]) as usize;
                let total = data_len.saturating_add(PACKET_OVERHEAD);
                if self.link.buf.len() < total {
                    return Err(RpcError::BufferExhausted {
                        needed: total,
                        capacity: self.link.buf.len(),
                    });
                }
                self.link.send(&self.command_header_ack, put_short);
                if self.link.recv_buf(COMMAND_DATA_MAGIC, total, get_long) {
                    self.link.send(&self.command_data_ack, put_short);
                    return Ok((command, data_len));
                }
            }

            self.link.timeouts.escalate_additive(deadline);
        }

        Err(RpcError::DeadlineExpired(deadline))
    }

    /// Mirror of the master's result handshake: announce the response
    /// length, wait for the fetch poll, ship the payload.
    fn put_result(&mut self, deadline: Duration) -> Result<()> {
        let size = self.response.len();
        let total = size + PACKET_OVERHEAD;
        if self.link.buf.len() < total {
            return Err(RpcError::BufferExhausted {
                needed: total,
                capacity: self.link.buf.len(),
            });
        }

        let mut len_bytes = [0u8; 4];
        pack_u32(&mut len_bytes, size as u32);
        let mut out_header = [0u8; 4 + PACKET_OVERHEAD];
        encode_packet(&mut out_header, RESULT_HEADER_MAGIC, &len_bytes)?;
        encode_packet(&mut self.link.buf, RESULT_DATA_MAGIC, &self.response)?;

        self.link.timeouts.reset();
        let put_long = self.link.put_long_timeout;
        let start = self.link.clock.now();
        let mut header_poll = [0u8; PACKET_OVERHEAD];
        let mut data_poll = [0u8; PACKET_OVERHEAD];

        while self.link.clock.now().duration_since(start) < deadline {
            header_poll.fill(0);
            data_poll.fill(0);
            self.link.transport.flush();

            let (put_short, get_short) = self.link.timeouts.shorts();
            if self.link.recv_frame(RESULT_HEADER_MAGIC, &mut header_poll, get_short) {
                self.link.send(&out_header, put_short);
                if self.link.recv_frame(RESULT_DATA_MAGIC, &mut data_poll, get_short) {
                    self.link.send_buf(total, put_long);
                    return Ok(());
                }
            }

            self.link.timeouts.escalate_additive(deadline);
        }

        Err(RpcError::DeadlineExpired(deadline))
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
