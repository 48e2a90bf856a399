use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Byte-stream link over any `Read + Write` pair (UART-class).
///
/// Works with serial ports, pipes and sockets. The underlying stream should
/// be configured with a short read timeout (or non-blocking mode) so that
/// `WouldBlock`/`TimedOut` surfaces and the deadline loop can make progress;
/// a fully blocking stream turns the protocol timeouts into lower bounds.
pub struct StreamLink<S, C = SystemClock> {
    stream: S,
    clock: C,
    char_timeout: Option<Duration>,
}

impl<S: Read + Write> StreamLink<S> {
    /// Create a link over `stream` with the process clock.
    pub fn new(stream: S) -> Self {
        Self::with_clock(stream, SystemClock)
    }
}

impl<S: Read + Write, C: Clock> StreamLink<S, C> {
    /// Create a link over `stream` with an explicit clock.
    pub fn with_clock(stream: S, clock: C) -> Self {
        Self {
            stream,
            clock,
            char_timeout: None,
        }
    }

    /// Switch reads to a rolling per-character timeout.
    ///
    /// Bit-banged serial links cannot honour a whole-transfer budget; they
    /// time out when the gap between two characters exceeds `timeout`
    /// (typically 2 ms), regardless of the caller's budget.
    pub fn with_char_timeout(mut self, timeout: Duration) -> Self {
        self.char_timeout = Some(timeout);
        self
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the link and return the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn get_bytes_deadline(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        let deadline = self.clock.now() + timeout;
        let mut filled = 0;

        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    if self.clock.now() >= deadline {
                        return Err(TransportError::Timeout(timeout));
                    }
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        Ok(())
    }

    fn get_bytes_per_char(&mut self, buf: &mut [u8], per_char: Duration) -> Result<()> {
        let mut filled = 0;
        let mut last = self.clock.now();

        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => {
                    filled += n;
                    last = self.clock.now();
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    if self.clock.now().duration_since(last) > per_char {
                        return Err(TransportError::Timeout(per_char));
                    }
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        Ok(())
    }
}

impl<S: Read + Write, C: Clock> Transport for StreamLink<S, C> {
    fn get_bytes(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        match self.char_timeout {
            Some(per_char) => self.get_bytes_per_char(buf, per_char),
            None => self.get_bytes_deadline(buf, timeout),
        }
    }

    fn put_bytes(&mut self, data: &[u8], timeout: Duration) -> Result<()> {
        let deadline = self.clock.now() + timeout;
        let mut sent = 0;

        while sent < data.len() {
            match self.stream.write(&data[sent..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => sent += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    if self.clock.now() >= deadline {
                        return Err(TransportError::Timeout(timeout));
                    }
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.stream.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn flush(&mut self) {
        let mut scratch = [0u8; 64];
        loop {
            match self.stream.read(&mut scratch) {
                Ok(0) => break,
                Ok(n) => trace!(discarded = n, "drained pending input"),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }
}
