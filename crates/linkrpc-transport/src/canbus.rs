use std::collections::VecDeque;
use std::time::Duration;

use tracing::trace;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Payload capacity of one bus frame.
pub const FRAME_SIZE: usize = 8;

/// A frame bus moving at most [`FRAME_SIZE`] bytes per message (CAN-class).
///
/// The concrete driver owns the message-ID filter; this adapter only sees
/// the frames that pass it.
pub trait FrameBus {
    /// Receive one pending frame into `buf`, returning its length, or
    /// `None` when nothing is buffered.
    fn try_recv(&mut self, buf: &mut [u8; FRAME_SIZE]) -> Option<usize>;

    /// Send one frame of at most [`FRAME_SIZE`] bytes.
    fn send(&mut self, data: &[u8]) -> Result<()>;
}

/// Frame bus link adapter.
///
/// Reads drain the bus parser into an internal byte queue so packet
/// boundaries of the protocol need not align with frame boundaries; writes
/// chunk into frames of at most [`FRAME_SIZE`] bytes.
pub struct FrameLink<B, C = SystemClock> {
    bus: B,
    clock: C,
    pending: VecDeque<u8>,
}

impl<B: FrameBus> FrameLink<B> {
    /// Create a link over `bus` with the process clock.
    pub fn new(bus: B) -> Self {
        Self::with_clock(bus, SystemClock)
    }
}

impl<B: FrameBus, C: Clock> FrameLink<B, C> {
    /// Create a link over `bus` with an explicit clock.
    pub fn with_clock(bus: B, clock: C) -> Self {
        Self {
            bus,
            clock,
            pending: VecDeque::with_capacity(FRAME_SIZE * 4),
        }
    }

    /// Borrow the underlying bus.
    pub fn get_ref(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying bus.
    pub fn get_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the link and return the inner bus.
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: FrameBus, C: Clock> Transport for FrameLink<B, C> {
    fn get_bytes(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
        let deadline = self.clock.now() + timeout;
        let mut filled = 0;

        loop {
            while filled < buf.len() {
                match self.pending.pop_front() {
                    Some(byte) => {
                        buf[filled] = byte;
                        filled += 1;
                    }
                    None => break,
                }
            }
            if filled == buf.len() {
                return Ok(());
            }

            let mut frame = [0u8; FRAME_SIZE];
            match self.bus.try_recv(&mut frame) {
                Some(n) => self.pending.extend(&frame[..n]),
                None => {
                    if self.clock.now() >= deadline {
                        return Err(TransportError::Timeout(timeout));
                    }
                }
            }
        }
    }

    fn put_bytes(&mut self, data: &[u8], timeout: Duration) -> Result<()> {
        let deadline = self.clock.now() + timeout;
        let mut sent = 0;

        while sent < data.len() {
            if self.clock.now() >= deadline {
                return Err(TransportError::Timeout(timeout));
            }
            let take = (data.len() - sent).min(FRAME_SIZE);
            match self.bus.send(&data[sent..sent + take]) {
                Ok(()) => sent += take,
                // Arbitration loss or a full mailbox; retry within the deadline.
                Err(err) => trace!(%err, "frame send failed, retrying"),
            }
        }

        Ok(())
    }

    fn flush(&mut self) {
        self.pending.clear();
        let mut frame = [0u8; FRAME_SIZE];
        while self.bus.try_recv(&mut frame).is_some() {}
    }
}
