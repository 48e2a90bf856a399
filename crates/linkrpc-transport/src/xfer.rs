use std::time::Duration;

use crate::chunked::SETUP_DELAY;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TransportError};
use crate::traits::{all_same, Transport};

/// A master-clocked full-duplex bus (SPI-class).
pub trait TransferBus {
    /// Clock one transfer: `buf` is shifted out and simultaneously
    /// overwritten with the bytes clocked back in.
    fn transfer(&mut self, buf: &mut [u8]) -> Result<()>;
}

/// Full-duplex transfer link adapter.
///
/// Receiving means clocking out zeroes and keeping what comes back; a peer
/// that is not driving the line clocks back a uniform buffer, which reads
/// report as [`TransportError::Silence`]. There is no receive queue to
/// flush. The caller's timeout is advisory.
pub struct XferLink<B, C = SystemClock> {
    bus: B,
    clock: C,
    scratch: Vec<u8>,
}

impl<B: TransferBus> XferLink<B> {
    /// Create a link over `bus` with the process clock.
    pub fn new(bus: B) -> Self {
        Self::with_clock(bus, SystemClock)
    }
}

impl<B: TransferBus, C: Clock> XferLink<B, C> {
    /// Create a link over `bus` with an explicit clock.
    pub fn with_clock(bus: B, clock: C) -> Self {
        Self {
            bus,
            clock,
            scratch: Vec::new(),
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

impl<B: TransferBus, C: Clock> Transport for XferLink<B, C> {
    fn get_bytes(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<()> {
        self.clock.sleep(SETUP_DELAY);
        buf.fill(0);
        self.bus.transfer(buf)?;

        if all_same(buf) {
            return Err(TransportError::Silence);
        }
        Ok(())
    }

    fn put_bytes(&mut self, data: &[u8], _timeout: Duration) -> Result<()> {
        self.clock.sleep(SETUP_DELAY);
        self.scratch.clear();
        self.scratch.extend_from_slice(data);
        self.bus.transfer(&mut self.scratch)
    }

    fn flush(&mut self) {}

    fn half_duplex(&self) -> bool {
        true
    }
}
