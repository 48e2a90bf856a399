use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TransportError};
use crate::traits::{all_same, Transport};

/// Largest transfer a chunked bus moves in one operation.
pub const CHUNK_SIZE: usize = 32;

/// Delay before each chunk so the peer can prepare its side of the transfer.
pub const SETUP_DELAY: Duration = Duration::from_micros(100);

/// A half-duplex bus limited to [`CHUNK_SIZE`]-byte transfers (I²C-class).
///
/// `stop` is asserted only on the final chunk of an operation, releasing the
/// bus for the peer.
pub trait ChunkedBus {
    /// Bring the bus up before a burst of chunks.
    fn activate(&mut self) -> Result<()>;

    /// Read exactly `buf.len()` bytes (at most [`CHUNK_SIZE`]).
    fn read_chunk(&mut self, buf: &mut [u8], stop: bool) -> Result<()>;

    /// Write all of `data` (at most [`CHUNK_SIZE`] bytes).
    fn write_chunk(&mut self, data: &[u8], stop: bool) -> Result<()>;

    /// Release the bus after a burst.
    fn deactivate(&mut self);

    /// Discard any input the bus has buffered.
    fn drain(&mut self);
}

/// Chunked half-duplex link adapter.
///
/// The bus is brought up and down around every call so a wedged peer cannot
/// hold the line between transfers. Reads apply the uniform-buffer silence
/// heuristic. The caller's timeout is advisory; success is per chunk.
pub struct ChunkedLink<B, C = SystemClock> {
    bus: B,
    clock: C,
}

impl<B: ChunkedBus> ChunkedLink<B> {
    /// Create a link over `bus` with the process clock.
    pub fn new(bus: B) -> Self {
        Self::with_clock(bus, SystemClock)
    }
}

impl<B: ChunkedBus, C: Clock> ChunkedLink<B, C> {
    /// Create a link over `bus` with an explicit clock.
    pub fn with_clock(bus: B, clock: C) -> Self {
        Self { bus, clock }
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

    fn read_chunks(&mut self, buf: &mut [u8]) -> Result<()> {
        let total = buf.len();
        let mut offset = 0;
        while offset < total {
            let remaining = total - offset;
            let take = remaining.min(CHUNK_SIZE);
            self.clock.sleep(SETUP_DELAY);
            self.bus
                .read_chunk(&mut buf[offset..offset + take], remaining <= CHUNK_SIZE)?;
            offset += take;
        }
        Ok(())
    }

    fn write_chunks(&mut self, data: &[u8]) -> Result<()> {
        let total = data.len();
        let mut offset = 0;
        while offset < total {
            let remaining = total - offset;
            let take = remaining.min(CHUNK_SIZE);
            self.clock.sleep(SETUP_DELAY);
            self.bus
                .write_chunk(&data[offset..offset + take], remaining <= CHUNK_SIZE)?;
            offset += take;
        }
        Ok(())
    }
}

impl<B: ChunkedBus, C: Clock> Transport for ChunkedLink<B, C> {
    fn get_bytes(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<()> {
        self.bus.activate()?;
        let read = self.read_chunks(buf);
        self.bus.deactivate();
        read?;

        if all_same(buf) {
            return Err(TransportError::Silence);
        }
        Ok(())
    }

    fn put_bytes(&mut self, data: &[u8], _timeout: Duration) -> Result<()> {
        self.bus.activate()?;
        let wrote = self.write_chunks(data);
        self.bus.deactivate();
        wrote
    }

    fn flush(&mut self) {
        self.bus.drain();
    }

    fn half_duplex(&self) -> bool {
        true
    }
}
