//! Transport abstraction for linkrpc.
//!
//! The protocol runs over any byte-oriented point-to-point link. This crate
//! defines the minimal contract such a link must satisfy — [`Transport`] —
//! plus generic adapters that encode the link-class rules the protocol
//! depends on:
//!
//! - [`StreamLink`] — native byte streams (UART-class, sockets in tests)
//! - [`ChunkedLink`] — half-duplex buses limited to 32-byte chunks (I²C-class)
//! - [`XferLink`] — master-clocked full-duplex buses (SPI-class)
//! - [`FrameLink`] — 8-byte-frame buses (CAN-class)
//!
//! Concrete hardware drivers are out of scope: each adapter is generic over a
//! small bus trait the integrator implements, so tests can substitute a
//! recording stub. The [`Clock`] trait abstracts the monotonic time source
//! for the same reason.

pub mod canbus;
pub mod chunked;
pub mod clock;
pub mod error;
pub mod stream;
pub mod traits;
pub mod xfer;

pub use canbus::{FrameBus, FrameLink, FRAME_SIZE};
pub use chunked::{ChunkedBus, ChunkedLink, CHUNK_SIZE, SETUP_DELAY};
pub use clock::{Clock, SystemClock};
pub use error::{Result, TransportError};
pub use stream::StreamLink;
pub use traits::{all_same, Transport};
pub use xfer::{TransferBus, XferLink};
