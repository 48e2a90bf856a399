//! Bidirectional RPC for constrained point-to-point links.
//!
//! linkrpc lets a master invoke named procedures on a slave over any
//! byte-oriented link — UART, SPI, I²C, CAN or a socket in tests — ship an
//! opaque payload and retrieve an opaque result. Every packet is CRC-framed;
//! each handshake phase retries with adaptive timeout escalation, so a noisy
//! line degrades into latency instead of failure. A negotiated call can also
//! switch the link into a credit-flow-controlled streaming mode for bulk
//! data.
//!
//! # Crate Structure
//!
//! - [`frame`] — packet codec, CRC-16 and command-name hashing
//! - [`transport`] — the byte-link contract plus link-class adapters
//! - [`peer`] — master and slave endpoints, dispatch registry, streaming
//!
//! # Example
//!
//! ```no_run
//! use std::os::unix::net::UnixStream;
//! use std::time::Duration;
//!
//! use linkrpc::peer::{EndpointConfig, Master, Slave};
//! use linkrpc::transport::StreamLink;
//!
//! let (master_io, slave_io) = UnixStream::pair()?;
//! master_io.set_read_timeout(Some(Duration::from_millis(2)))?;
//! slave_io.set_read_timeout(Some(Duration::from_millis(2)))?;
//!
//! std::thread::spawn(move || {
//!     let mut slave = Slave::new(StreamLink::new(slave_io), EndpointConfig::default());
//!     slave
//!         .register_callback("echo", |input, response| {
//!             response.extend_from_slice(input);
//!         })
//!         .unwrap();
//!     slave.run(Duration::from_secs(5), Duration::from_secs(5));
//! });
//!
//! let mut master = Master::new(StreamLink::new(master_io), EndpointConfig::default());
//! let result = master.call("echo", b"hello")?;
//! assert_eq!(result, b"hello");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export frame types.
pub mod frame {
    pub use linkrpc_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use linkrpc_transport::*;
}

/// Re-export endpoint types.
pub mod peer {
    pub use linkrpc_peer::*;
}
