use std::time::Duration;

/// Errors surfaced by endpoint operations.
///
/// Recoverable protocol misses (framing errors, per-attempt timeouts) never
/// appear here; the retry loops absorb them. An `Err` means the current call
/// or stream is over.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The outer deadline elapsed without a completed handshake.
    #[error("deadline expired after {0:?}")]
    DeadlineExpired(Duration),

    /// A payload (outgoing or announced by the peer) cannot fit the
    /// endpoint buffer.
    #[error("payload too large for endpoint buffer ({needed} bytes, capacity {capacity})")]
    BufferExhausted { needed: usize, capacity: usize },

    /// The call completed but returned no data and the caller asked to
    /// treat that as failure.
    #[error("call completed with an empty result")]
    EmptyResult,

    /// The dispatch registry is full and the name is not already registered.
    #[error("dispatch registry full (capacity {0})")]
    RegistryFull(usize),

    /// A stream control packet failed magic or CRC validation.
    #[error("stream packet failed validation")]
    StreamFrame,

    /// A returned stream credit did not match the expected token.
    #[error("stream credit token mismatch")]
    CreditMismatch,

    /// Frame encoding error.
    #[error("frame error: {0}")]
    Frame(#[from] linkrpc_frame::FrameError),

    /// Transport-level error (streams only; call handshakes retry instead).
    #[error("transport error: {0}")]
    Transport(#[from] linkrpc_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, RpcError>;
