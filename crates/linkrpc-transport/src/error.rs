use std::time::Duration;

/// Errors that can occur on a point-to-point link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transfer did not complete within its budget.
    #[error("transfer timed out after {0:?}")]
    Timeout(Duration),

    /// The receive buffer came back uniform — the peer is silent or the bus
    /// is held.
    #[error("link silent (uniform receive buffer)")]
    Silence,

    /// The link closed underneath the transfer.
    #[error("link disconnected")]
    Disconnected,

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
