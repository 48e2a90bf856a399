/// Errors that can occur while encoding packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The destination buffer cannot hold the framed packet.
    #[error("packet buffer too small ({needed} bytes needed, {available} available)")]
    BufferTooSmall { needed: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
