use std::time::Duration;

use crate::error::Result;

/// A byte-oriented point-to-point link.
///
/// `get_bytes` succeeds only when it fills `buf` completely; `put_bytes`
/// only when all of `data` was sent. `flush` discards any input the link has
/// buffered, so a handshake attempt starts from a clean line.
///
/// For half-duplex buses the timeout argument is advisory: the bus cannot
/// honour an absolute deadline mid-transfer, so success is determined per
/// chunk instead.
pub trait Transport {
    /// Fill `buf` completely, blocking up to `timeout`.
    fn get_bytes(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()>;

    /// Send all of `data`, blocking up to `timeout`.
    fn put_bytes(&mut self, data: &[u8], timeout: Duration) -> Result<()>;

    /// Discard pending input.
    fn flush(&mut self);

    /// Whether the link is half-duplex.
    ///
    /// Half-duplex links cannot interleave stream credits with data, so the
    /// endpoint clamps the stream writer queue depth to 1 when this is true.
    fn half_duplex(&self) -> bool {
        false
    }
}

/// True when every byte of `data` is equal.
///
/// Used by master-clocked buses as a silence heuristic: a peer that is not
/// driving the line clocks back a uniform buffer. An empty slice is not
/// uniform.
pub fn all_same(data: &[u8]) -> bool {
    match data.split_first() {
        Some((first, rest)) => rest.iter().all(|byte| byte == first),
        None => false,
    }
}
