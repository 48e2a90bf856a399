//! Packet framing, CRC-16 and command hashing for linkrpc.
//!
//! This is the wire layer shared by both endpoints. Every packet is framed
//! with:
//! - A 2-byte little-endian magic value identifying the handshake phase
//! - The payload bytes
//! - A 2-byte little-endian CRC-16 over magic and payload
//!
//! Acknowledgement packets reuse the phase's magic with an empty payload,
//! so they are exactly 4 bytes on the wire.

pub mod crc;
pub mod error;
pub mod hash;
pub mod packet;

pub use crc::crc16;
pub use error::{FrameError, Result};
pub use hash::{hash_bytes, hash_name};
pub use packet::{
    check_packet, empty_packet, encode_packet, pack_u32, payload, unpack_u32,
    COMMAND_DATA_MAGIC, COMMAND_HEADER_MAGIC, PACKET_OVERHEAD, RESULT_DATA_MAGIC,
    RESULT_HEADER_MAGIC, STREAM_DATA_MAGIC, STREAM_OPEN_MAGIC,
};
