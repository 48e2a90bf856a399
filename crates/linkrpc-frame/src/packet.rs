use bytes::{Buf, BufMut};

use crate::crc::crc16;
use crate::error::{FrameError, Result};

/// Framing overhead: magic (2) + CRC (2).
pub const PACKET_OVERHEAD: usize = 4;

/// Master announces a command: payload is `cmd:u32 | payload_len:u32`.
pub const COMMAND_HEADER_MAGIC: u16 = 0x1209;
/// Master ships the command payload.
pub const COMMAND_DATA_MAGIC: u16 = 0xABD1;
/// Result length announcement (slave) and result poll (master).
pub const RESULT_HEADER_MAGIC: u16 = 0x9DC2;
/// Result payload (slave) and fetch poll (master).
pub const RESULT_DATA_MAGIC: u16 = 0x4E4D;
/// Stream reader announces its queue depth.
pub const STREAM_OPEN_MAGIC: u16 = 0xEDF6;
/// Stream writer announces the size of the next raw chunk.
pub const STREAM_DATA_MAGIC: u16 = 0x542E;

/// Encode a packet into `dst` and return the framed length.
///
/// Layout: `[magic u16 LE][payload][crc16 u16 LE]`, CRC over magic and
/// payload. Fails only when `dst` cannot hold the frame.
pub fn encode_packet(dst: &mut [u8], magic: u16, data: &[u8]) -> Result<usize> {
    let total = data.len() + PACKET_OVERHEAD;
    if dst.len() < total {
        return Err(FrameError::BufferTooSmall {
            needed: total,
            available: dst.len(),
        });
    }

    let mut head = &mut dst[..total - 2];
    head.put_u16_le(magic);
    head.put_slice(data);

    let crc = crc16(&dst[..total - 2]);
    let mut tail = &mut dst[total - 2..total];
    tail.put_u16_le(crc);

    Ok(total)
}

/// Build an empty (acknowledgement) packet for `magic`.
pub fn empty_packet(magic: u16) -> [u8; PACKET_OVERHEAD] {
    let mut packet = [0u8; PACKET_OVERHEAD];
    let crc = {
        let mut head = &mut packet[..2];
        head.put_u16_le(magic);
        crc16(&packet[..2])
    };
    let mut tail = &mut packet[2..];
    tail.put_u16_le(crc);
    packet
}

/// Validate a received frame: both the magic and the CRC must match.
///
/// Pure and bounded: reads nothing beyond `frame`. A frame shorter than the
/// framing overhead is noise.
pub fn check_packet(frame: &[u8], magic: u16) -> bool {
    if frame.len() < PACKET_OVERHEAD {
        return false;
    }
    let got_magic = (&frame[..2]).get_u16_le();
    let got_crc = (&frame[frame.len() - 2..]).get_u16_le();
    got_magic == magic && got_crc == crc16(&frame[..frame.len() - 2])
}

/// The payload bytes of a validated frame.
pub fn payload(frame: &[u8]) -> &[u8] {
    &frame[2..frame.len() - 2]
}

/// Read a little-endian u32 from the start of `bytes`.
pub fn unpack_u32(bytes: &[u8]) -> u32 {
    (&bytes[..4]).get_u32_le()
}

/// Write `value` little-endian into the start of `bytes`.
pub fn pack_u32(bytes: &mut [u8], value: u32) {
    let mut dst = &mut bytes[..4];
    dst.put_u32_le(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_check_roundtrip() {
        let mut frame = [0u8; 64];
        let n = encode_packet(&mut frame, COMMAND_DATA_MAGIC, b"hello, link!").unwrap();

        assert_eq!(n, 12 + PACKET_OVERHEAD);
        assert!(check_packet(&frame[..n], COMMAND_DATA_MAGIC));
        assert_eq!(payload(&frame[..n]), b"hello, link!");
    }

    #[test]
    fn empty_payload_is_four_bytes() {
        let mut frame = [0u8; PACKET_OVERHEAD];
        let n = encode_packet(&mut frame, RESULT_HEADER_MAGIC, b"").unwrap();

        assert_eq!(n, PACKET_OVERHEAD);
        assert!(check_packet(&frame, RESULT_HEADER_MAGIC));
        assert!(payload(&frame).is_empty());
    }

    #[test]
    fn empty_packet_matches_encode() {
        let mut encoded = [0u8; PACKET_OVERHEAD];
        encode_packet(&mut encoded, COMMAND_HEADER_MAGIC, b"").unwrap();
        assert_eq!(empty_packet(COMMAND_HEADER_MAGIC), encoded);
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut frame = [0u8; 16];
        let n = encode_packet(&mut frame, COMMAND_HEADER_MAGIC, b"abcd").unwrap();
        assert!(!check_packet(&frame[..n], COMMAND_DATA_MAGIC));
    }

    #[test]
    fn any_single_bit_flip_rejected() {
        let mut frame = [0u8; 16];
        let n = encode_packet(&mut frame, STREAM_DATA_MAGIC, &[0xA5, 0x00, 0xFF]).unwrap();

        for byte in 0..n {
            for bit in 0..8u8 {
                let mut corrupted = frame;
                corrupted[byte] ^= 1 << bit;
                assert!(
                    !check_packet(&corrupted[..n], STREAM_DATA_MAGIC),
                    "byte {byte} bit {bit} accepted"
                );
            }
        }
    }

    #[test]
    fn short_frame_is_noise() {
        assert!(!check_packet(&[0x09, 0x12, 0x00], COMMAND_HEADER_MAGIC));
        assert!(!check_packet(&[], COMMAND_HEADER_MAGIC));
    }

    #[test]
    fn encode_rejects_undersized_buffer() {
        let mut frame = [0u8; 7];
        let err = encode_packet(&mut frame, COMMAND_DATA_MAGIC, b"abcd").unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferTooSmall {
                needed: 8,
                available: 7
            }
        ));
    }

    #[test]
    fn u32_helpers_are_little_endian() {
        let mut bytes = [0u8; 4];
        pack_u32(&mut bytes, 0x0403_0201);
        assert_eq!(bytes, [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(unpack_u32(&bytes), 0x0403_0201);
    }
}
