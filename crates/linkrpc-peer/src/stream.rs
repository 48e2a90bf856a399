//! Credit-based unidirectional streaming.
//!
//! Once a call has armed streaming (typically from inside a slave callback),
//! one side becomes the writer and the other the reader. The reader opens
//! with its queue depth; the writer spends one credit per chunk and earns
//! one back for every credit token the reader returns. Tokens walk an 8-bit
//! Galois LFSR, so a stray byte on the line terminates the stream instead
//! of corrupting its flow control.
//!
//! Control packets (open, chunk headers, credit tokens) use a fixed budget;
//! chunk payloads use the caller's timeout. Either callback returns `false`
//! to end the stream cleanly; everything else ends it with the error that
//! tore it down.

use std::time::Duration;

use linkrpc_frame::{
    check_packet, encode_packet, pack_u32, payload, unpack_u32, PACKET_OVERHEAD,
    STREAM_DATA_MAGIC, STREAM_OPEN_MAGIC,
};
use linkrpc_transport::{Clock, Transport};
use tracing::trace;

use crate::error::{Result, RpcError};
use crate::link::Link;

/// Budget for stream control packets.
pub const STREAM_CONTROL_TIMEOUT: Duration = Duration::from_millis(1000);

/// Initial value of the credit-token LFSR on both sides.
pub const LFSR_SEED: u8 = 0xFF;

/// Advance the 8-bit Galois credit-token LFSR.
pub fn advance_lfsr(lfsr: u8) -> u8 {
    (lfsr >> 1) ^ if lfsr & 1 != 0 { 0xB8 } else { 0x00 }
}

const OPEN_PACKET_LEN: usize = 4 + PACKET_OVERHEAD;

impl<T: Transport, C: Clock> Link<T, C> {
    pub(crate) fn stream_reader(
        &mut self,
        mut on_chunk: impl FnMut(&[u8]) -> bool,
        queue_depth: u32,
        read_timeout: Duration,
    ) -> Result<()> {
        let mut packet = [0u8; OPEN_PACKET_LEN];
        let mut depth_bytes = [0u8; 4];
        pack_u32(&mut depth_bytes, queue_depth);
        encode_packet(&mut packet, STREAM_OPEN_MAGIC, &depth_bytes)?;
        self.transport.put_bytes(&packet, STREAM_CONTROL_TIMEOUT)?;

        let mut tx_lfsr = LFSR_SEED;

        loop {
            self.transport.get_bytes(&mut packet, STREAM_CONTROL_TIMEOUT)?;
            if !check_packet(&packet, STREAM_DATA_MAGIC) {
                return Err(RpcError::StreamFrame);
            }

            let size = unpack_u32(payload(&packet)) as usize;
            if self.buf.len() < size {
                return Err(RpcError::BufferExhausted {
                    needed: size,
                    capacity: self.buf.len(),
                });
            }

            self.transport.get_bytes(&mut self.buf[..size], read_timeout)?;
            if !on_chunk(&self.buf[..size]) {
                return Ok(());
            }

            self.transport.put_bytes(&[tx_lfsr], STREAM_CONTROL_TIMEOUT)?;
            tx_lfsr = advance_lfsr(tx_lfsr);
        }
    }

    pub(crate) fn stream_writer(
        &mut self,
        mut next_chunk: impl FnMut(&mut Vec<u8>) -> bool,
        write_timeout: Duration,
    ) -> Result<()> {
        let mut packet = [0u8; OPEN_PACKET_LEN];
        self.transport.get_bytes(&mut packet, STREAM_CONTROL_TIMEOUT)?;
        if !check_packet(&packet, STREAM_OPEN_MAGIC) {
            return Err(RpcError::StreamFrame);
        }

        let requested = unpack_u32(payload(&packet));
        let queue_depth = requested.min(self.stream_queue_depth_max).max(1);
        trace!(requested, queue_depth, "stream opened");

        let mut credits = queue_depth;
        let mut rx_lfsr = LFSR_SEED;
        let mut chunk = Vec::new();

        loop {
            // Below half depth the writer stops and waits for a credit.
            if credits <= queue_depth / 2 {
                let mut token = [0u8; 1];
                self.transport.get_bytes(&mut token, STREAM_CONTROL_TIMEOUT)?;
                if token[0] != rx_lfsr {
                    return Err(RpcError::CreditMismatch);
                }
                rx_lfsr = advance_lfsr(rx_lfsr);
                credits += 1;
            }

            if credits > 0 {
                chunk.clear();
                if !next_chunk(&mut chunk) {
                    return Ok(());
                }

                let mut header = [0u8; OPEN_PACKET_LEN];
                let mut len_bytes = [0u8; 4];
                pack_u32(&mut len_bytes, chunk.len() as u32);
                encode_packet(&mut header, STREAM_DATA_MAGIC, &len_bytes)?;
                self.transport.put_bytes(&header, STREAM_CONTROL_TIMEOUT)?;
                self.transport.put_bytes(&chunk, write_timeout)?;
                credits -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use linkrpc_transport::{SystemClock, Transport, TransportError};

    use super::*;
    use crate::config::EndpointConfig;

    const RW: Duration = Duration::from_millis(100);

    #[derive(Default)]
    struct ScriptedPeer {
        incoming: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
        half_duplex: bool,
    }

    impl ScriptedPeer {
        fn queue_open(&mut self, depth: u32) {
            let mut depth_bytes = [0u8; 4];
            pack_u32(&mut depth_bytes, depth);
            let mut packet = [0u8; OPEN_PACKET_LEN];
            encode_packet(&mut packet, STREAM_OPEN_MAGIC, &depth_bytes).unwrap();
            self.incoming.push_back(packet.to_vec());
        }

        fn queue_chunk(&mut self, data: &[u8]) {
            let mut len_bytes = [0u8; 4];
            pack_u32(&mut len_bytes, data.len() as u32);
            let mut header = [0u8; OPEN_PACKET_LEN];
            encode_packet(&mut header, STREAM_DATA_MAGIC, &len_bytes).unwrap();
            self.incoming.push_back(header.to_vec());
            self.incoming.push_back(data.to_vec());
        }
    }

    impl Transport for ScriptedPeer {
        fn get_bytes(
            &mut self,
            buf: &mut [u8],
            timeout: Duration,
        ) -> linkrpc_transport::Result<()> {
            match self.incoming.pop_front() {
                Some(chunk) => {
                    assert_eq!(chunk.len(), buf.len(), "script out of sync");
                    buf.copy_from_slice(&chunk);
                    Ok(())
                }
                None => Err(TransportError::Timeout(timeout)),
            }
        }

        fn put_bytes(&mut self, data: &[u8], _timeout: Duration) -> linkrpc_transport::Result<()> {
            self.sent.push(data.to_vec());
            Ok(())
        }

        fn flush(&mut self) {}

        fn half_duplex(&self) -> bool {
            self.half_duplex
        }
    }

    fn make_link(peer: ScriptedPeer) -> Link<ScriptedPeer, SystemClock> {
        Link::new(peer, SystemClock, &EndpointConfig::default())
    }

    #[test]
    fn lfsr_walks_the_reference_sequence() {
        let mut lfsr = LFSR_SEED;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..127 {
            assert!(seen.insert(lfsr), "lfsr repeated early at {lfsr:#04x}");
            lfsr = advance_lfsr(lfsr);
        }
        assert_eq!(advance_lfsr(0xFF), 0xB8 ^ 0x7F);
    }

    #[test]
    fn writer_spends_initial_credits_then_blocks() {
        let mut peer = ScriptedPeer::default();
        peer.queue_open(4);
        // No credit tokens scripted: the writer must stop at half depth.
        let mut link = make_link(peer);

        let mut produced = 0u32;
        let err = link
            .stream_writer(
                |chunk| {
                    produced += 1;
                    chunk.extend_from_slice(&produced.to_le_bytes());
                    true
                },
                RW,
            )
            .unwrap_err();

        // Two chunks spent credits 4 -> 2; the third needs a token.
        assert!(matches!(err, RpcError::Transport(TransportError::Timeout(_))));
        assert_eq!(produced, 2);
        // header + payload per chunk.
        assert_eq!(link.transport.sent.len(), 4);
    }

    #[test]
    fn writer_resumes_on_matching_credit_token() {
        let mut peer = ScriptedPeer::default();
        peer.queue_open(4);
        peer.incoming.push_back(vec![LFSR_SEED]);
        let mut link = make_link(peer);

        let mut produced = 0u32;
        let err = link
            .stream_writer(
                |chunk| {
                    produced += 1;
                    chunk.push(produced as u8);
                    true
                },
                RW,
            )
            .unwrap_err();

        assert!(matches!(err, RpcError::Transport(TransportError::Timeout(_))));
        // The token unblocked exactly one more chunk.
        assert_eq!(produced, 3);
    }

    #[test]
    fn writer_terminates_on_wrong_credit_token() {
        let mut peer = ScriptedPeer::default();
        peer.queue_open(2);
        peer.incoming.push_back(vec![0x00]);
        let mut link = make_link(peer);

        let err = link
            .stream_writer(
                |chunk| {
                    chunk.push(0xEE);
                    true
                },
                RW,
            )
            .unwrap_err();

        assert!(matches!(err, RpcError::CreditMismatch));
    }

    #[test]
    fn writer_clamps_depth_to_one_on_half_duplex_links() {
        let mut peer = ScriptedPeer::default();
        peer.half_duplex = true;
        peer.queue_open(8);
        let mut link = make_link(peer);
        assert_eq!(link.stream_queue_depth_max, 1);

        let err = link
            .stream_writer(
                |chunk| {
                    chunk.push(1);
                    true
                },
                RW,
            )
            .unwrap_err();

        // Depth 1: credits(1) <= depth/2(0) is false, one send drops credits
        // to 0, then the writer waits for a token before the second chunk.
        assert!(matches!(err, RpcError::Transport(TransportError::Timeout(_))));
        assert_eq!(link.transport.sent.len(), 2);
    }

    #[test]
    fn writer_requires_a_valid_open_packet() {
        let mut peer = ScriptedPeer::default();
        let mut bogus = [0u8; OPEN_PACKET_LEN];
        encode_packet(&mut bogus, STREAM_DATA_MAGIC, &[4, 0, 0, 0]).unwrap();
        peer.incoming.push_back(bogus.to_vec());
        let mut link = make_link(peer);

        let err = link.stream_writer(|_chunk| true, RW).unwrap_err();
        assert!(matches!(err, RpcError::StreamFrame));
    }

    #[test]
    fn writer_ends_cleanly_when_producer_stops() {
        let mut peer = ScriptedPeer::default();
        peer.queue_open(8);
        let mut link = make_link(peer);

        let mut left = 2;
        link.stream_writer(
            |chunk| {
                if left == 0 {
                    return false;
                }
                left -= 1;
                chunk.push(left);
                true
            },
            RW,
        )
        .unwrap();

        assert_eq!(link.transport.sent.len(), 4);
    }

    #[test]
    fn reader_opens_consumes_and_returns_credits() {
        let mut peer = ScriptedPeer::default();
        peer.queue_chunk(b"first");
        peer.queue_chunk(b"second");
        let mut link = make_link(peer);

        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let err = link
            .stream_reader(
                |chunk| {
                    chunks.push(chunk.to_vec());
                    true
                },
                4,
                RW,
            )
            .unwrap_err();

        assert!(matches!(err, RpcError::Transport(TransportError::Timeout(_))));
        assert_eq!(chunks, vec![b"first".to_vec(), b"second".to_vec()]);

        let sent = &link.transport.sent;
        // Open packet, then one credit token per chunk.
        let mut expected_open = [0u8; OPEN_PACKET_LEN];
        encode_packet(&mut expected_open, STREAM_OPEN_MAGIC, &[4, 0, 0, 0]).unwrap();
        assert_eq!(sent[0], expected_open);
        assert_eq!(sent[1], vec![LFSR_SEED]);
        assert_eq!(sent[2], vec![advance_lfsr(LFSR_SEED)]);
    }

    #[test]
    fn reader_rejects_oversized_chunk_announcement() {
        let mut peer = ScriptedPeer::default();
        let mut len_bytes = [0u8; 4];
        pack_u32(&mut len_bytes, 4096);
        let mut header = [0u8; OPEN_PACKET_LEN];
        encode_packet(&mut header, STREAM_DATA_MAGIC, &len_bytes).unwrap();
        peer.incoming.push_back(header.to_vec());
        let mut link = make_link(peer);

        let err = link.stream_reader(|_chunk| true, 4, RW).unwrap_err();
        assert!(matches!(
            err,
            RpcError::BufferExhausted { needed: 4096, .. }
        ));
    }

    #[test]
    fn reader_terminates_on_corrupt_chunk_header() {
        let mut peer = ScriptedPeer::default();
        let mut len_bytes = [0u8; 4];
        pack_u32(&mut len_bytes, 8);
        let mut header = [0u8; OPEN_PACKET_LEN];
        encode_packet(&mut header, STREAM_DATA_MAGIC, &len_bytes).unwrap();
        // Valid CRC but flipped magic: either mismatch alone must end the
        // stream.
        header[0] ^= 0xFF;
        peer.incoming.push_back(header.to_vec());
        let mut link = make_link(peer);

        let err = link.stream_reader(|_chunk| true, 4, RW).unwrap_err();
        assert!(matches!(err, RpcError::StreamFrame));
    }

    #[test]
    fn reader_ends_cleanly_when_consumer_stops() {
        let mut peer = ScriptedPeer::default();
        peer.queue_chunk(b"only");
        let mut link = make_link(peer);

        link.stream_reader(|_chunk| false, 4, RW).unwrap();
        // Open packet went out; the unconsumed chunk earned no credit.
        assert_eq!(link.transport.sent.len(), 1);
    }
}
