//! Two-party tests: a real master and slave joined by a Unix socketpair.

#![cfg(unix)]

use std::os::unix::net::UnixStream;
use std::thread;
use std::time::Duration;

use linkrpc_frame::COMMAND_DATA_MAGIC;
use linkrpc_peer::{CallOptions, EndpointConfig, Master, RpcError, Slave};
use linkrpc_transport::{StreamLink, Transport};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn stream_pair() -> (StreamLink<UnixStream>, StreamLink<UnixStream>) {
    let (a, b) = UnixStream::pair().expect("socketpair should be creatable");
    for stream in [&a, &b] {
        stream
            .set_read_timeout(Some(ms(2)))
            .expect("read timeout should be settable");
    }
    (StreamLink::new(a), StreamLink::new(b))
}

fn config() -> EndpointConfig {
    // Short-timeout baselines sized for a loopback socket under load; long
    // timeouts kept well under the outer deadlines so a missed exchange
    // leaves room to retry.
    EndpointConfig::default()
        .with_short_timeouts(ms(25), ms(25))
        .with_long_timeouts(ms(500), ms(500))
}

fn options() -> CallOptions {
    CallOptions::default()
        .with_send_timeout(ms(5000))
        .with_recv_timeout(ms(5000))
}

#[test]
fn echo_call_roundtrip() {
    let (master_link, slave_link) = stream_pair();

    let slave_thread = thread::spawn(move || {
        let mut slave = Slave::new(slave_link, config());
        slave
            .register_callback("echo", |input, response| {
                response.extend_from_slice(input);
            })
            .expect("registration should succeed");
        slave.poll(ms(5000), ms(5000));
    });

    let mut master = Master::new(master_link, config());
    let result = master
        .call_with("echo", &[0x01, 0x02, 0x03], &options())
        .expect("echo call should complete");
    assert_eq!(result, [0x01, 0x02, 0x03]);

    slave_thread.join().expect("slave thread should finish");
}

#[test]
fn unregistered_command_yields_empty_result() {
    let (master_link, slave_link) = stream_pair();

    let slave_thread = thread::spawn(move || {
        let mut slave = Slave::new(slave_link, config());
        slave
            .register_callback("known", |_input, response| response.push(1))
            .expect("registration should succeed");
        slave.poll(ms(5000), ms(5000));
        slave.poll(ms(5000), ms(5000));
    });

    let mut master = Master::new(master_link, config());

    // The handshake completes; the result is just empty.
    let result = master
        .call_with("missing", b"payload", &options())
        .expect("call should complete");
    assert!(result.is_empty());

    // The strict variant turns the empty result into an error.
    let strict = options().with_fail_on_empty(true);
    let err = master.call_with("missing", b"payload", &strict).unwrap_err();
    assert!(matches!(err, RpcError::EmptyResult));

    slave_thread.join().expect("slave thread should finish");
}

/// Flips one CRC bit in the first COMMAND_DATA packet it sees.
struct CorruptOnce<T> {
    inner: T,
    armed: bool,
}

impl<T: Transport> Transport for CorruptOnce<T> {
    fn get_bytes(&mut self, buf: &mut [u8], timeout: Duration) -> linkrpc_transport::Result<()> {
        self.inner.get_bytes(buf, timeout)
    }

    fn put_bytes(&mut self, data: &[u8], timeout: Duration) -> linkrpc_transport::Result<()> {
        if self.armed && data.len() >= 2 && data[..2] == COMMAND_DATA_MAGIC.to_le_bytes() {
            self.armed = false;
            let mut corrupted = data.to_vec();
            let last = corrupted.len() - 1;
            corrupted[last] ^= 0x01;
            return self.inner.put_bytes(&corrupted, timeout);
        }
        self.inner.put_bytes(data, timeout)
    }

    fn flush(&mut self) {
        self.inner.flush();
    }

    fn half_duplex(&self) -> bool {
        self.inner.half_duplex()
    }
}

#[test]
fn corrupted_payload_is_retried_to_success() {
    let (master_link, slave_link) = stream_pair();
    let corrupting = CorruptOnce {
        inner: master_link,
        armed: true,
    };

    let slave_thread = thread::spawn(move || {
        let mut slave = Slave::new(slave_link, config());
        slave
            .register_callback("echo", |input, response| {
                response.extend_from_slice(input);
            })
            .expect("registration should succeed");
        slave.poll(ms(5000), ms(5000));
    });

    let mut master = Master::new(corrupting, config());
    let result = master
        .call_with("echo", &[0xDE, 0xAD], &options())
        .expect("retry should recover from the bit flip");
    assert_eq!(result, [0xDE, 0xAD]);
    assert!(!master.transport().armed, "the corruption should have fired");

    slave_thread.join().expect("slave thread should finish");
}

#[test]
fn sequential_calls_share_one_link() {
    let (master_link, slave_link) = stream_pair();

    let slave_thread = thread::spawn(move || {
        let mut slave = Slave::new(slave_link, config());
        slave
            .register_callback("double", |input, response| {
                response.extend(input.iter().map(|byte| byte.wrapping_mul(2)));
            })
            .expect("registration should succeed");
        for _ in 0..3 {
            slave.poll(ms(5000), ms(5000));
        }
    });

    let mut master = Master::new(master_link, config());
    for round in 1..=3u8 {
        let result = master
            .call_with("double", &[round], &options())
            .expect("call should complete");
        assert_eq!(result, [round * 2]);
    }

    slave_thread.join().expect("slave thread should finish");
}

#[test]
fn stream_delivers_chunks_under_credit_flow_control() {
    let (master_link, slave_link) = stream_pair();

    let writer_thread = thread::spawn(move || {
        let mut slave = Slave::new(slave_link, config());
        let mut produced = 0u8;
        slave
            .stream_writer(
                move |chunk| {
                    if produced == 5 {
                        return false;
                    }
                    produced += 1;
                    chunk.extend(std::iter::repeat(produced).take(16));
                    true
                },
                ms(1000),
            )
            .expect("writer should end cleanly");
    });

    let mut master = Master::new(master_link, config());
    let mut received: Vec<Vec<u8>> = Vec::new();
    master
        .stream_reader(
            |chunk| {
                received.push(chunk.to_vec());
                received.len() < 5
            },
            4,
            ms(1000),
        )
        .expect("reader should end cleanly");

    writer_thread.join().expect("writer thread should finish");

    assert_eq!(received.len(), 5);
    for (index, chunk) in received.iter().enumerate() {
        assert_eq!(chunk, &vec![index as u8 + 1; 16], "chunk {index}");
    }
}

#[test]
fn silent_peer_expires_the_deadline() {
    let (master_link, _slave_link) = stream_pair();

    let mut master = Master::new(master_link, config());
    let err = master.put_command(42, b"nobody home", ms(200)).unwrap_err();
    assert!(matches!(err, RpcError::DeadlineExpired(_)));
}
