//! Minimal echo slave — serves one master connection forever.
//!
//! Run with:
//!   cargo run --example echo-slave
//!
//! In another terminal:
//!   cargo run --example echo-master

use std::fs;
use std::os::unix::net::UnixListener;
use std::time::Duration;

use linkrpc::peer::{EndpointConfig, Slave};
use linkrpc::transport::StreamLink;

const SOCKET_PATH: &str = "/tmp/linkrpc-echo.sock";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Ensure no stale socket
    let _ = fs::remove_file(SOCKET_PATH);

    let listener = UnixListener::bind(SOCKET_PATH)?;
    eprintln!("Listening on {SOCKET_PATH}");

    let (stream, _addr) = listener.accept()?;
    stream.set_read_timeout(Some(Duration::from_millis(2)))?;
    eprintln!("Master connected");

    let mut slave = Slave::new(StreamLink::new(stream), EndpointConfig::default());
    slave.register_callback("echo", |input, response| {
        eprintln!("echo: {} bytes", input.len());
        response.extend_from_slice(input);
    })?;
    slave.register_callback("reverse", |input, response| {
        response.extend(input.iter().rev());
    })?;

    slave.run(Duration::from_secs(5), Duration::from_secs(5));
}
