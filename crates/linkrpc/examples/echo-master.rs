//! Minimal echo master — connects to the echo slave and calls it.
//!
//! Run `cargo run --example echo-slave` first, then:
//!   cargo run --example echo-master

use std::os::unix::net::UnixStream;
use std::time::Duration;

use linkrpc::peer::{EndpointConfig, Master};
use linkrpc::transport::StreamLink;

const SOCKET_PATH: &str = "/tmp/linkrpc-echo.sock";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stream = UnixStream::connect(SOCKET_PATH)?;
    stream.set_read_timeout(Some(Duration::from_millis(2)))?;

    let mut master = Master::new(StreamLink::new(stream), EndpointConfig::default());

    let echoed = master.call("echo", b"hello, link")?;
    println!("echo      -> {}", String::from_utf8_lossy(echoed));

    let reversed = master.call("reverse", b"hello, link")?;
    println!("reverse   -> {}", String::from_utf8_lossy(reversed));

    Ok(())
}
