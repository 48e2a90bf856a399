//! Master and slave endpoints for linkrpc.
//!
//! A call is one master-initiated round-trip over the link: a four-phase
//! command handshake followed by a four-phase result handshake. Each phase
//! pairs a payload-carrying packet with an empty acknowledgement of the same
//! magic. Per-attempt misses (framing errors, short-timeout expiry) are
//! absorbed by a retry loop with adaptive timeout escalation; only terminal
//! conditions — deadline expiry, buffer exhaustion — surface as errors.
//!
//! On top of a negotiated call, either side can switch the link into a
//! unidirectional streaming mode with credit-based flow control ([`stream`]).

pub mod config;
pub mod error;
mod link;
pub mod master;
pub mod registry;
pub mod retry;
pub mod slave;
pub mod stream;

pub use config::{CallOptions, EndpointConfig};
pub use error::{Result, RpcError};
pub use master::Master;
pub use registry::{Callback, CallbackRegistry};
pub use retry::RetryTimeouts;
pub use slave::Slave;
pub use stream::{advance_lfsr, LFSR_SEED, STREAM_CONTROL_TIMEOUT};
