//! Port abstraction layer for serial communication.
//!
//! Provides the adapter trait with a `serialport`-backed implementation and a
//! mock, the line configurator, and the blocking stream factory.

pub mod configure;
pub mod error;
pub mod mock;
pub mod stream;
pub mod sync_port;
pub mod traits;

pub use configure::configure;
pub use error::PortError;
pub use mock::{ConfigCall, MockOpener, MockSerialPort};
pub use stream::{
    open_input, open_output, open_stream, ByteStream, InByteStream, OutByteStream,
    StreamDirection, StreamMode, StreamPair,
};
pub use sync_port::{list_ports, NativeOpener, PortSummary, SyncSerialPort};
pub use traits::*;
