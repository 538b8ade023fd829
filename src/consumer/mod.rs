//! Consumers of a session's streams.
//!
//! Setup hands the open [`StreamPair`] to a [`StreamConsumer`]; the consumer
//! owns the session until it returns. It must return once the input reports
//! end of stream, which happens after the [`ShutdownSignal`] fires.

mod samples;
mod text;

pub use samples::{SampleDecoder, SampleWindow};
pub use text::TextPlotter;

use crate::error::AppResult;
use crate::port::{OutByteStream, StreamPair};
use crate::shutdown::ShutdownSignal;
use std::io::Write;
use tracing::{debug, info};

/// What a consumer did with a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub bytes_read: u64,
    pub samples: u64,
}

/// Something that reads (and optionally writes) a session's streams.
pub trait StreamConsumer: Send {
    fn consume(
        &mut self,
        streams: &mut StreamPair,
        shutdown: &ShutdownSignal,
    ) -> AppResult<ConsumeSummary>;
}

/// Write the optional start command and flush it to the device.
pub(crate) fn send_start_command(output: &mut OutByteStream, command: Option<&[u8]>) -> AppResult<()> {
    let Some(bytes) = command else {
        return Ok(());
    };
    output.write_all(bytes)?;
    output.flush()?;
    info!(bytes = bytes.len(), "Start command sent");
    debug!(command = %String::from_utf8_lossy(bytes).escape_debug(), "Start command");
    Ok(())
}
