//! Line-oriented plotter: one horizontal bar per sample.

use super::{send_start_command, ConsumeSummary, SampleDecoder, SampleWindow, StreamConsumer};
use crate::config::{PlotConfig, SampleFormat};
use crate::error::AppResult;
use crate::port::StreamPair;
use crate::shutdown::ShutdownSignal;
use std::io::{self, Read, Write};
use tracing::{debug, info};

const READ_CHUNK: usize = 256;

/// Prints each sample as a bar scaled to the recent history.
#[derive(Debug)]
pub struct TextPlotter<W> {
    out: W,
    decoder: SampleDecoder,
    window: SampleWindow,
    bar_width: usize,
    limit: Option<u64>,
    start_command: Option<Vec<u8>>,
}

impl<W: Write + Send> TextPlotter<W> {
    pub fn new(out: W, format: SampleFormat, history: usize, bar_width: usize) -> Self {
        Self {
            out,
            decoder: SampleDecoder::new(format),
            window: SampleWindow::new(history),
            bar_width: bar_width.max(1),
            limit: None,
            start_command: None,
        }
    }

    pub fn from_config(out: W, plot: &PlotConfig) -> Self {
        Self::new(out, plot.format, plot.history, plot.bar_width).with_start_command(plot.start_bytes())
    }

    /// Stop after `limit` samples.
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_start_command(mut self, command: Option<Vec<u8>>) -> Self {
        self.start_command = command;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn limit_reached(&self, samples: u64) -> bool {
        self.limit.is_some_and(|limit| samples >= limit)
    }

    fn plot(&mut self, value: f64) -> io::Result<()> {
        self.window.push(value);
        let len = self.window.scale(value, self.bar_width as u64) as usize;
        writeln!(self.out, "{value:>12.3} |{}", "#".repeat(len))
    }
}

impl<W: Write + Send> StreamConsumer for TextPlotter<W> {
    fn consume(
        &mut self,
        streams: &mut StreamPair,
        shutdown: &ShutdownSignal,
    ) -> AppResult<ConsumeSummary> {
        send_start_command(&mut streams.output, self.start_command.as_deref())?;

        let mut summary = ConsumeSummary::default();
        let mut buf = [0u8; READ_CHUNK];
        let mut decoded = Vec::new();

        'outer: while !self.limit_reached(summary.samples) && !shutdown.is_triggered() {
            let n = match streams.input.read(&mut buf) {
                Ok(0) => {
                    debug!("Input reached end of stream");
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            summary.bytes_read += n as u64;

            decoded.clear();
            self.decoder.push(&buf[..n], &mut decoded);
            for &value in &decoded {
                self.plot(value)?;
                summary.samples += 1;
                if self.limit_reached(summary.samples) {
                    break 'outer;
                }
            }
        }

        self.out.flush()?;
        info!(
            bytes = summary.bytes_read,
            samples = summary.samples,
            "Text plotter finished"
        );
        Ok(summary)
    }
}
