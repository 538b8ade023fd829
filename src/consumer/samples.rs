//! Turning raw bytes into plottable samples.

use crate::config::SampleFormat;
use memchr::memchr;
use std::collections::VecDeque;
use tracing::debug;

/// Longest ASCII line kept while waiting for its newline.
const MAX_LINE_LEN: usize = 256;

/// Incremental decoder; partial ASCII lines are carried across `push` calls.
#[derive(Debug, Clone)]
pub struct SampleDecoder {
    format: SampleFormat,
    pending: Vec<u8>,
    /// Inside an overlong line; bytes are dropped up to the next newline.
    discarding: bool,
}

impl SampleDecoder {
    pub fn new(format: SampleFormat) -> Self {
        Self {
            format,
            pending: Vec::new(),
            discarding: false,
        }
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Decode `bytes`, appending samples to `out`. Returns how many were added.
    pub fn push(&mut self, bytes: &[u8], out: &mut Vec<f64>) -> usize {
        let before = out.len();
        match self.format {
            SampleFormat::Raw => out.extend(bytes.iter().map(|&b| f64::from(b))),
            SampleFormat::Ascii => self.push_ascii(bytes, out),
        }
        out.len() - before
    }

    fn push_ascii(&mut self, mut bytes: &[u8], out: &mut Vec<f64>) {
        if self.discarding {
            match memchr(b'\n', bytes) {
                Some(pos) => {
                    self.discarding = false;
                    bytes = &bytes[pos + 1..];
                }
                None => return,
            }
        }
        self.pending.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(pos) = memchr(b'\n', &self.pending[start..]) {
            let line = &self.pending[start..start + pos];
            if let Some(value) = parse_line(line) {
                out.push(value);
            }
            start += pos + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_LINE_LEN {
            debug!(len = self.pending.len(), "Discarding unterminated line");
            self.pending.clear();
            self.discarding = true;
        }
    }
}

fn parse_line(line: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(line).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            debug!(line = text, "Skipping unparsable sample");
            None
        }
    }
}

/// The most recent samples, oldest first.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = f64>) {
        for value in values {
            self.push(value);
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Smallest and largest sample currently held.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.samples.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Where `value` sits between the window bounds, in `0..=steps`.
    pub fn scale(&self, value: f64, steps: u64) -> u64 {
        match self.bounds() {
            Some((lo, hi)) if hi > lo => {
                let ratio = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
                (ratio * steps as f64).round() as u64
            }
            Some(_) => steps,
            None => 0,
        }
    }

    /// Every sample scaled to `0..=steps`, oldest first.
    pub fn scaled(&self, steps: u64) -> Vec<u64> {
        self.samples.iter().map(|&v| self.scale(v, steps)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_bytes_are_samples() {
        let mut decoder = SampleDecoder::new(SampleFormat::Raw);
        let mut out = Vec::new();
        assert_eq!(decoder.push(&[0, 127, 255], &mut out), 3);
        assert_eq!(out, vec![0.0, 127.0, 255.0]);
    }

    #[test]
    fn test_ascii_lines_split_across_reads() {
        let mut decoder = SampleDecoder::new(SampleFormat::Ascii);
        let mut out = Vec::new();

        decoder.push(b"12.5\r\n-3", &mut out);
        assert_eq!(out, vec![12.5]);

        decoder.push(b"\n7\n", &mut out);
        assert_eq!(out, vec![12.5, -3.0, 7.0]);
    }

    #[test]
    fn test_ascii_skips_garbage_and_blank_lines() {
        let mut decoder = SampleDecoder::new(SampleFormat::Ascii);
        let mut out = Vec::new();
        decoder.push(b"\nabc\n4\nNaN\n\xff\xfe\n5\n", &mut out);
        assert_eq!(out, vec![4.0, 5.0]);
    }

    #[test]
    fn test_overlong_line_is_dropped_whole() {
        let mut decoder = SampleDecoder::new(SampleFormat::Ascii);
        let mut out = Vec::new();
        decoder.push(&[b'1'; MAX_LINE_LEN + 1], &mut out);
        decoder.push(b"23", &mut out);
        decoder.push(b"4\n5\n", &mut out);
        assert_eq!(out, vec![5.0]);
    }

    #[test]
    fn test_window_drops_oldest() {
        let mut window = SampleWindow::new(3);
        window.extend([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(window.len(), 3);
        assert_eq!(window.bounds(), Some((2.0, 4.0)));
        assert_eq!(window.latest(), Some(4.0));
    }

    #[test]
    fn test_scaling() {
        let mut window = SampleWindow::new(8);
        assert_eq!(window.scale(1.0, 10), 0);

        window.extend([0.0, 5.0, 10.0]);
        assert_eq!(window.scaled(10), vec![0, 5, 10]);

        let mut flat = SampleWindow::new(4);
        flat.extend([3.0, 3.0]);
        assert_eq!(flat.scaled(10), vec![10, 10]);
    }
}
