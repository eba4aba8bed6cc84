//! JSON Lines sink
//!
//! Writes either the minimal `{timestamp, rate, interval_ms}` payload or the
//! full sample, one object per line.

use std::io::Write;

use hrsim_core::config::PayloadFormat;
use hrsim_core::Sample;

use super::{Sink, SinkError, SinkResult};

/// Writes one JSON object per line (JSON Lines)
pub struct JsonLinesSink<W> {
    writer: W,
    format: PayloadFormat,
    sent: u64,
    closed: bool,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W, format: PayloadFormat) -> Self {
        Self {
            writer,
            format,
            sent: 0,
            closed: false,
        }
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn send(&mut self, sample: &Sample) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        match self.format {
            PayloadFormat::Minimal => serde_json::to_writer(&mut self.writer, &sample.minimal())?,
            PayloadFormat::Full => serde_json::to_writer(&mut self.writer, sample)?,
        }
        self.writer.write_all(b"\n")?;
        self.sent += 1;
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        if !self.closed {
            self.closed = true;
            self.writer.flush()?;
        }
        Ok(())
    }

    fn sent(&self) -> u64 {
        self.sent
    }
}
