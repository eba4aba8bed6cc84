//! Console sink: one readable line per sample

use std::io::Write;

use hrsim_core::Sample;

use super::{Sink, SinkError, SinkResult};

/// Human-readable output, one line per sample
pub struct ConsoleSink<W> {
    writer: W,
    sent: u64,
    closed: bool,
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sent: 0,
            closed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn send(&mut self, sample: &Sample) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        writeln!(self.writer, "{}", sample)?;
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
