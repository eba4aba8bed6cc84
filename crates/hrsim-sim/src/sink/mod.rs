//! Sample sinks
//!
//! Destinations for produced samples. The engine never talks to a sink
//! directly; callers forward what they pull from a stream.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`ConsoleSink`] | one human-readable line per sample |
//! | [`JsonLinesSink`] | one JSON object per line |
//! | [`TcpSink`] | newline-delimited `{topic, payload}` envelopes over TCP |
//! | [`NullSink`] | nothing |
//! | [`FanOut`] | every sample to several sinks |

mod console;
mod json;
mod tcp;

pub use console::ConsoleSink;
pub use json::JsonLinesSink;
pub use tcp::TcpSink;

use std::fs::File;
use std::io::{self, BufWriter};

use hrsim_core::config::{SinkConfig, SinkKind};
use hrsim_core::Sample;

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors that can occur while delivering samples
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink already closed")]
    Closed,

    #[error("Cannot connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Consumer of samples
pub trait Sink: Send {
    /// Short sink name for logs
    fn name(&self) -> &str;

    /// Deliver one sample. Fails with [`SinkError::Closed`] after `close`.
    fn send(&mut self, sample: &Sample) -> SinkResult<()>;

    /// Push buffered output to its destination
    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }

    /// Flush and release resources. Calling it again is a no-op.
    fn close(&mut self) -> SinkResult<()>;

    /// Samples delivered so far
    fn sent(&self) -> u64;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&mut self, sample: &Sample) -> SinkResult<()> {
        (**self).send(sample)
    }

    fn flush(&mut self) -> SinkResult<()> {
        (**self).flush()
    }

    fn close(&mut self) -> SinkResult<()> {
        (**self).close()
    }

    fn sent(&self) -> u64 {
        (**self).sent()
    }
}

/// Accepts and discards everything
#[derive(Debug, Default)]
pub struct NullSink {
    sent: u64,
    closed: bool,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn send(&mut self, _sample: &Sample) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.sent += 1;
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        self.closed = true;
        Ok(())
    }

    fn sent(&self) -> u64 {
        self.sent
    }
}

/// Forwards each sample to every inner sink.
///
/// All sinks are attempted; the first failure is reported. Once closed,
/// every send fails with [`SinkError::Closed`] whatever the inner sinks do.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn Sink>>,
    sent: u64,
    closed: bool,
}

impl FanOut {
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            sinks,
            sent: 0,
            closed: false,
        }
    }

    pub fn push(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn for_each(
        &mut self,
        mut op: impl FnMut(&mut dyn Sink) -> SinkResult<()>,
    ) -> SinkResult<()> {
        let mut first = None;
        for sink in self.sinks.iter_mut() {
            if let Err(e) = op(sink.as_mut()) {
                tracing::warn!(sink = sink.name(), error = %e, "Sink operation failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Sink for FanOut {
    fn name(&self) -> &str {
        "fan-out"
    }

    /// Counts a sample as sent only when every sink accepted it
    fn send(&mut self, sample: &Sample) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.for_each(|sink| sink.send(sample))?;
        self.sent += 1;
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.for_each(|sink| sink.flush())
    }

    fn close(&mut self) -> SinkResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.for_each(|sink| sink.close())
    }

    fn sent(&self) -> u64 {
        self.sent
    }
}

/// Build the sink described by `config`
pub fn build_sink(config: &SinkConfig) -> SinkResult<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match config.kind {
        SinkKind::Console => Box::new(ConsoleSink::new(io::stdout())),
        SinkKind::Jsonl => match config.path {
            Some(ref path) => Box::new(JsonLinesSink::new(
                BufWriter::new(File::create(path)?),
                config.payload,
            )),
            None => Box::new(JsonLinesSink::new(io::stdout(), config.payload)),
        },
        SinkKind::Tcp => Box::new(TcpSink::connect(config)?),
        SinkKind::None => Box::new(NullSink::new()),
    };
    tracing::debug!(sink = sink.name(), "Sink ready");
    Ok(sink)
}
