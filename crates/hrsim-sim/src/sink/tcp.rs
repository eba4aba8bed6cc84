//! Broker-style TCP sink
//!
//! Each sample becomes one line on the wire:
//!
//! ```text
//! {"topic":"fake-heart-data-test","payload":{"timestamp":1.0,"rate":61.3,"interval_ms":979.0}}\n
//! ```
//!
//! Sends are synchronous. A failed write drops the connection; the next
//! attempt reconnects, up to `retries` extra attempts per sample.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use hrsim_core::config::{PayloadFormat, SinkConfig};
use hrsim_core::Sample;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Sink, SinkError, SinkResult};

#[derive(Serialize)]
struct Envelope<'a, P> {
    topic: &'a str,
    payload: P,
}

/// Newline-delimited JSON over a TCP connection
pub struct TcpSink {
    address: String,
    topic: String,
    payload: PayloadFormat,
    retries: u32,
    timeout: Option<Duration>,
    stream: Option<TcpStream>,
    sent: u64,
    closed: bool,
}

impl TcpSink {
    /// Connect eagerly to `config.address`
    pub fn connect(config: &SinkConfig) -> SinkResult<Self> {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        let mut sink = Self {
            address: config.address.clone(),
            topic: config.topic.clone(),
            payload: config.payload,
            retries: config.retries,
            timeout,
            stream: None,
            sent: 0,
            closed: false,
        };
        sink.stream = Some(sink.open()?);
        info!(address = %sink.address, topic = %sink.topic, "TCP sink connected");
        Ok(sink)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect_error(&self, source: io::Error) -> SinkError {
        SinkError::Connect {
            address: self.address.clone(),
            source,
        }
    }

    fn open(&self) -> SinkResult<TcpStream> {
        let addrs = self
            .address
            .to_socket_addrs()
            .map_err(|e| self.connect_error(e))?;

        let mut last = io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing");
        for addr in addrs {
            let attempt = match self.timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_write_timeout(self.timeout)?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last = e,
            }
        }
        Err(self.connect_error(last))
    }

    fn encode(&self, sample: &Sample) -> SinkResult<Vec<u8>> {
        let mut line = match self.payload {
            PayloadFormat::Minimal => serde_json::to_vec(&Envelope {
                topic: &self.topic,
                payload: sample.minimal(),
            })?,
            PayloadFormat::Full => serde_json::to_vec(&Envelope {
                topic: &self.topic,
                payload: sample,
            })?,
        };
        line.push(b'\n');
        Ok(line)
    }

    fn try_send(&mut self, line: &[u8]) -> SinkResult<()> {
        if self.stream.is_none() {
            self.stream = Some(self.open()?);
            debug!(address = %self.address, "TCP sink reconnected");
        }
        if let Some(stream) = self.stream.as_mut() {
            stream.write_all(line)?;
            stream.flush()?;
        }
        Ok(())
    }
}

impl Sink for TcpSink {
    fn name(&self) -> &str {
        "tcp"
    }

    fn send(&mut self, sample: &Sample) -> SinkResult<()> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let line = self.encode(sample)?;

        let mut attempt = 0;
        loop {
            match self.try_send(&line) {
                Ok(()) => {
                    self.sent += 1;
                    return Ok(());
                }
                Err(e) => {
                    self.stream = None;
                    warn!(attempt, address = %self.address, error = %e, "TCP send failed");
                    if attempt >= self.retries {
                        return Err(e);
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn flush(&mut self) -> SinkResult<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(mut stream) = self.stream.take() {
            stream.flush()?;
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!(error = %e, "TCP shutdown");
            }
        }
        info!(messages = self.sent, address = %self.address, "TCP sink closed");
        Ok(())
    }

    fn sent(&self) -> u64 {
        self.sent
    }
}

impl Drop for TcpSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
