//! TCP output with reconnect backoff
//!
//! The formatted record plus terminator is written as UTF-8 to a TCP peer.
//! While the peer is unreachable records are dropped, never queued, and the
//! connection is retried on an exponential schedule.

use crate::core::{Delivery, Formatter, Record, Result, Sink};
use std::fmt;
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Sends log lines to `host:port`.
///
/// # Example
///
/// ```no_run
/// use rust_logging::{Handler, SocketSink};
///
/// let handler = Handler::new(SocketSink::new("logs.internal", 9020));
/// ```
pub struct SocketSink {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    terminator: String,
    timeout: Duration,
    retry_start: Duration,
    retry_factor: f64,
    retry_max: Duration,
    retry_period: Duration,
    retry_at: Option<Instant>,
}

impl SocketSink {
    /// Connects lazily on the first record.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            stream: None,
            terminator: "\n".to_string(),
            timeout: Duration::from_secs(1),
            retry_start: Duration::from_secs(1),
            retry_factor: 2.0,
            retry_max: Duration::from_secs(30),
            retry_period: Duration::ZERO,
            retry_at: None,
        }
    }

    /// First delay, growth factor and ceiling for reconnect attempts
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn backoff(mut self, start: Duration, factor: f64, max: Duration) -> Self {
        self.retry_start = start;
        self.retry_factor = factor;
        self.retry_max = max;
        self
    }

    /// Connect and write timeout
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Delay before the next reconnect attempt, zero when none is pending.
    pub fn retry_period(&self) -> Duration {
        self.retry_period
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let mut last_err = io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing");
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Connect if no connection is live and the backoff window has passed.
    fn ensure_connected(&mut self) {
        if self.stream.is_some() {
            return;
        }
        let now = Instant::now();
        if self.retry_at.is_some_and(|at| now < at) {
            return;
        }
        match self.connect() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.retry_at = None;
                self.retry_period = Duration::ZERO;
            }
            Err(_) => {
                self.retry_period = if self.retry_at.is_none() {
                    self.retry_start
                } else {
                    self.retry_period.mul_f64(self.retry_factor).min(self.retry_max)
                };
                self.retry_at = Some(now + self.retry_period);
            }
        }
    }
}

impl Sink for SocketSink {
    fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
        let text = formatter.format(record)?;
        self.ensure_connected();
        let Some(stream) = self.stream.as_mut() else {
            return Ok(Delivery::Dropped);
        };
        let written = stream
            .write_all(text.as_bytes())
            .and_then(|()| stream.write_all(self.terminator.as_bytes()));
        if let Err(e) = written {
            self.stream = None;
            return Err(e.into());
        }
        Ok(Delivery::Written)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.as_mut() {
            stream.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            stream.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "socket"
    }
}

impl fmt::Debug for SocketSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketSink")
            .field("address", &self.address())
            .field("connected", &self.is_connected())
            .field("retry_period", &self.retry_period)
            .finish_non_exhaustive()
    }
}
