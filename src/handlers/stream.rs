//! Stream output: standard error, standard output or any writer

use crate::core::{Delivery, Formatter, Record, Result, Sink};
use std::fmt;
use std::io::{self, Write};

enum Target {
    Stderr,
    Stdout,
    Writer(Box<dyn Write + Send>),
}

/// Writes each formatted record plus a terminator, flushing after every
/// record.
///
/// # Example
///
/// ```
/// use rust_logging::{Handler, Level, StreamSink};
///
/// let handler = Handler::new(StreamSink::stdout()).with_level(Level::INFO);
/// ```
pub struct StreamSink {
    target: Target,
    terminator: String,
}

impl StreamSink {
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            target: Target::Stderr,
            terminator: "\n".to_string(),
        }
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
            terminator: "\n".to_string(),
        }
    }

    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            target: Target::Writer(Box::new(writer)),
            terminator: "\n".to_string(),
        }
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.terminator = terminator.into();
        self
    }

    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    /// Swap the destination writer, flushing the old one first.
    pub fn set_stream<W: Write + Send + 'static>(&mut self, writer: W) -> Result<()> {
        self.write_flush()?;
        self.target = Target::Writer(Box::new(writer));
        Ok(())
    }

    fn write_record(&mut self, text: &str) -> io::Result<()> {
        let terminator = self.terminator.as_bytes();
        match &mut self.target {
            Target::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(text.as_bytes())?;
                out.write_all(terminator)?;
                out.flush()
            }
            Target::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes())?;
                out.write_all(terminator)?;
                out.flush()
            }
            Target::Writer(writer) => {
                writer.write_all(text.as_bytes())?;
                writer.write_all(terminator)?;
                writer.flush()
            }
        }
    }

    fn write_flush(&mut self) -> Result<()> {
        match &mut self.target {
            Target::Stderr => io::stderr().flush()?,
            Target::Stdout => io::stdout().flush()?,
            Target::Writer(writer) => writer.flush()?,
        }
        Ok(())
    }
}

impl Sink for StreamSink {
    fn emit(&mut self, record: &Record, formatter: &Formatter) -> Result<Delivery> {
        let text = formatter.format(record)?;
        self.write_record(&text)?;
        Ok(Delivery::Written)
    }

    fn flush(&mut self) -> Result<()> {
        self.write_flush()
    }

    fn name(&self) -> &str {
        match self.target {
            Target::Stderr => "<stderr>",
            Target::Stdout => "<stdout>",
            Target::Writer(_) => "stream",
        }
    }
}

impl fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("target", &self.name())
            .field("terminator", &self.terminator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Handler, Level};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    #[test]
    fn test_writes_line_with_terminator() {
        let buffer = Buffer::default();
        let handler = Handler::new(StreamSink::new(buffer.clone()));
        handler.handle(&Record::new("s", Level::INFO, "one"));
        handler.handle(&Record::new("s", Level::INFO, "two"));
        assert_eq!(buffer.text(), "one\ntwo\n");
    }

    #[test]
    fn test_custom_terminator_and_stream_swap() {
        let first = Buffer::default();
        let second = Buffer::default();
        let handler = Handler::new(StreamSink::new(first.clone()).with_terminator("\r\n"));
        handler.handle(&Record::new("s", Level::INFO, "a"));

        handler
            .with_sink(|sink: &mut StreamSink| sink.set_stream(second.clone()))
            .unwrap()
            .unwrap();
        handler.handle(&Record::new("s", Level::INFO, "b"));

        assert_eq!(first.text(), "a\r\n");
        assert_eq!(second.text(), "b\r\n");
    }

    #[test]
    fn test_broken_writer_is_reported_not_raised() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let handler = Handler::new(StreamSink::new(Broken));
        assert!(handler.handle(&Record::new("s", Level::ERROR, "lost")));
        assert_eq!(handler.metrics().error_count(), 1);
    }
}
