use std::io::{self, Write};

use super::protocol::Notice;

/// Where outbound notices go. Delivery is best effort; callers log failures and move on.
pub trait NotificationSink: Send {
    fn deliver(&mut self, notice: &Notice) -> io::Result<()>;
}

/// Writes each notice as one JSON line and flushes, so a bridge reading the pipe sees
/// it immediately.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn deliver(&mut self, notice: &Notice) -> io::Result<()> {
        let json = serde_json::to_string(notice)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()
    }
}

impl<N: NotificationSink + ?Sized> NotificationSink for Box<N> {
    fn deliver(&mut self, notice: &Notice) -> io::Result<()> {
        (**self).deliver(notice)
    }
}
