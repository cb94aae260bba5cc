//! JSON-lines bridge: inbound platform events on stdin, outbound notices on stdout.

mod event_reader;
mod notice_sink;
pub mod protocol;

pub use event_reader::{parse_event_line, spawn_event_reader, spawn_stdin_reader};
pub use notice_sink::{JsonLinesSink, NotificationSink};
pub use protocol::{BotEvent, ChannelInfo, InboundMessage, Notice};
