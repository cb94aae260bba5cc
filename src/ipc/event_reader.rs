use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use super::protocol::BotEvent;

/// Parse one feed line. Blank lines yield `Ok(None)`.
pub fn parse_event_line(line: &str) -> Result<Option<BotEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Read newline-delimited events from `reader` on a dedicated thread.
///
/// Malformed lines are logged and skipped. The thread exits at end of input, on a
/// read error, or once the receiving side is gone; dropping `tx` then closes the feed.
pub fn spawn_event_reader<R>(reader: R, tx: Sender<BotEvent>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for (index, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(error = %err, "event feed read failed");
                    break;
                }
            };

            match parse_event_line(&line) {
                Ok(Some(event)) => {
                    if tx.blocking_send(event).is_err() {
                        break; // Router has exited
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(line = index + 1, error = %err, "skipping malformed event");
                }
            }
        }

        debug!("event reader thread exiting");
    })
}

pub fn spawn_stdin_reader(tx: Sender<BotEvent>) -> thread::JoinHandle<()> {
    spawn_event_reader(io::BufReader::new(io::stdin()), tx)
}
