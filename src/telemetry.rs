//! Process-wide tracing setup.
//!
//! Stdout carries the notice protocol, so log records go to stderr or to the trace file.

use std::fs::OpenOptions;
use std::io;
use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;

use crate::config::{LogFormat, TelemetryConfig};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

#[inline]
fn max_level(config: &TelemetryConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

fn init_tracing_once(config: &TelemetryConfig, once: &OnceLock<()>) {
    if !config.enabled {
        return;
    }

    let _ = once.get_or_init(|| {
        let level = max_level(config);
        if let Some(path) = &config.trace_log {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("rosterkeep: cannot open trace log {}: {err}", path.display());
                    return;
                }
            };
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_max_level(level)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
            return;
        }

        match config.format {
            LogFormat::Json => {
                let subscriber = tracing_subscriber::fmt()
                    .json()
                    .with_max_level(level)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(io::stderr)
                    .with_current_span(false)
                    .with_span_list(false)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            LogFormat::Text => {
                let subscriber = tracing_subscriber::fmt()
                    .with_max_level(level)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(io::stderr)
                    .with_target(false)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
        }
    });
}

pub fn init_tracing(config: &TelemetryConfig) {
    init_tracing_once(config, &TRACING_INIT);
}
