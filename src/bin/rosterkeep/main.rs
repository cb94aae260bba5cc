//! rosterkeep: reads platform events as JSON lines on stdin, keeps the roster sheet in
//! step with whitelist role holders, and writes outbound notices as JSON lines on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

use rosterkeep::config::{load_file_config, AppConfig, Settings, StoreSettings};
use rosterkeep::ipc::{spawn_stdin_reader, JsonLinesSink};
use rosterkeep::roster::{spawn_roster_actor, Reconciler, SystemClock};
use rosterkeep::router::{BotContext, EventRouter};
use rosterkeep::store::{MemoryRowStore, RowStore, SheetFileStore};
use rosterkeep::telemetry::init_tracing;

const EVENT_QUEUE_CAPACITY: usize = 256;
const ROSTER_MAILBOX_CAPACITY: usize = 32;

fn open_store(settings: &StoreSettings) -> Result<Box<dyn RowStore>> {
    let sheet = SheetFileStore::new(
        &settings.dir,
        &settings.table_id,
        settings.range.clone(),
        settings.blank_padding_rows,
    )?;
    if !settings.dry_run {
        return Ok(Box::new(sheet));
    }
    let rows = sheet
        .fetch_range()
        .with_context(|| format!("failed to seed dry run from {}", sheet.path().display()))?;
    info!(rows = rows.len(), source = %sheet.describe(), "dry run; writes stay in memory");
    Ok(Box::new(MemoryRowStore::with_rows(
        format!("dry-run:{}", sheet.describe()),
        rows,
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AppConfig::parse();
    let file = load_file_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file)?;
    init_tracing(&settings.telemetry);

    let store = open_store(&settings.store)?;
    info!(
        store = %store.describe(),
        roles = %settings.router.roles,
        version = env!("CARGO_PKG_VERSION"),
        "rosterkeep starting"
    );

    let (roster, actor_task) = spawn_roster_actor(
        Reconciler::new(store, SystemClock),
        ROSTER_MAILBOX_CAPACITY,
    );
    let mut router = EventRouter::new(
        BotContext::new(settings.router, roster),
        JsonLinesSink::stdout(),
    );

    let (tx, mut rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let _reader = spawn_stdin_reader(tx);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => router.handle(event).await,
                None => {
                    info!("event stream closed");
                    break;
                }
            },
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "ctrl-c listener failed");
                }
                info!("interrupt received; shutting down");
                break;
            }
        }
    }

    // Dropping the router drops the last roster handle, which stops the actor.
    drop(router);
    if let Err(err) = actor_task.await {
        warn!(error = %err, "roster actor ended abnormally");
    }
    info!("rosterkeep stopped");
    Ok(())
}
