//! Startup configuration: command line, `ROSTERKEEP_*` environment, optional TOML file.
//!
//! Precedence is CLI/env over the file over built-in defaults. Everything is resolved
//! once into an immutable [`Settings`] before the event loop starts.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::roster::{MemberId, WhitelistRoles};
use crate::router::{
    AddressPattern, ChannelRef, MessageTemplates, RouterSettings, DEFAULT_ADDRESS_PATTERN,
};
use crate::store::A1Range;

pub const DEFAULT_WHITELIST_ROLE: &str = "whitelisted";
pub const DEFAULT_RANGE: &str = "Sheet1!A1:D";
pub const DEFAULT_TABLE_ID: &str = "roster";
pub const DEFAULT_STORE_DIR: &str = "roster-data";
pub const DEFAULT_BLANK_PADDING_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON lines with RFC 3339 timestamps
    Json,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "rosterkeep",
    about = "Keeps a sheet roster in step with the holders of whitelist roles",
    version
)]
pub struct AppConfig {
    /// TOML config file (default: <config dir>/rosterkeep/config.toml when present)
    #[arg(long, env = "ROSTERKEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Role names granting whitelist status (repeat or comma-separate)
    #[arg(
        long = "whitelist-role",
        env = "ROSTERKEEP_WHITELIST_ROLES",
        value_delimiter = ','
    )]
    pub whitelist_roles: Vec<String>,

    /// Only accept `ready` events for this guild
    #[arg(long, env = "ROSTERKEEP_GUILD_NAME")]
    pub guild_name: Option<String>,

    /// Channel where members post addresses (numeric id or name)
    #[arg(long, env = "ROSTERKEEP_COLLECTION_CHANNEL")]
    pub collection_channel: Option<String>,

    /// The bot's own user id; its messages are ignored
    #[arg(long, env = "ROSTERKEEP_BOT_USER_ID")]
    pub bot_user_id: Option<MemberId>,

    /// Sheet document (table) id
    #[arg(long, env = "ROSTERKEEP_TABLE_ID")]
    pub table_id: Option<String>,

    /// A1 range holding the roster columns
    #[arg(long, env = "ROSTERKEEP_RANGE")]
    pub range: Option<String>,

    /// Directory holding sheet documents
    #[arg(long, env = "ROSTERKEEP_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Blank rows written after the data (0 truncates exactly)
    #[arg(long, env = "ROSTERKEEP_BLANK_PADDING_ROWS")]
    pub blank_padding_rows: Option<usize>,

    /// Regex an address token must match in full
    #[arg(long, env = "ROSTERKEEP_ADDRESS_PATTERN")]
    pub address_pattern: Option<String>,

    /// Read the sheet once, then keep all writes in memory
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Log output format on stderr
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Append JSON log lines to this file instead of stderr
    #[arg(long, env = "ROSTERKEEP_TRACE_LOG")]
    pub trace_log: Option<PathBuf>,

    /// Disable logging entirely
    #[arg(long, default_value_t = false)]
    pub no_logs: bool,

    /// Include message content (addresses) in logs
    #[arg(long, default_value_t = false)]
    pub log_content: bool,

    /// Log at debug level
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

/// Optional TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub whitelist_roles: Vec<String>,
    pub guild_name: Option<String>,
    pub collection_channel: Option<String>,
    pub bot_user_id: Option<MemberId>,
    pub table_id: Option<String>,
    pub range: Option<String>,
    pub store_dir: Option<PathBuf>,
    pub blank_padding_rows: Option<usize>,
    pub address_pattern: Option<String>,
    pub log_format: Option<LogFormat>,
    pub messages: MessagesConfig,
}

/// `[messages]` table overriding the bot's texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagesConfig {
    pub welcome: Option<String>,
    pub join_greeting: Option<String>,
    pub address_ack: Option<String>,
    pub address_failed: Option<String>,
}

impl MessagesConfig {
    fn apply(self, templates: &mut MessageTemplates) {
        if let Some(text) = self.welcome {
            templates.welcome = text;
        }
        if let Some(text) = self.join_greeting {
            templates.join_greeting = text;
        }
        if let Some(text) = self.address_ack {
            templates.address_ack = text;
        }
        if let Some(text) = self.address_failed {
            templates.address_failed = text;
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rosterkeep").join("config.toml"))
}

/// An explicit path must exist; the default location is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    match explicit {
        Some(path) => read_file_config(path),
        None => match default_config_path() {
            Some(path) if path.is_file() => read_file_config(&path),
            _ => Ok(FileConfig::default()),
        },
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&body).with_context(|| format!("invalid config file {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub format: LogFormat,
    pub trace_log: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub dir: PathBuf,
    pub table_id: String,
    pub range: A1Range,
    pub blank_padding_rows: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub router: RouterSettings,
    pub store: StoreSettings,
    pub telemetry: TelemetryConfig,
}

impl Settings {
    pub fn resolve(cli: &AppConfig, file: FileConfig) -> Result<Self> {
        let role_names = if !cli.whitelist_roles.is_empty() {
            cli.whitelist_roles.clone()
        } else if !file.whitelist_roles.is_empty() {
            file.whitelist_roles
        } else {
            vec![DEFAULT_WHITELIST_ROLE.to_string()]
        };
        let roles = WhitelistRoles::new(&role_names)
            .context("at least one non-blank whitelist role name is required")?;

        let collection_channel = cli
            .collection_channel
            .clone()
            .or(file.collection_channel)
            .filter(|channel| !channel.trim().is_empty())
            .context("a collection channel is required (--collection-channel or collection_channel in the config file)")?;

        let raw_pattern = cli
            .address_pattern
            .clone()
            .or(file.address_pattern)
            .unwrap_or_else(|| DEFAULT_ADDRESS_PATTERN.to_string());
        let address_pattern = AddressPattern::new(&raw_pattern)
            .with_context(|| format!("invalid address pattern {raw_pattern:?}"))?;

        let raw_range = cli
            .range
            .clone()
            .or(file.range)
            .unwrap_or_else(|| DEFAULT_RANGE.to_string());
        let range: A1Range = raw_range
            .parse()
            .with_context(|| format!("invalid roster range {raw_range:?}"))?;

        let mut templates = MessageTemplates::default();
        file.messages.apply(&mut templates);

        let router = RouterSettings {
            roles,
            guild_name: cli.guild_name.clone().or(file.guild_name),
            collection_channel: ChannelRef::parse(&collection_channel),
            bot_user_id: cli.bot_user_id.or(file.bot_user_id),
            address_pattern,
            templates,
            log_content: cli.log_content,
        };

        let store = StoreSettings {
            dir: cli
                .store_dir
                .clone()
                .or(file.store_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR)),
            table_id: cli
                .table_id
                .clone()
                .or(file.table_id)
                .unwrap_or_else(|| DEFAULT_TABLE_ID.to_string()),
            range,
            blank_padding_rows: cli
                .blank_padding_rows
                .or(file.blank_padding_rows)
                .unwrap_or(DEFAULT_BLANK_PADDING_ROWS),
            dry_run: cli.dry_run,
        };

        let telemetry = TelemetryConfig {
            enabled: !cli.no_logs,
            format: cli.log_format.or(file.log_format).unwrap_or_default(),
            trace_log: cli.trace_log.clone(),
            verbose: cli.verbose,
        };

        Ok(Self {
            router,
            store,
            telemetry,
        })
    }
}
