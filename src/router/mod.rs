//! Event routing: turns platform events into roster operations and notices.
//!
//! The router consumes one event at a time and awaits the roster actor's reply before
//! taking the next, so notices always reflect what was actually written. Until the
//! first `ready` event has been handled the bot has no resolved collection channel:
//! role changes are skipped (the ready bulk sync covers them) and chat messages are
//! held back and replayed once the roster is synced.

mod address;
mod transition;

use std::collections::VecDeque;

use tracing::{debug, error, info, warn};

use crate::ipc::{BotEvent, ChannelInfo, InboundMessage, NotificationSink, Notice};
use crate::roster::{Member, MemberId, RosterHandle, WhitelistRoles};

use address::redact;
pub use address::{AddressPattern, DEFAULT_ADDRESS_PATTERN};
pub use transition::RoleTransition;

/// Messages held back before the first `ready`; the oldest is dropped beyond this.
pub const DEFERRED_MESSAGE_CAPACITY: usize = 64;

const PING: &str = "ping!";
const PONG: &str = "pong!";

/// Where members post their addresses: a fixed channel id, or a name looked up in
/// the channel list of each `ready` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(String),
    Name(String),
}

impl ChannelRef {
    /// All-digit input is an id; anything else is a name (a leading `#` is dropped).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            Self::Id(raw.to_string())
        } else {
            Self::Name(raw.trim_start_matches('#').to_string())
        }
    }

    fn resolve(&self, channels: &[ChannelInfo]) -> Option<String> {
        match self {
            Self::Id(id) => {
                if !channels.is_empty() && !channels.iter().any(|channel| &channel.id == id) {
                    warn!(channel_id = %id, "collection channel id not in ready channel list");
                }
                Some(id.clone())
            }
            Self::Name(name) => channels
                .iter()
                .find(|channel| &channel.name == name)
                .map(|channel| channel.id.clone()),
        }
    }
}

/// Texts the bot sends. `{name}` is replaced with the member's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplates {
    pub welcome: String,
    pub join_greeting: String,
    pub address_ack: String,
    pub address_failed: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            welcome: "hello, send me your address".to_string(),
            join_greeting: "Hi {name}, welcome to the server!".to_string(),
            address_ack: "Thanks {name}, your address has been recorded.".to_string(),
            address_failed: "Sorry {name}, your address could not be saved. Please post it again later."
                .to_string(),
        }
    }
}

fn render(template: &str, member: &Member) -> String {
    template.replace("{name}", &member.name)
}

/// Static routing settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub roles: WhitelistRoles,
    pub guild_name: Option<String>,
    pub collection_channel: ChannelRef,
    pub bot_user_id: Option<MemberId>,
    pub address_pattern: AddressPattern,
    pub templates: MessageTemplates,
    pub log_content: bool,
}

/// State filled in by the `ready` initialization step.
#[derive(Debug, Clone, Default)]
struct Session {
    collection_channel_id: Option<String>,
}

/// Everything event handling needs, built once at startup.
#[derive(Debug)]
pub struct BotContext {
    settings: RouterSettings,
    roster: RosterHandle,
    session: Option<Session>,
}

impl BotContext {
    pub fn new(settings: RouterSettings, roster: RosterHandle) -> Self {
        Self {
            settings,
            roster,
            session: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    pub fn collection_channel_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.collection_channel_id.as_deref())
    }
}

pub struct EventRouter<N> {
    ctx: BotContext,
    sink: N,
    deferred: VecDeque<InboundMessage>,
}

impl<N: NotificationSink> EventRouter<N> {
    pub fn new(ctx: BotContext, sink: N) -> Self {
        Self {
            ctx,
            sink,
            deferred: VecDeque::new(),
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub async fn handle(&mut self, event: BotEvent) {
        debug!(event = event.kind(), "routing event");
        match event {
            BotEvent::Ready {
                guild_name,
                members,
                channels,
            } => self.on_ready(guild_name, &members, &channels).await,
            BotEvent::MemberRoleChanged { before, after } => {
                self.on_role_changed(&before, after).await;
            }
            BotEvent::MessageReceived(message) => self.on_message(message).await,
            BotEvent::MemberJoined { member } => self.on_member_joined(&member),
        }
    }

    async fn on_ready(
        &mut self,
        guild_name: Option<String>,
        members: &[Member],
        channels: &[ChannelInfo],
    ) {
        if let Some(expected) = &self.ctx.settings.guild_name {
            if guild_name.as_deref() != Some(expected.as_str()) {
                warn!(expected = %expected, got = ?guild_name, "ready event for another guild ignored");
                debug!(deferred = self.deferred.len(), "messages stay deferred until a matching ready");
                return;
            }
        }

        let collection_channel_id = self.ctx.settings.collection_channel.resolve(channels);
        match &collection_channel_id {
            Some(id) => info!(channel_id = %id, "collection channel resolved"),
            None => warn!(
                channel = ?self.ctx.settings.collection_channel,
                "collection channel not found; address collection paused until next ready"
            ),
        }
        self.ctx.session = Some(Session {
            collection_channel_id,
        });

        let desired = self.ctx.settings.roles.desired_set(members);
        info!(
            members = members.len(),
            whitelisted = desired.len(),
            roles = %self.ctx.settings.roles,
            "ready; starting roster bulk sync"
        );
        if let Err(err) = self.ctx.roster.bulk_sync(desired).await {
            error!(error = %err, "roster bulk sync failed; next ready will retry");
        }

        if !self.deferred.is_empty() {
            info!(count = self.deferred.len(), "replaying messages received before ready");
        }
        while let Some(message) = self.deferred.pop_front() {
            self.collect_address(message).await;
        }
    }

    async fn on_role_changed(&mut self, before: &Member, after: Member) {
        if !self.ctx.is_ready() {
            debug!(id = %after.id, "role change before ready; bulk sync will cover it");
            return;
        }

        match RoleTransition::classify(&self.ctx.settings.roles, before, &after) {
            RoleTransition::Gained => match self.ctx.roster.add_one(after.clone()).await {
                Ok(outcome) => {
                    info!(id = %after.id, outcome = ?outcome, "whitelist role gained");
                    let text = render(&self.ctx.settings.templates.welcome, &after);
                    self.notify(Notice::DirectMessage {
                        member_id: after.id,
                        text,
                    });
                }
                Err(err) => error!(id = %after.id, error = %err, "failed to add member to roster"),
            },
            RoleTransition::Lost => match self.ctx.roster.remove_one(after.id).await {
                Ok(outcome) => info!(id = %after.id, outcome = ?outcome, "whitelist role lost"),
                Err(err) => {
                    error!(id = %after.id, error = %err, "failed to remove member from roster");
                }
            },
            RoleTransition::Unchanged => {
                debug!(id = %after.id, "role change does not cross the whitelist");
            }
        }
    }

    async fn on_message(&mut self, message: InboundMessage) {
        if self.ctx.settings.bot_user_id == Some(message.author.id) {
            return;
        }
        if message.text.trim().eq_ignore_ascii_case(PING) {
            self.notify(Notice::Send {
                channel_id: message.channel_id,
                text: PONG.to_string(),
            });
            return;
        }
        if !self.ctx.is_ready() {
            self.defer(message);
            return;
        }
        self.collect_address(message).await;
    }

    fn defer(&mut self, message: InboundMessage) {
        if self.deferred.len() >= DEFERRED_MESSAGE_CAPACITY {
            if let Some(dropped) = self.deferred.pop_front() {
                warn!(message_id = %dropped.message_id, "deferred message queue full; dropping oldest");
            }
        }
        debug!(message_id = %message.message_id, "message before ready deferred");
        self.deferred.push_back(message);
    }

    async fn collect_address(&mut self, message: InboundMessage) {
        let Some(channel_id) = self.ctx.collection_channel_id() else {
            return;
        };
        if message.channel_id != channel_id {
            return;
        }
        if !self.ctx.settings.roles.has_whitelist_role(&message.author) {
            debug!(id = %message.author.id, "address message from non-whitelisted member ignored");
            return;
        }
        let Some(address) = self.ctx.settings.address_pattern.extract(&message.text) else {
            debug!(id = %message.author.id, "collection channel message is not an address");
            return;
        };

        let address = address.to_string();
        let shown = if self.ctx.settings.log_content {
            address.clone()
        } else {
            redact(&address)
        };
        let result = self
            .ctx
            .roster
            .record_address(message.author.clone(), address)
            .await;

        // The address stays public until the message is gone, so delete either way.
        let delete = Notice::DeleteMessage {
            channel_id: message.channel_id.clone(),
            message_id: message.message_id.clone(),
        };
        match result {
            Ok(outcome) => {
                info!(id = %message.author.id, address = %shown, outcome = ?outcome, "address recorded");
                let text = render(&self.ctx.settings.templates.address_ack, &message.author);
                self.notify(Notice::Send {
                    channel_id: message.channel_id,
                    text,
                });
                self.notify(delete);
            }
            Err(err) => {
                error!(id = %message.author.id, address = %shown, error = %err, "failed to record address");
                self.notify(delete);
                let text = render(&self.ctx.settings.templates.address_failed, &message.author);
                self.notify(Notice::Send {
                    channel_id: message.channel_id,
                    text,
                });
            }
        }
    }

    fn on_member_joined(&mut self, member: &Member) {
        info!(id = %member.id, "member joined");
        let text = render(&self.ctx.settings.templates.join_greeting, member);
        self.notify(Notice::DirectMessage {
            member_id: member.id,
            text,
        });
    }

    fn notify(&mut self, notice: Notice) {
        if let Err(err) = self.sink.deliver(&notice) {
            warn!(error = %err, notice = ?notice, "notice delivery failed");
        }
    }
}

#[cfg(test)]
mod tests;
