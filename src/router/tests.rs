use std::io;

use super::*;
use crate::roster::{spawn_roster_actor, FixedClock, Reconciler, Row};
use crate::store::MemoryRowStore;

const NOW: &str = "2026-10-16T09:30:00Z";
const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
const COLLECTION_ID: &str = "900";

#[derive(Default)]
struct RecordingSink {
    notices: Vec<Notice>,
}

impl NotificationSink for RecordingSink {
    fn deliver(&mut self, notice: &Notice) -> io::Result<()> {
        self.notices.push(notice.clone());
        Ok(())
    }
}

fn settings() -> RouterSettings {
    RouterSettings {
        roles: WhitelistRoles::new(["whitelisted"]).expect("roles"),
        guild_name: Some("Guild".to_string()),
        collection_channel: ChannelRef::parse("#addresses"),
        bot_user_id: Some(MemberId::new(1)),
        address_pattern: AddressPattern::new(DEFAULT_ADDRESS_PATTERN).expect("pattern"),
        templates: MessageTemplates::default(),
        log_content: false,
    }
}

fn router(store: &MemoryRowStore) -> EventRouter<RecordingSink> {
    let reconciler = Reconciler::new(store.clone(), FixedClock::new(NOW));
    let (roster, _task) = spawn_roster_actor(reconciler, 8);
    EventRouter::new(BotContext::new(settings(), roster), RecordingSink::default())
}

fn whitelisted(id: u64, name: &str) -> Member {
    Member::new(id, name).with_roles(["whitelisted"])
}

fn plain(id: u64, name: &str) -> Member {
    Member::new(id, name).with_roles(["member"])
}

fn ready(members: Vec<Member>) -> BotEvent {
    BotEvent::Ready {
        guild_name: Some("Guild".to_string()),
        members,
        channels: vec![
            ChannelInfo {
                id: "800".to_string(),
                name: "general".to_string(),
            },
            ChannelInfo {
                id: COLLECTION_ID.to_string(),
                name: "addresses".to_string(),
            },
        ],
    }
}

fn message(id: &str, channel_id: &str, author: Member, text: &str) -> BotEvent {
    BotEvent::MessageReceived(InboundMessage {
        message_id: id.to_string(),
        channel_id: channel_id.to_string(),
        author,
        text: text.to_string(),
    })
}

fn ids(store: &MemoryRowStore) -> Vec<String> {
    store.snapshot().into_iter().map(|row| row.id).collect()
}

#[test]
fn channel_ref_parses_ids_and_names() {
    assert_eq!(ChannelRef::parse("12345"), ChannelRef::Id("12345".to_string()));
    assert_eq!(
        ChannelRef::parse("#addresses"),
        ChannelRef::Name("addresses".to_string())
    );
    assert_eq!(
        ChannelRef::parse("wl-2024"),
        ChannelRef::Name("wl-2024".to_string())
    );
}

#[tokio::test]
async fn ready_resolves_channel_and_bulk_syncs_whitelisted_members() {
    let store = MemoryRowStore::with_rows("r", vec![Row::new("77", "gone")]);
    let mut router = router(&store);

    router
        .handle(ready(vec![
            whitelisted(10, "j"),
            plain(3, "c"),
            whitelisted(2, "b"),
        ]))
        .await;

    assert!(router.context().is_ready());
    assert_eq!(router.context().collection_channel_id(), Some(COLLECTION_ID));
    assert_eq!(ids(&store), vec!["10", "2"]);
    assert!(router.sink().notices.is_empty());
}

#[tokio::test]
async fn ready_for_another_guild_is_ignored() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router
        .handle(BotEvent::Ready {
            guild_name: Some("Elsewhere".to_string()),
            members: vec![whitelisted(2, "b")],
            channels: Vec::new(),
        })
        .await;
    assert!(!router.context().is_ready());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn deferred_messages_survive_a_ready_for_another_guild() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router
        .handle(message("m1", COLLECTION_ID, whitelisted(4, "dee"), ADDRESS))
        .await;
    router
        .handle(BotEvent::Ready {
            guild_name: Some("Elsewhere".to_string()),
            members: Vec::new(),
            channels: Vec::new(),
        })
        .await;
    assert_eq!(router.deferred_len(), 1);

    router.handle(ready(vec![whitelisted(4, "dee")])).await;
    assert_eq!(router.deferred_len(), 0);
    assert_eq!(store.snapshot()[0].address, ADDRESS);
}

#[tokio::test]
async fn gaining_the_role_adds_and_welcomes() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;

    router
        .handle(BotEvent::MemberRoleChanged {
            before: plain(5, "e"),
            after: Member::new(5, "e").with_roles(["member", "whitelisted"]),
        })
        .await;

    assert_eq!(store.snapshot(), vec![Row::new("5", "e").with_timestamp(NOW)]);
    assert_eq!(
        router.sink().notices,
        vec![Notice::DirectMessage {
            member_id: MemberId::new(5),
            text: "hello, send me your address".to_string(),
        }]
    );
}

#[tokio::test]
async fn failed_add_sends_no_welcome() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;
    store.fail_next_write("quota exceeded");

    router
        .handle(BotEvent::MemberRoleChanged {
            before: plain(5, "e"),
            after: whitelisted(5, "e"),
        })
        .await;

    assert!(store.snapshot().is_empty());
    assert!(router.sink().notices.is_empty());
}

#[tokio::test]
async fn losing_the_role_removes_the_row() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router
        .handle(ready(vec![whitelisted(5, "e"), whitelisted(6, "f")]))
        .await;

    router
        .handle(BotEvent::MemberRoleChanged {
            before: whitelisted(5, "e"),
            after: plain(5, "e"),
        })
        .await;

    assert_eq!(ids(&store), vec!["6"]);
}

#[tokio::test]
async fn unrelated_role_changes_do_nothing() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;
    let writes = store.write_count();

    router
        .handle(BotEvent::MemberRoleChanged {
            before: plain(5, "e"),
            after: Member::new(5, "e").with_roles(["artist"]),
        })
        .await;

    assert_eq!(store.write_count(), writes);
    assert!(router.sink().notices.is_empty());
}

#[tokio::test]
async fn role_changes_before_ready_are_skipped() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router
        .handle(BotEvent::MemberRoleChanged {
            before: plain(5, "e"),
            after: whitelisted(5, "e"),
        })
        .await;
    assert_eq!(store.write_count(), 0);
    assert!(router.sink().notices.is_empty());
}

#[tokio::test]
async fn address_message_is_recorded_acknowledged_and_deleted() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;

    router
        .handle(message("m1", COLLECTION_ID, whitelisted(4, "dee"), ADDRESS))
        .await;

    assert_eq!(
        store.snapshot(),
        vec![Row::new("4", "dee").with_address(ADDRESS).with_timestamp(NOW)]
    );
    assert_eq!(
        router.sink().notices,
        vec![
            Notice::Send {
                channel_id: COLLECTION_ID.to_string(),
                text: "Thanks dee, your address has been recorded.".to_string(),
            },
            Notice::DeleteMessage {
                channel_id: COLLECTION_ID.to_string(),
                message_id: "m1".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn failed_address_write_never_acknowledges() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;
    store.fail_next_write("sheet offline");

    router
        .handle(message("m1", COLLECTION_ID, whitelisted(4, "dee"), ADDRESS))
        .await;

    assert!(store.snapshot().is_empty());
    let notices = &router.sink().notices;
    assert_eq!(notices.len(), 2);
    assert!(matches!(&notices[0], Notice::DeleteMessage { message_id, .. } if message_id == "m1"));
    assert!(matches!(&notices[1], Notice::Send { text, .. } if text.starts_with("Sorry dee")));
}

#[tokio::test]
async fn address_messages_outside_the_rules_are_ignored() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;
    let writes = store.write_count();

    // Wrong channel, non-whitelisted author, not a single address token.
    router
        .handle(message("m1", "800", whitelisted(4, "dee"), ADDRESS))
        .await;
    router
        .handle(message("m2", COLLECTION_ID, plain(4, "dee"), ADDRESS))
        .await;
    router
        .handle(message(
            "m3",
            COLLECTION_ID,
            whitelisted(4, "dee"),
            &format!("here {ADDRESS}"),
        ))
        .await;

    assert_eq!(store.write_count(), writes);
    assert!(router.sink().notices.is_empty());
}

#[tokio::test]
async fn messages_before_ready_are_replayed_after_sync() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);

    router
        .handle(message("m1", COLLECTION_ID, whitelisted(4, "dee"), ADDRESS))
        .await;
    assert_eq!(router.deferred_len(), 1);
    assert_eq!(store.write_count(), 0);

    router.handle(ready(vec![whitelisted(4, "dee")])).await;

    assert_eq!(router.deferred_len(), 0);
    let rows = store.snapshot();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].address, ADDRESS);
    assert_eq!(router.sink().notices.len(), 2);
}

#[tokio::test]
async fn deferred_queue_is_bounded() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    for index in 0..DEFERRED_MESSAGE_CAPACITY + 5 {
        router
            .handle(message(
                &format!("m{index}"),
                COLLECTION_ID,
                whitelisted(4, "dee"),
                "hello",
            ))
            .await;
    }
    assert_eq!(router.deferred_len(), DEFERRED_MESSAGE_CAPACITY);
}

#[tokio::test]
async fn ping_gets_pong_even_before_ready() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router
        .handle(message("m1", "800", plain(9, "i"), " PING! "))
        .await;
    assert_eq!(
        router.sink().notices,
        vec![Notice::Send {
            channel_id: "800".to_string(),
            text: "pong!".to_string(),
        }]
    );
    assert_eq!(router.deferred_len(), 0);
}

#[tokio::test]
async fn bot_messages_are_ignored() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router.handle(ready(Vec::new())).await;
    router
        .handle(message("m1", COLLECTION_ID, whitelisted(1, "bot"), "ping!"))
        .await;
    assert!(router.sink().notices.is_empty());
}

#[tokio::test]
async fn joining_member_gets_greeting() {
    let store = MemoryRowStore::new("r");
    let mut router = router(&store);
    router
        .handle(BotEvent::MemberJoined {
            member: plain(8, "hal"),
        })
        .await;
    assert_eq!(
        router.sink().notices,
        vec![Notice::DirectMessage {
            member_id: MemberId::new(8),
            text: "Hi hal, welcome to the server!".to_string(),
        }]
    );
}

#[tokio::test]
async fn failed_bulk_sync_still_completes_ready() {
    let store = MemoryRowStore::with_rows("r", vec![Row::new("2", "b")]);
    let mut router = router(&store);
    store.fail_next_fetch("offline");

    router.handle(ready(vec![whitelisted(3, "c")])).await;

    assert!(router.context().is_ready());
    assert_eq!(store.write_count(), 0);
    assert_eq!(ids(&store), vec!["2"]);
}
