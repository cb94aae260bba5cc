//! Roster data model and the reconciliation engine that keeps the row store in step
//! with whitelist role holders.
//!
//! The table is the unit of persistence: every operation fetches the full range,
//! computes the new table in memory, and writes the full range back. All operations
//! funnel through the [`actor`] mailbox so only one read-modify-write cycle runs at a time.

pub mod actor;
pub mod clock;
pub mod member;
pub mod reconcile;
pub mod row;

pub use actor::{spawn_roster_actor, RosterCommand, RosterError, RosterHandle};
pub use clock::{Clock, FixedClock, SystemClock};
pub use member::{Member, MemberId, WhitelistRoles};
pub use reconcile::{
    merge_rows, prune_rows, AddOutcome, AddressOutcome, PruneStats, Reconciler, RemoveOutcome,
    SyncReport,
};
pub use row::{sort_by_id, Row, ROW_WIDTH};
