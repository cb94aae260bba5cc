//! Shared rosterkeep library exports so the binary and integration tests agree on behavior.

pub mod config;
pub mod ipc;
mod lock;
pub mod roster;
pub mod router;
pub mod store;
pub mod telemetry;

pub(crate) use lock::lock_or_recover;
pub use roster::{
    spawn_roster_actor, Member, MemberId, Reconciler, RosterError, RosterHandle, Row,
    WhitelistRoles,
};
pub use store::{RowStore, StoreError};
