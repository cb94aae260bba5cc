//! Roster reconciliation against the row store.
//!
//! Bulk sync runs two passes over the id-sorted persisted table:
//!
//! 1. **Prune** (reverse scan): drop rows whose id is no longer desired and rows that
//!    repeat the id of the row right before them. Scanning from the back keeps the
//!    remaining indices valid while removing, and the first copy of a duplicate wins.
//! 2. **Merge** (single cursor): walk the desired rows in id order; insert missing
//!    ones at the cursor, rename changed ones in place, leave the rest untouched.
//!
//! After pruning every persisted id is desired and unique, so the cursor into the
//! persisted table and the position in the desired list always line up.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use super::clock::Clock;
use super::member::{Member, MemberId};
use super::row::{sort_by_id, Row};
use crate::store::{RowStore, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub removed_stale: usize,
    pub removed_duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    pub renamed: usize,
    pub unchanged: usize,
    pub removed_stale: usize,
    pub removed_duplicates: usize,
    pub total: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.renamed == 0 && self.removed_stale == 0 && self.removed_duplicates == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressOutcome {
    /// The member had no row yet; one was created around the address.
    Created,
    Updated,
}

/// Remove rows that are not desired and collapse adjacent duplicate ids.
///
/// `old` must be sorted by id. The stale check and the duplicate check share one
/// reverse pass so removals never shift an index that is still to be visited.
pub fn prune_rows(old: &mut Vec<Row>, desired_ids: &HashSet<&str>) -> PruneStats {
    let mut stats = PruneStats::default();
    let mut index = old.len();
    while index > 0 {
        index -= 1;
        if !desired_ids.contains(old[index].id.as_str()) {
            let row = old.remove(index);
            warn!(id = %row.id, name = %row.name, "stale roster row removed");
            stats.removed_stale += 1;
            continue;
        }
        if index > 0 && old[index - 1].id == old[index].id {
            let row = old.remove(index);
            warn!(id = %row.id, "duplicate roster id collapsed");
            stats.removed_duplicates += 1;
        }
    }
    stats
}

/// Merge id-sorted desired rows into a pruned, id-sorted table in place.
///
/// Returns `(added, renamed, unchanged)`. Inserted and renamed rows get `timestamp`;
/// untouched rows keep their address and timestamp.
pub fn merge_rows(old: &mut Vec<Row>, new: &[Row], timestamp: &str) -> (usize, usize, usize) {
    let (mut added, mut renamed, mut unchanged) = (0, 0, 0);
    for (cursor, desired) in new.iter().enumerate() {
        match old.get_mut(cursor) {
            Some(row) if row.id == desired.id => {
                if row.name != desired.name {
                    debug!(id = %row.id, from = %row.name, to = %desired.name, "roster row renamed");
                    row.name.clone_from(&desired.name);
                    row.timestamp = timestamp.to_string();
                    renamed += 1;
                } else {
                    unchanged += 1;
                }
            }
            _ => {
                debug!(id = %desired.id, name = %desired.name, "roster row inserted");
                old.insert(cursor, desired.clone().with_timestamp(timestamp));
                added += 1;
            }
        }
    }
    (added, renamed, unchanged)
}

/// Applies roster operations to a [`RowStore`].
///
/// Every method is a full fetch-compute-write cycle and takes `&mut self`; sharing a
/// reconciler between tasks must go through the roster actor.
pub struct Reconciler<S, C> {
    store: S,
    clock: C,
}

impl<S: RowStore, C: Clock> Reconciler<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Reconcile the whole table against the desired member set.
    ///
    /// A failed fetch aborts before anything is merged or written.
    pub fn bulk_sync(&mut self, desired: &[Member]) -> Result<SyncReport, StoreError> {
        let mut by_id = BTreeMap::new();
        for member in desired {
            by_id.insert(member.row_id(), member.name.clone());
        }
        let new: Vec<Row> = by_id
            .into_iter()
            .map(|(id, name)| Row::new(id, name))
            .collect();

        let mut old = self.store.fetch_range()?;
        sort_by_id(&mut old);

        let desired_ids: HashSet<&str> = new.iter().map(|row| row.id.as_str()).collect();
        let pruned = prune_rows(&mut old, &desired_ids);
        let timestamp = self.clock.timestamp();
        let (added, renamed, unchanged) = merge_rows(&mut old, &new, &timestamp);

        self.store.write_range(&old)?;

        let report = SyncReport {
            added,
            renamed,
            unchanged,
            removed_stale: pruned.removed_stale,
            removed_duplicates: pruned.removed_duplicates,
            total: old.len(),
        };
        info!(
            store = %self.store.describe(),
            added = report.added,
            renamed = report.renamed,
            unchanged = report.unchanged,
            removed_stale = report.removed_stale,
            removed_duplicates = report.removed_duplicates,
            total = report.total,
            "roster bulk sync written"
        );
        Ok(report)
    }

    /// Add one member. An existing row is left exactly as it is.
    pub fn add_one(&mut self, member: &Member) -> Result<AddOutcome, StoreError> {
        let id = member.row_id();
        let mut rows = self.store.fetch_range()?;
        if rows.iter().any(|row| row.id == id) {
            info!(id = %id, "member already on roster; nothing to add");
            return Ok(AddOutcome::AlreadyPresent);
        }

        rows.push(Row::new(id.as_str(), member.name.as_str()).with_timestamp(self.clock.timestamp()));
        sort_by_id(&mut rows);
        self.store.write_range(&rows)?;
        info!(id = %id, name = %member.name, total = rows.len(), "member added to roster");
        Ok(AddOutcome::Added)
    }

    /// Remove the first row for `member_id`. Order of the remaining rows is kept.
    pub fn remove_one(&mut self, member_id: MemberId) -> Result<RemoveOutcome, StoreError> {
        let id = member_id.to_string();
        let mut rows = self.store.fetch_range()?;
        let Some(index) = rows.iter().position(|row| row.id == id) else {
            info!(id = %id, "member not on roster; nothing to remove");
            return Ok(RemoveOutcome::NotFound);
        };

        rows.remove(index);
        self.store.write_range(&rows)?;
        info!(id = %id, total = rows.len(), "member removed from roster");
        Ok(RemoveOutcome::Removed)
    }

    /// Store `address` on the member's row, creating the row if the member has none.
    pub fn record_address(
        &mut self,
        member: &Member,
        address: &str,
    ) -> Result<AddressOutcome, StoreError> {
        let id = member.row_id();
        let mut rows = self.store.fetch_range()?;
        let timestamp = self.clock.timestamp();

        let outcome = match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.address = address.to_string();
                row.timestamp = timestamp;
                AddressOutcome::Updated
            }
            None => {
                rows.push(
                    Row::new(id.as_str(), member.name.as_str())
                        .with_address(address)
                        .with_timestamp(timestamp),
                );
                AddressOutcome::Created
            }
        };

        sort_by_id(&mut rows);
        self.store.write_range(&rows)?;
        info!(id = %id, outcome = ?outcome, "member address recorded");
        Ok(outcome)
    }
}
