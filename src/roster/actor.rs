//! Single-writer mailbox around the [`Reconciler`].
//!
//! The store has no compare-and-swap, so two overlapping read-modify-write cycles
//! would lose updates. The actor owns the reconciler on a blocking thread and works
//! through one command at a time; [`RosterHandle`] clones only ever enqueue.

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::clock::Clock;
use super::member::{Member, MemberId};
use super::reconcile::{AddOutcome, AddressOutcome, Reconciler, RemoveOutcome, SyncReport};
use crate::store::{RowStore, StoreError};

pub type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

pub enum RosterCommand {
    BulkSync {
        desired: Vec<Member>,
        reply: Reply<SyncReport>,
    },
    AddOne {
        member: Member,
        reply: Reply<AddOutcome>,
    },
    RemoveOne {
        member_id: MemberId,
        reply: Reply<RemoveOutcome>,
    },
    RecordAddress {
        member: Member,
        address: String,
        reply: Reply<AddressOutcome>,
    },
}

impl RosterCommand {
    fn label(&self) -> &'static str {
        match self {
            Self::BulkSync { .. } => "bulk_sync",
            Self::AddOne { .. } => "add_one",
            Self::RemoveOne { .. } => "remove_one",
            Self::RecordAddress { .. } => "record_address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    Store(StoreError),
    /// The actor has stopped and can no longer take commands.
    Unavailable,
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Unavailable => write!(f, "roster actor is not running"),
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Unavailable => None,
        }
    }
}

impl From<StoreError> for RosterError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

struct RosterActor<S, C> {
    reconciler: Reconciler<S, C>,
    inbox: mpsc::Receiver<RosterCommand>,
}

impl<S: RowStore, C: Clock> RosterActor<S, C> {
    fn run(mut self) {
        while let Some(command) = self.inbox.blocking_recv() {
            let label = command.label();
            debug!(command = label, "roster command started");
            self.handle(command);
            debug!(command = label, "roster command finished");
        }
        debug!("roster actor inbox closed");
    }

    fn handle(&mut self, command: RosterCommand) {
        // A dropped reply receiver means the caller gave up; the write already happened.
        match command {
            RosterCommand::BulkSync { desired, reply } => {
                let _ = reply.send(self.reconciler.bulk_sync(&desired));
            }
            RosterCommand::AddOne { member, reply } => {
                let _ = reply.send(self.reconciler.add_one(&member));
            }
            RosterCommand::RemoveOne { member_id, reply } => {
                let _ = reply.send(self.reconciler.remove_one(member_id));
            }
            RosterCommand::RecordAddress {
                member,
                address,
                reply,
            } => {
                let _ = reply.send(self.reconciler.record_address(&member, &address));
            }
        }
    }
}

/// Start the roster actor on the blocking pool.
///
/// The actor stops once every [`RosterHandle`] clone is dropped and the queue drains.
/// Must be called from within a tokio runtime.
pub fn spawn_roster_actor<S, C>(
    reconciler: Reconciler<S, C>,
    capacity: usize,
) -> (RosterHandle, JoinHandle<()>)
where
    S: RowStore + 'static,
    C: Clock + 'static,
{
    let (tx, inbox) = mpsc::channel(capacity.max(1));
    let actor = RosterActor { reconciler, inbox };
    let task = tokio::task::spawn_blocking(move || actor.run());
    (RosterHandle { tx }, task)
}

#[derive(Debug, Clone)]
pub struct RosterHandle {
    tx: mpsc::Sender<RosterCommand>,
}

impl RosterHandle {
    pub async fn bulk_sync(&self, desired: Vec<Member>) -> Result<SyncReport, RosterError> {
        self.request(|reply| RosterCommand::BulkSync { desired, reply })
            .await
    }

    pub async fn add_one(&self, member: Member) -> Result<AddOutcome, RosterError> {
        self.request(|reply| RosterCommand::AddOne { member, reply })
            .await
    }

    pub async fn remove_one(&self, member_id: MemberId) -> Result<RemoveOutcome, RosterError> {
        self.request(|reply| RosterCommand::RemoveOne { member_id, reply })
            .await
    }

    pub async fn record_address(
        &self,
        member: Member,
        address: String,
    ) -> Result<AddressOutcome, RosterError> {
        self.request(|reply| RosterCommand::RecordAddress {
            member,
            address,
            reply,
        })
        .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> RosterCommand,
    ) -> Result<T, RosterError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| RosterError::Unavailable)?;
        response
            .await
            .map_err(|_| RosterError::Unavailable)?
            .map_err(RosterError::Store)
    }
}

impl fmt::Debug for RosterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
