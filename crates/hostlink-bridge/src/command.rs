//! Command envelopes
//!
//! A `Command` is created on the caller thread and consumed exactly once on the
//! owner thread. Its `Completion` carries the same id back.

use std::sync::mpsc as std_mpsc;
use std::time::Instant;
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Debug)]
pub struct Command<C> {
    /// Correlation id, unique per issuance
    pub id: Uuid,
    /// When the caller issued the command
    pub issued_at: Instant,
    /// The operation to run
    pub kind: C,
}

impl<C> Command<C> {
    pub fn new(kind: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            issued_at: Instant::now(),
            kind,
        }
    }
}

#[derive(Debug)]
pub struct Completion<T> {
    pub id: Uuid,
    pub value: T,
}

/// One-shot listener for a single command id.
pub(crate) enum Reply<T> {
    Blocking(std_mpsc::SyncSender<Completion<T>>),
    Async(oneshot::Sender<Completion<T>>),
}

impl<T> Reply<T> {
    /// Returns false when the caller already gave up on the command.
    pub(crate) fn send(self, completion: Completion<T>) -> bool {
        match self {
            Reply::Blocking(tx) => tx.try_send(completion).is_ok(),
            Reply::Async(tx) => tx.send(completion).is_ok(),
        }
    }
}

pub(crate) struct Envelope<C, T> {
    pub(crate) command: Command<C>,
    pub(crate) reply: Reply<T>,
}
