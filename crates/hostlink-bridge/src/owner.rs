//! Owner thread side of the bridge
//!
//! The owner thread drains its queue strictly one command at a time, in the order
//! the queue delivers them. Commands sent from one caller thread therefore run in
//! emission order; there is no ordering across caller threads.
//!
//! Once the router asks to stop, the loop closes its queue. Commands still queued
//! and commands sent afterwards resolve with `BridgeError::OwnerGone`.

use parking_lot::RwLock;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::bridge::CommandBridge;
use crate::command::{Command, Completion, Envelope};

/// Closed table of operations that may only run on the owner thread.
pub trait Router {
    type Command: std::fmt::Debug + Send + 'static;
    type Output: Send + 'static;
    type Error: Send + 'static;

    fn dispatch(&mut self, command: Self::Command) -> Result<Self::Output, Self::Error>;

    /// Checked before every dispatch. `OwnerLoop::run` returns once this is true.
    fn should_stop(&self) -> bool {
        false
    }
}

pub(crate) type Outcome<R> = Result<<R as Router>::Output, <R as Router>::Error>;
pub(crate) type Queued<R> = Envelope<<R as Router>::Command, Outcome<R>>;

/// Thread currently serving the loop, shared with every bridge handle.
pub(crate) type OwnerSlot = Arc<RwLock<Option<ThreadId>>>;

/// Marks the loop's thread in the shared slot until dropped.
struct Claim {
    slot: OwnerSlot,
    thread: ThreadId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut owner = self.slot.write();
        if *owner == Some(self.thread) {
            *owner = None;
        }
    }
}

/// Create a bridge and the loop that serves it.
///
/// The loop binds to the thread that last ran or pumped it. While it is bound,
/// blocking calls made through the bridge on that thread fail with
/// `BridgeError::Reentrant`. Stopping or dropping the loop releases the thread.
pub fn channel<R: Router>(router: R) -> (CommandBridge<R>, OwnerLoop<R>) {
    let (tx, rx) = std_mpsc::channel();
    let slot: OwnerSlot = Arc::new(RwLock::new(None));

    let bridge = CommandBridge::new(tx, Arc::clone(&slot));
    let owner_loop = OwnerLoop {
        router,
        queue: Some(rx),
        slot,
        claim: None,
        dispatched: 0,
    };

    (bridge, owner_loop)
}

pub struct OwnerLoop<R: Router> {
    router: R,
    /// `None` once the loop has stopped
    queue: Option<std_mpsc::Receiver<Queued<R>>>,
    slot: OwnerSlot,
    claim: Option<Claim>,
    dispatched: u64,
}

impl<R: Router> OwnerLoop<R> {
    /// Serve commands until the router asks to stop or every bridge handle is gone.
    /// Hands the router back so the caller can tear down owner-thread state.
    pub fn run(mut self) -> R {
        self.claim_thread();
        tracing::info!("Owner loop started");

        while !self.router.should_stop() {
            let Some(queue) = &self.queue else { break };
            match queue.recv() {
                Ok(envelope) => self.deliver(envelope),
                Err(_) => {
                    tracing::debug!("All bridge handles dropped");
                    break;
                }
            }
        }

        self.close();
        tracing::info!(dispatched = self.dispatched, "Owner loop stopped");
        self.router
    }

    /// Dispatch everything currently queued without blocking.
    ///
    /// Meant for hosts that already run their own event loop and call this from an
    /// idle or timer callback.
    pub fn pump(&mut self) -> usize {
        self.claim_thread();

        let mut count = 0;
        while !self.router.should_stop() {
            let Some(queue) = &self.queue else { break };
            match queue.try_recv() {
                Ok(envelope) => {
                    self.deliver(envelope);
                    count += 1;
                }
                Err(_) => break,
            }
        }

        if self.router.should_stop() {
            self.close();
        }
        count
    }

    /// Wait up to `timeout` for one command and dispatch it.
    pub fn pump_timeout(&mut self, timeout: Duration) -> bool {
        self.claim_thread();

        if self.router.should_stop() {
            self.close();
            return false;
        }
        let Some(queue) = &self.queue else {
            return false;
        };

        let delivered = match queue.recv_timeout(timeout) {
            Ok(envelope) => {
                self.deliver(envelope);
                true
            }
            Err(_) => false,
        };

        if self.router.should_stop() {
            self.close();
        }
        delivered
    }

    /// Run one command through the router and build its completion.
    pub fn dispatch(&mut self, command: Command<R::Command>) -> Completion<Outcome<R>> {
        tracing::debug!(
            command_id = %command.id,
            command = ?command.kind,
            queued_for = ?command.issued_at.elapsed(),
            "Dispatching command"
        );

        let value = self.router.dispatch(command.kind);
        self.dispatched += 1;

        Completion {
            id: command.id,
            value,
        }
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn is_stopped(&self) -> bool {
        self.router.should_stop()
    }

    /// Whether the queue has been closed after a stop.
    pub fn is_closed(&self) -> bool {
        self.queue.is_none()
    }

    fn deliver(&mut self, envelope: Queued<R>) {
        let Envelope { command, reply } = envelope;
        let completion = self.dispatch(command);
        let id = completion.id;

        if !reply.send(completion) {
            tracing::debug!(command_id = %id, "Caller abandoned command, discarding result");
        }
    }

    /// Drop the queue along with every command still in it, then release the thread.
    fn close(&mut self) {
        if let Some(queue) = self.queue.take() {
            let abandoned = queue.try_iter().count();
            if abandoned > 0 {
                tracing::warn!(abandoned, "Owner loop stopped with commands still queued");
            }
        }
        self.claim = None;
    }

    fn claim_thread(&mut self) {
        let current = thread::current().id();
        if let Some(claim) = &self.claim {
            if claim.thread == current {
                return;
            }
            tracing::warn!(from = ?claim.thread, to = ?current, "Owner loop moved to another thread");
        }

        *self.slot.write() = Some(current);
        self.claim = Some(Claim {
            slot: Arc::clone(&self.slot),
            thread: current,
        });
    }
}
