//! Hostlink Command Bridge
//!
//! Lets any thread run an operation on the single owner thread (the thread that owns
//! all window/UI state) and wait for the correlated result.
//!
//! ```text
//! caller thread ──Envelope{Command, reply}──▶ owner queue ──▶ Router::dispatch
//!       ▲                                                          │
//!       └──────────────── Completion{id, value} ◀──────────────────┘
//! ```
//!
//! There is no shared pending table: each envelope carries its own one-shot reply
//! channel, so correlation travels with the queued event.

mod bridge;
mod command;
mod error;
mod owner;

pub use bridge::{CommandBridge, Pending};
pub use command::{Command, Completion};
pub use error::BridgeError;
pub use owner::{channel, OwnerLoop, Router};

pub type Result<T, E> = std::result::Result<T, BridgeError<E>>;
