//! In-process publish/subscribe transport for bindable models.
//!
//! Models never talk to subscribers directly: they publish [`Message`]s on
//! named channels through the [`Transport`] trait. [`PubSub`] is the
//! synchronous, single-threaded implementation shipped with the workspace.
//!
//! # Delivery
//!
//! Publishing invokes every subscriber of the channel before `publish`
//! returns. Inside a [`PubSub::batch`] scope messages are queued instead and
//! flushed when the outermost scope exits; registered compactors collapse
//! redundant pending messages at that point.
//!
//! # Modules
//!
//! - [`error`] -- [`BusError`]
//! - [`message`] -- The [`Message`] envelope
//! - [`transport`] -- The [`Transport`] trait consumed by models
//! - [`pubsub`] -- [`PubSub`], the in-process implementation

pub mod error;
pub mod message;
pub mod pubsub;
pub mod transport;

pub use error::{BusError, Result};
pub use message::Message;
pub use pubsub::PubSub;
pub use transport::{Compactor, Subscriber, Transport};
