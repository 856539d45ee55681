//! The [`Transport`] trait: the narrow interface models publish through.

use std::rc::Rc;

use crate::error::Result;
use crate::message::Message;

/// Callback invoked with every message published on a subscribed channel.
pub type Subscriber = Rc<dyn Fn(&Message)>;

/// Compaction rule for one message kind.
///
/// Receives a pending message and its channel and returns a compaction key.
/// Pending messages of the same kind that share a key collapse into one.
/// Returning `None` keeps the message as is.
pub type Compactor = Rc<dyn Fn(&Message, &str) -> Option<String>>;

/// Topic-based publish/subscribe transport.
///
/// Implementations are single-threaded: subscribers are `Rc` callbacks and
/// may re-enter the transport (publish or subscribe) while being invoked.
pub trait Transport {
    /// Publish `message` on `channel`.
    ///
    /// Returns the number of subscribers the message was delivered to. A
    /// message that was queued rather than delivered counts as zero.
    fn publish(&self, channel: &str, message: Message) -> usize;

    /// Subscribe `subscriber` to every later message on `channel`.
    fn subscribe(&self, channel: &str, subscriber: Subscriber) -> Result<()>;

    /// Register (or replace) the compactor for messages of `kind`.
    fn register_compactor(&self, kind: &str, compactor: Compactor);

    /// Returns `true` if a compactor is registered for `kind`.
    fn has_compactor(&self, kind: &str) -> bool;
}
