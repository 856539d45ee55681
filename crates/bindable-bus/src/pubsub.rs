use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{BusError, Result};
use crate::message::Message;
use crate::transport::{Compactor, Subscriber, Transport};

thread_local! {
    static SHARED: Rc<PubSub> = Rc::new(PubSub::new());
}

/// Synchronous in-process publish/subscribe bus.
///
/// Outside a [`batch`](Self::batch) scope, `publish` invokes every current
/// subscriber of the channel, in subscription order, before returning. The
/// subscriber list is snapshotted first, so a subscriber may publish or
/// subscribe re-entrantly; subscribers added during delivery only see later
/// messages.
#[derive(Default)]
pub struct PubSub {
    channels: RefCell<HashMap<String, Vec<Subscriber>>>,
    compactors: RefCell<HashMap<String, Compactor>>,
    batch_depth: Cell<usize>,
    pending: RefCell<Vec<(String, Message)>>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bus shared by every model created on this thread without an
    /// explicit transport.
    pub fn shared() -> Rc<PubSub> {
        SHARED.with(Rc::clone)
    }

    /// Run `f` with delivery deferred.
    ///
    /// Messages published inside the scope are queued. When the outermost
    /// scope exits the queue is compacted and delivered in publish order.
    /// Nested scopes are allowed; only the outermost one flushes.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let result = {
            let _guard = BatchGuard::enter(self);
            f()
        };
        if self.batch_depth.get() == 0 {
            self.flush();
        }
        result
    }

    /// Number of subscribers on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .borrow()
            .get(channel)
            .map_or(0, Vec::len)
    }

    /// Number of channels with at least one subscriber.
    pub fn channel_count(&self) -> usize {
        self.channels.borrow().len()
    }

    /// Number of messages waiting for the current batch scope to exit.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    fn deliver(&self, channel: &str, message: &Message) -> usize {
        let subscribers: Vec<Subscriber> = match self.channels.borrow().get(channel) {
            Some(subs) => subs.clone(),
            None => return 0,
        };
        trace!(channel, kind = %message.kind, count = subscribers.len(), "delivering message");
        for subscriber in &subscribers {
            subscriber(message);
        }
        subscribers.len()
    }

    fn flush(&self) {
        let queued = std::mem::take(&mut *self.pending.borrow_mut());
        if queued.is_empty() {
            return;
        }
        let before = queued.len();
        let compacted = self.compact(queued);
        debug!(before, after = compacted.len(), "flushing batched messages");
        for (channel, message) in &compacted {
            self.deliver(channel, message);
        }
    }

    /// Collapse pending messages that share a kind and a compaction key.
    ///
    /// The surviving entry keeps the position of the first message and the
    /// payload of the last one.
    fn compact(&self, queued: Vec<(String, Message)>) -> Vec<(String, Message)> {
        let compactors = self.compactors.borrow().clone();
        let mut out: Vec<(String, Message)> = Vec::with_capacity(queued.len());
        let mut seen: HashMap<(String, String), usize> = HashMap::new();

        for (channel, message) in queued {
            let key = compactors
                .get(&message.kind)
                .and_then(|compactor| compactor(&message, &channel));
            match key {
                Some(key) => match seen.get(&(message.kind.clone(), key.clone())) {
                    Some(&slot) => out[slot] = (channel, message),
                    None => {
                        seen.insert((message.kind.clone(), key), out.len());
                        out.push((channel, message));
                    }
                },
                None => out.push((channel, message)),
            }
        }
        out
    }
}

impl Transport for PubSub {
    fn publish(&self, channel: &str, message: Message) -> usize {
        if self.batch_depth.get() > 0 {
            self.pending
                .borrow_mut()
                .push((channel.to_string(), message));
            return 0;
        }
        self.deliver(channel, &message)
    }

    fn subscribe(&self, channel: &str, subscriber: Subscriber) -> Result<()> {
        if channel.is_empty() {
            return Err(BusError::InvalidChannel(channel.to_string()));
        }
        self.channels
            .borrow_mut()
            .entry(channel.to_string())
            .or_default()
            .push(subscriber);
        Ok(())
    }

    fn register_compactor(&self, kind: &str, compactor: Compactor) {
        self.compactors
            .borrow_mut()
            .insert(kind.to_string(), compactor);
    }

    fn has_compactor(&self, kind: &str) -> bool {
        self.compactors.borrow().contains_key(kind)
    }
}

impl std::fmt::Debug for PubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSub")
            .field("channels", &self.channel_count())
            .field("compactors", &self.compactors.borrow().len())
            .field("batch_depth", &self.batch_depth.get())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Keeps the batch depth balanced even if the scope unwinds.
struct BatchGuard<'a> {
    bus: &'a PubSub,
}

impl<'a> BatchGuard<'a> {
    fn enter(bus: &'a PubSub) -> Self {
        bus.batch_depth.set(bus.batch_depth.get() + 1);
        Self { bus }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.bus.batch_depth.set(self.bus.batch_depth.get() - 1);
    }
}
