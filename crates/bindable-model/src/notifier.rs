//! Change notification: related-chain fan-out and chain-addressed access.
//!
//! A write to chain `c` is published on the channel of every *related*
//! chain, in this order:
//!
//! 1. the wildcard `"*"`,
//! 2. every prefix of `c`, root to leaf (`"a"`, `"a.b"`, `"a.b.2"`),
//! 3. every observed chain that starts with `c` as a literal string, in the
//!    order those chains were first observed.
//!
//! Rule 2 lets ancestors see descendant writes; rule 3 lets descendants see
//! an ancestor being replaced wholesale.

use std::rc::Rc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use bindable_bus::{Compactor, Message, Subscriber};
use bindable_chain::{is_prefix_of, prefixes, segments, WILDCARD};

use crate::context::ModelContext;
use crate::error::Result;
use crate::model::Model;
use crate::node::Slot;

/// Message kind published for every chain change.
pub const CHAIN_CHANGED: &str = "chainChanged";

/// Payload delivered to chain subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainChanged {
    /// The related chain this event was published for.
    pub chain: String,
}

/// Callback registered through [`Model::on_change`].
pub type ChangeCallback = Rc<dyn Fn(&ChainChanged)>;

/// Compaction rule for [`CHAIN_CHANGED`] messages: pending messages on the
/// same channel collapse into one.
pub fn chain_changed_compactor() -> Compactor {
    Rc::new(|message: &Message, channel: &str| {
        message
            .is_kind(CHAIN_CHANGED)
            .then(|| channel.to_string())
    })
}

impl ModelContext {
    pub(crate) fn related_chains(&self, chain: &str) -> Vec<String> {
        let mut related = IndexSet::new();
        related.insert(WILDCARD.to_string());
        related.extend(prefixes(chain));
        for observed in self.observed.borrow().iter() {
            if is_prefix_of(chain, observed) {
                related.insert(observed.clone());
            }
        }
        related.into_iter().collect()
    }

    pub(crate) fn notify(&self, chain: &str) -> usize {
        let related = self.related_chains(chain);
        debug!(model = %self.namespace, chain, related = related.len(), "chain changed");

        let mut delivered = 0;
        for related_chain in related {
            let channel = self.namespace.channel_for(&related_chain);
            trace!(channel = %channel, "publishing chain change");
            let message = Message::new(CHAIN_CHANGED, serde_json::json!({ "chain": related_chain }));
            delivered += self.transport.publish(&channel, message);
        }
        delivered
    }

    pub(crate) fn subscribe(&self, chain: &str, callback: ChangeCallback) -> Result<()> {
        self.observed.borrow_mut().insert(chain.to_string());
        let subscriber: Subscriber = Rc::new(move |message: &Message| {
            if !message.is_kind(CHAIN_CHANGED) {
                return;
            }
            match message.decode::<ChainChanged>() {
                Ok(event) => callback(&event),
                Err(err) => warn!(%err, "dropping malformed chain message"),
            }
        });
        self.transport
            .subscribe(&self.namespace.channel_for(chain), subscriber)?;
        Ok(())
    }
}

impl Model {
    /// Publish a change of `chain` to every related subscriber.
    ///
    /// Subscribers run synchronously, before this returns. Returns the number
    /// of deliveries made.
    pub fn notify(&self, chain: &str) -> usize {
        self.ctx.notify(chain)
    }

    /// Subscribe to changes of `chain`.
    ///
    /// `"*"` observes every change in the model. The chain is recorded as
    /// observed, so later writes to any of its ancestors notify it too.
    pub fn on_change(&self, chain: &str, callback: impl Fn(&ChainChanged) + 'static) -> Result<()> {
        self.ctx.subscribe(chain, Rc::new(callback))
    }

    pub(crate) fn on_change_shared(&self, chain: &str, callback: ChangeCallback) -> Result<()> {
        self.ctx.subscribe(chain, callback)
    }

    /// Chains that a change of `chain` would be published on, in order.
    pub fn related_chains(&self, chain: &str) -> Vec<String> {
        self.ctx.related_chains(chain)
    }

    /// Every chain subscribed to so far, in registration order.
    pub fn observed_chains(&self) -> Vec<String> {
        self.ctx.observed.borrow().iter().cloned().collect()
    }

    /// Resolve `chain` from the root.
    ///
    /// The empty chain is the root itself. Returns `None` as soon as a step
    /// is missing or lands on a primitive (including null) before the last
    /// segment.
    pub fn get_chain_value(&self, chain: &str) -> Option<Slot> {
        let mut current = Slot::Node(self.root.clone());
        if chain.is_empty() {
            return Some(current);
        }
        for segment in segments(chain) {
            let node = current.into_node()?;
            current = node.get(segment)?;
        }
        Some(current)
    }

    /// Resolve `chain` and copy the result out as a plain value.
    pub fn value_at(&self, chain: &str) -> Option<Value> {
        self.get_chain_value(chain).map(|slot| slot.to_value())
    }

    /// Write `value` at `chain` through the observed path.
    ///
    /// Returns `false` without writing when the chain is empty, when an
    /// intermediate step does not resolve to an object or array, or when the
    /// target node rejects the write.
    pub fn set_chain_value(&self, chain: &str, value: impl Into<Value>) -> bool {
        if chain.is_empty() {
            warn!(model = %self.ctx.namespace, "refusing to replace the model root");
            return false;
        }
        let parts = segments(chain);
        let Some((last, parents)) = parts.split_last() else {
            return false;
        };

        let mut node = self.root.clone();
        for segment in parents {
            match node.get(segment) {
                Some(Slot::Node(child)) => node = child,
                _ => return false,
            }
        }

        match node.set(last, value) {
            Ok(()) => true,
            Err(err) => {
                warn!(model = %self.ctx.namespace, chain, %err, "chain write rejected");
                false
            }
        }
    }
}
