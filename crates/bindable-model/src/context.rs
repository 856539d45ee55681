//! Per-model state shared by every node of one tree.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;
use tracing::info;

use bindable_bus::Transport;
use bindable_chain::ChannelNamespace;

use crate::config::ModelConfig;
use crate::notifier::{chain_changed_compactor, CHAIN_CHANGED};

/// State owned by one model and reachable from each of its nodes.
///
/// The observed-chain set keeps insertion order and is never pruned.
pub(crate) struct ModelContext {
    pub(crate) namespace: ChannelNamespace,
    pub(crate) transport: Rc<dyn Transport>,
    pub(crate) config: ModelConfig,
    pub(crate) observed: RefCell<IndexSet<String>>,
}

impl ModelContext {
    pub(crate) fn new(transport: Rc<dyn Transport>, config: ModelConfig) -> Self {
        if !transport.has_compactor(CHAIN_CHANGED) {
            transport.register_compactor(CHAIN_CHANGED, chain_changed_compactor());
        }
        let namespace = ChannelNamespace::allocate(config.prefix.clone());
        info!(model = %namespace, "model created");
        Self {
            namespace,
            transport,
            config,
            observed: RefCell::new(IndexSet::new()),
        }
    }
}
