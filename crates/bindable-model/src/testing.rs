//! Shared helpers for unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use bindable_bus::PubSub;

use crate::config::ModelConfig;
use crate::model::Model;
use crate::notifier::ChainChanged;

/// A model on its own private bus.
pub(crate) fn isolated(value: Value) -> Model {
    isolated_with(value, ModelConfig::default())
}

pub(crate) fn isolated_with(value: Value, config: ModelConfig) -> Model {
    Model::with_transport(value, Rc::new(PubSub::new()), config).unwrap()
}

/// Subscribe to `chain` and collect the chain of every event received.
pub(crate) fn record(model: &Model, chain: &str) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    model
        .on_change(chain, move |event: &ChainChanged| {
            sink.borrow_mut().push(event.chain.clone())
        })
        .unwrap();
    log
}
