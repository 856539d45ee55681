//! Observable JSON trees.
//!
//! A [`Model`] wraps an object or array into a tree of [`Node`]s. Every write
//! made through the tree publishes a `chainChanged` message for each chain
//! related to the one written, so subscribers can watch any location by its
//! dotted chain. Array mutators are intercepted the same way, and named
//! expressions bundle a computed value with the chains it depends on.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use bindable_model::Model;
//! use serde_json::json;
//!
//! let model = Model::wrap(json!({"user": {"name": "ada"}})).unwrap();
//! let seen = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&seen);
//! model.on_change("user.name", move |_| counter.set(counter.get() + 1)).unwrap();
//!
//! model.set_chain_value("user", json!({"name": "grace"}));
//! assert_eq!(seen.get(), 1);
//! ```
//!
//! # Modules
//!
//! - [`node`] -- [`Node`], [`Slot`], and property definitions
//! - [`array`] -- [`ArrayOp`] interception and notify policies
//! - [`notifier`] -- Related-chain fan-out and chain-addressed reads/writes
//! - [`expression`] -- Named expressions
//! - [`snapshot`] -- Detached copies via serde
//! - [`model`] -- The [`Model`] root handle
//! - [`config`] -- [`ModelConfig`]

pub mod array;
pub mod config;
mod context;
pub mod error;
pub mod expression;
pub mod model;
pub mod node;
pub mod notifier;
pub mod snapshot;

#[cfg(test)]
mod testing;

pub use array::{ArrayOp, ArrayOutput, Comparator, NotifyPolicy};
pub use config::{ModelConfig, DEFAULT_MAX_ARRAY_LENGTH};
pub use error::{ModelError, Result};
pub use expression::ExpressionFn;
pub use model::Model;
pub use node::{Node, PropertyDescriptor, Setter, Slot, LENGTH_KEY};
pub use notifier::{chain_changed_compactor, ChainChanged, ChangeCallback, CHAIN_CHANGED};
