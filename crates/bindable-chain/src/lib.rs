//! Chain addressing for bindable models.
//!
//! A *chain* is a dotted path naming a location inside an observed tree:
//! `"a.b.2"` is index 2 of property `b` of property `a`. The empty chain is
//! the root itself. Every model owns a [`ChannelNamespace`] that maps chains
//! to transport channel names which never collide across models.
//!
//! # Modules
//!
//! - [`chain`] -- Pure helpers: [`extend`], [`segments`], [`prefixes`]
//! - [`namespace`] -- [`ChannelNamespace`] and the process-wide model counter

pub mod chain;
pub mod namespace;

pub use chain::{extend, is_prefix_of, prefixes, segments, CHAIN_SEPARATOR, WILDCARD};
pub use namespace::{models_created, ChannelNamespace, MODEL_PREFIX};
