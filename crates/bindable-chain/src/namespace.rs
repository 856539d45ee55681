//! Channel namespaces and the process-wide model counter.
//!
//! Each model allocates one [`ChannelNamespace`] when it is created. The
//! namespace takes the next value of a process-wide counter, so channel names
//! of distinct models never collide. The counter starts at 0 when the process
//! starts and is only ever incremented; it is never reset.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::chain::CHAIN_SEPARATOR;

/// Default prefix of every channel name.
pub const MODEL_PREFIX: &str = "Model";

static MODEL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Number of namespaces allocated so far in this process.
pub fn models_created() -> u64 {
    MODEL_COUNTER.load(Ordering::SeqCst)
}

/// The channel-name space owned by one model.
///
/// Channel names have the shape `prefix.index.chain`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelNamespace {
    prefix: String,
    index: u64,
    target: String,
}

impl ChannelNamespace {
    /// Allocate a fresh namespace, consuming one value of the model counter.
    pub fn allocate(prefix: impl Into<String>) -> Self {
        let index = MODEL_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::with_index(prefix, index)
    }

    /// Build a namespace for an explicit index without touching the counter.
    pub fn with_index(prefix: impl Into<String>, index: u64) -> Self {
        let prefix = prefix.into();
        let target = format!("{prefix}{CHAIN_SEPARATOR}{index}{CHAIN_SEPARATOR}");
        Self {
            prefix,
            index,
            target,
        }
    }

    /// Channel name for `chain` inside this namespace.
    ///
    /// ```
    /// use bindable_chain::ChannelNamespace;
    ///
    /// let ns = ChannelNamespace::with_index("Model", 3);
    /// assert_eq!(ns.channel_for("a.b"), "Model.3.a.b");
    /// assert_eq!(ns.channel_for("*"), "Model.3.*");
    /// ```
    pub fn channel_for(&self, chain: &str) -> String {
        format!("{}{chain}", self.target)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn index(&self) -> u64 {
        self.index
    }
}

impl std::fmt::Display for ChannelNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{CHAIN_SEPARATOR}{}", self.prefix, self.index)
    }
}
