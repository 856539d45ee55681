//! The model root handle.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use serde_json::Value;

use bindable_bus::{PubSub, Transport};
use bindable_chain::ChannelNamespace;

use crate::config::ModelConfig;
use crate::context::ModelContext;
use crate::error::{ModelError, Result};
use crate::expression::ExpressionRegistry;
use crate::node::{wrap_value, Node, Slot};

/// An observable tree.
///
/// `Model` derefs to its root [`Node`], so every node operation is available
/// on the model itself. Cloning a model yields another handle to the same
/// tree, subscriptions, and expressions.
#[derive(Clone)]
pub struct Model {
    pub(crate) root: Node,
    pub(crate) ctx: Rc<ModelContext>,
    pub(crate) expressions: Rc<RefCell<ExpressionRegistry>>,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Model {
    /// Wrap `value` on this thread's shared bus with the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotObservable`] unless `value` is an object or array.
    pub fn wrap(value: impl Into<Value>) -> Result<Self> {
        Self::with_transport(value, PubSub::shared(), ModelConfig::default())
    }

    /// Wrap `value`, publishing through `transport`.
    ///
    /// The value is validated before the model counter is touched, so a
    /// rejected value does not consume a channel namespace.
    pub fn with_transport(
        value: impl Into<Value>,
        transport: Rc<dyn Transport>,
        config: ModelConfig,
    ) -> Result<Self> {
        let value = value.into();
        if !matches!(value, Value::Object(_) | Value::Array(_)) {
            return Err(ModelError::NotObservable {
                kind: kind_of(&value),
            });
        }
        config.validate()?;

        let ctx = Rc::new(ModelContext::new(transport, config));
        let Slot::Node(root) = wrap_value(value, "", &ctx) else {
            return Err(ModelError::NotObservable { kind: "primitive" });
        };
        Ok(Self {
            root,
            ctx,
            expressions: Rc::new(RefCell::new(ExpressionRegistry::default())),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// This model's value of the process-wide model counter.
    pub fn index(&self) -> u64 {
        self.ctx.namespace.index()
    }

    pub fn namespace(&self) -> &ChannelNamespace {
        &self.ctx.namespace
    }

    pub fn config(&self) -> &ModelConfig {
        &self.ctx.config
    }
}

impl Deref for Model {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.root
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("namespace", &self.ctx.namespace.to_string())
            .field("root", &self.root)
            .field("observed", &self.ctx.observed.borrow().len())
            .finish()
    }
}
