//! Named expressions: computed values tied to the chains they depend on.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::notifier::{ChainChanged, ChangeCallback};

/// Callback computing an expression's value from the model.
pub type ExpressionFn = Rc<dyn Fn(&Model) -> Value>;

#[derive(Clone)]
struct Expression {
    watch_chains: Vec<String>,
    callback: ExpressionFn,
}

/// Expressions registered on one model, keyed by name.
#[derive(Default)]
pub(crate) struct ExpressionRegistry {
    entries: HashMap<String, Expression>,
}

impl ExpressionRegistry {
    fn insert(&mut self, name: &str, expression: Expression) -> bool {
        self.entries.insert(name.to_string(), expression).is_some()
    }

    fn get(&self, name: &str) -> Option<&Expression> {
        self.entries.get(name)
    }
}

impl Model {
    /// Register `callback` under `name`, watching `chains`.
    ///
    /// Empty chains are discarded; other chains are kept exactly as given.
    /// Registering an existing name replaces it; subscriptions made for the
    /// old definition stay in place.
    pub fn add_expression<I, S>(
        &self,
        name: &str,
        callback: impl Fn(&Model) -> Value + 'static,
        chains: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if name.is_empty() {
            return Err(ModelError::InvalidExpressionName);
        }
        let watch_chains: Vec<String> = chains
            .into_iter()
            .filter(|chain| !chain.as_ref().is_empty())
            .map(|chain| chain.as_ref().to_string())
            .collect();

        let replaced = self.expressions.borrow_mut().insert(
            name,
            Expression {
                watch_chains,
                callback: Rc::new(callback),
            },
        );
        debug!(model = %self.ctx.namespace, name, replaced, "expression registered");
        Ok(())
    }

    pub fn has_expression(&self, name: &str) -> bool {
        self.expressions.borrow().get(name).is_some()
    }

    /// Run the named expression against the current tree.
    pub fn evaluate_expression(&self, name: &str) -> Result<Value> {
        let callback = self
            .expressions
            .borrow()
            .get(name)
            .map(|expression| Rc::clone(&expression.callback))
            .ok_or_else(|| ModelError::ExpressionNotDefined {
                name: name.to_string(),
            })?;
        Ok(callback(self))
    }

    /// Subscribe `callback` to every chain the named expression watches.
    pub fn on_change_expression_chain(
        &self,
        name: &str,
        callback: impl Fn(&ChainChanged) + 'static,
    ) -> Result<()> {
        let chains = self.watch_chains(name)?;
        let callback: ChangeCallback = Rc::new(callback);
        for chain in &chains {
            self.on_change_shared(chain, Rc::clone(&callback))?;
        }
        Ok(())
    }

    /// Names of all registered expressions, sorted.
    pub fn expression_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.expressions.borrow().entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Chains the named expression watches.
    pub fn watch_chains(&self, name: &str) -> Result<Vec<String>> {
        self.expressions
            .borrow()
            .get(name)
            .map(|expression| expression.watch_chains.clone())
            .ok_or_else(|| ModelError::ExpressionNotDefined {
                name: name.to_string(),
            })
    }
}
