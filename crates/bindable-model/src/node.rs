//! Observable tree nodes.
//!
//! Every object or array reachable from a model's root is a [`Node`]; every
//! object- or array-valued child of a node is itself a node. Primitive values
//! are stored as plain [`serde_json::Value`]s. All writes go through
//! [`Node::set`] (or the array operations in [`crate::array`]), which is the
//! single place where change notifications are fired.
//!
//! Nodes are cheap handles: cloning one yields another handle to the same
//! storage. Writing a node into the tree stores a deep copy, so a tree never
//! contains the same node twice.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use bindable_chain::extend;

use crate::context::ModelContext;
use crate::error::{ModelError, Result};

/// Pseudo-key exposing an array's length.
pub const LENGTH_KEY: &str = "length";

/// Caller-supplied hook run on every write to a defined property.
pub type Setter = Rc<dyn Fn(&Value)>;

/// What reading a property yields.
#[derive(Clone)]
pub enum Slot {
    /// A primitive: null, bool, number, or string.
    Value(Value),
    /// A wrapped object or array.
    Node(Node),
}

impl Slot {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Value(_) => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Node(_) => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    /// Deep, wrapper-free copy of this slot.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Node(node) => node.to_value(),
        }
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
        }
    }
}

impl PartialEq<Value> for Slot {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Self::Value(value) => value == other,
            Self::Node(node) => node.to_value() == *other,
        }
    }
}

impl From<Slot> for Value {
    fn from(slot: Slot) -> Self {
        slot.to_value()
    }
}

impl From<&Slot> for Value {
    fn from(slot: &Slot) -> Self {
        slot.to_value()
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        node.to_value()
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        node.to_value()
    }
}

/// A property definition for [`Node::define_property`].
#[derive(Clone, Default)]
pub struct PropertyDescriptor {
    /// Initial value, written through the observed path.
    pub value: Option<Value>,
    /// Hook run on every later write, before the value is stored.
    pub setter: Option<Setter>,
}

impl PropertyDescriptor {
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            setter: None,
        }
    }

    pub fn with_setter(mut self, setter: impl Fn(&Value) + 'static) -> Self {
        self.setter = Some(Rc::new(setter));
        self
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("value", &self.value)
            .field("setter", &self.has_setter())
            .finish()
    }
}

pub(crate) enum Storage {
    Object(IndexMap<String, Slot>),
    Array(Vec<Slot>),
}

pub(crate) struct NodeData {
    pub(crate) chain: String,
    pub(crate) storage: Storage,
    pub(crate) extensible: bool,
    setters: HashMap<String, Setter>,
}

/// Handle to one observable object or array.
#[derive(Clone)]
pub struct Node {
    pub(crate) data: Rc<RefCell<NodeData>>,
    pub(crate) ctx: Rc<ModelContext>,
}

/// Wrap `value` for the location `chain`.
///
/// Primitives come back unchanged; objects and arrays are wrapped together
/// with every descendant before this returns.
pub(crate) fn wrap_value(value: Value, chain: &str, ctx: &Rc<ModelContext>) -> Slot {
    match value {
        Value::Object(map) => {
            let entries = map
                .into_iter()
                .map(|(key, child)| {
                    let child_chain = extend(chain, &key);
                    (key, wrap_value(child, &child_chain, ctx))
                })
                .collect();
            Slot::Node(Node::new(chain, Storage::Object(entries), ctx))
        }
        Value::Array(items) => {
            let items = items
                .into_iter()
                .enumerate()
                .map(|(index, child)| wrap_value(child, &extend(chain, index), ctx))
                .collect();
            Slot::Node(Node::new(chain, Storage::Array(items), ctx))
        }
        primitive => Slot::Value(primitive),
    }
}

/// Parse a canonical array index ("0", "12"; not "01" or "+1").
pub(crate) fn parse_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

impl Node {
    fn new(chain: &str, storage: Storage, ctx: &Rc<ModelContext>) -> Self {
        Self {
            data: Rc::new(RefCell::new(NodeData {
                chain: chain.to_string(),
                storage,
                extensible: true,
                setters: HashMap::new(),
            })),
            ctx: Rc::clone(ctx),
        }
    }

    /// The chain this node currently lives at. Empty for the root.
    pub fn chain(&self) -> String {
        self.data.borrow().chain.clone()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.data.borrow().storage, Storage::Array(_))
    }

    pub fn is_object(&self) -> bool {
        !self.is_array()
    }

    /// Number of entries (object keys or array elements).
    pub fn len(&self) -> usize {
        match &self.data.borrow().storage {
            Storage::Object(map) => map.len(),
            Storage::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Read a property. Arrays accept canonical indices and `"length"`.
    pub fn get(&self, key: &str) -> Option<Slot> {
        match &self.data.borrow().storage {
            Storage::Object(map) => map.get(key).cloned(),
            Storage::Array(items) => {
                if key == LENGTH_KEY {
                    return Some(Slot::Value(Value::from(items.len())));
                }
                parse_index(key).and_then(|index| items.get(index).cloned())
            }
        }
    }

    /// Read a property and copy it out as a plain value.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key).map(|slot| slot.to_value())
    }

    /// Write a property and notify its chain.
    ///
    /// Objects and arrays are wrapped before assignment. Arrays grow with
    /// nulls when written past their end; writing `"length"` truncates or
    /// extends them.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidIndex`] for a non-index key on an array
    /// - [`ModelError::IndexOutOfRange`] when an array would grow past
    ///   [`ModelConfig::max_array_length`](crate::ModelConfig::max_array_length)
    /// - [`ModelError::NotExtensible`] when adding a key to a node after
    ///   [`prevent_extensions`](Self::prevent_extensions)
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let chain = extend(&self.chain(), key);
        let setter = self.data.borrow().setters.get(key).cloned();
        if let Some(setter) = setter {
            setter(&value);
        }

        let slot = wrap_value(value, &chain, &self.ctx);
        self.assign(key, slot)?;
        self.ctx.notify(&chain);
        Ok(())
    }

    /// Remove a property from storage.
    ///
    /// Deleting never notifies. Array elements become `null`, keeping the
    /// array's length.
    pub fn delete(&self, key: &str) -> Option<Slot> {
        let mut data = self.data.borrow_mut();
        data.setters.remove(key);
        match &mut data.storage {
            Storage::Object(map) => map.shift_remove(key),
            Storage::Array(items) => {
                let index = parse_index(key)?;
                let slot = items.get_mut(index)?;
                Some(std::mem::replace(slot, Slot::Value(Value::Null)))
            }
        }
    }

    /// Own keys in storage order. Array keys are their indices.
    pub fn keys(&self) -> Vec<String> {
        match &self.data.borrow().storage {
            Storage::Object(map) => map.keys().cloned().collect(),
            Storage::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &self.data.borrow().storage {
            Storage::Object(map) => map.contains_key(key),
            Storage::Array(items) => {
                key == LENGTH_KEY || parse_index(key).is_some_and(|index| index < items.len())
            }
        }
    }

    pub fn is_extensible(&self) -> bool {
        self.data.borrow().extensible
    }

    /// Forbid adding new keys. Existing keys stay writable.
    pub fn prevent_extensions(&self) {
        self.data.borrow_mut().extensible = false;
    }

    /// Current definition of a property, if present.
    pub fn descriptor(&self, key: &str) -> Option<PropertyDescriptor> {
        let value = self.get_value(key)?;
        Some(PropertyDescriptor {
            value: Some(value),
            setter: self.data.borrow().setters.get(key).cloned(),
        })
    }

    /// Define a property.
    ///
    /// A supplied value is written through [`set`](Self::set), so it is
    /// observed like any other write. A supplied setter is kept and runs on
    /// every later write to `key`, ahead of the observed assignment.
    pub fn define_property(&self, key: &str, descriptor: PropertyDescriptor) -> Result<()> {
        let PropertyDescriptor { value, setter } = descriptor;
        match value {
            Some(value) => self.set(key, value)?,
            None if !self.contains_key(key) => self.assign(key, Slot::Value(Value::Null))?,
            None => {}
        }
        if let Some(setter) = setter {
            self.data
                .borrow_mut()
                .setters
                .insert(key.to_string(), setter);
        }
        Ok(())
    }

    /// Deep, wrapper-free copy of this node.
    pub fn to_value(&self) -> Value {
        match &self.data.borrow().storage {
            Storage::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, slot)| (key.clone(), slot.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            Storage::Array(items) => Value::Array(items.iter().map(Slot::to_value).collect()),
        }
    }

    /// Place `slot` in storage without notifying.
    fn assign(&self, key: &str, slot: Slot) -> Result<()> {
        let mut data = self.data.borrow_mut();
        let NodeData {
            chain,
            storage,
            extensible,
            ..
        } = &mut *data;
        let chain = chain.as_str();
        let extensible = *extensible;
        let max_len = self.ctx.config.max_array_length;

        match storage {
            Storage::Object(map) => {
                if !extensible && !map.contains_key(key) {
                    return Err(not_extensible(chain, key));
                }
                map.insert(key.to_string(), slot);
            }
            Storage::Array(items) => {
                if key == LENGTH_KEY {
                    let new_len = slot
                        .as_value()
                        .and_then(Value::as_u64)
                        .ok_or_else(|| invalid_index(chain, key))?;
                    let new_len = usize::try_from(new_len)
                        .ok()
                        .filter(|len| *len <= max_len)
                        .ok_or_else(|| out_of_range(chain, key, max_len))?;
                    if new_len > items.len() && !extensible {
                        return Err(not_extensible(chain, key));
                    }
                    items.resize(new_len, Slot::Value(Value::Null));
                    return Ok(());
                }
                let index = parse_index(key).ok_or_else(|| invalid_index(chain, key))?;
                if index >= max_len {
                    return Err(out_of_range(chain, key, max_len));
                }
                if index >= items.len() {
                    if !extensible {
                        return Err(not_extensible(chain, key));
                    }
                    items.resize(index + 1, Slot::Value(Value::Null));
                }
                items[index] = slot;
            }
        }
        Ok(())
    }

    /// Move this node (and its descendants) to `chain`.
    pub(crate) fn rebase(&self, chain: String) {
        let children: Vec<(String, Node)> = {
            let mut data = self.data.borrow_mut();
            data.chain = chain;
            let chain = &data.chain;
            match &data.storage {
                Storage::Object(map) => map
                    .iter()
                    .filter_map(|(key, slot)| slot.as_node().map(|n| (extend(chain, key), n.clone())))
                    .collect(),
                Storage::Array(items) => items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, slot)| slot.as_node().map(|n| (extend(chain, i), n.clone())))
                    .collect(),
            }
        };
        for (child_chain, child) in children {
            child.rebase(child_chain);
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("chain", &self.chain())
            .field("kind", &if self.is_array() { "array" } else { "object" })
            .field("len", &self.len())
            .finish()
    }
}

fn not_extensible(chain: &str, key: &str) -> ModelError {
    ModelError::NotExtensible {
        chain: chain.to_string(),
        key: key.to_string(),
    }
}

fn out_of_range(chain: &str, key: &str, max: usize) -> ModelError {
    ModelError::IndexOutOfRange {
        chain: chain.to_string(),
        key: key.to_string(),
        max,
    }
}

fn invalid_index(chain: &str, key: &str) -> ModelError {
    ModelError::InvalidIndex {
        chain: chain.to_string(),
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{isolated, record};
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn nested_objects_are_wrapped_eagerly() {
        let model = isolated(json!({"a": {"b": {"c": 1}}, "list": [{"x": 1}, 2]}));
        let a = model.get("a").unwrap().into_node().unwrap();
        assert_eq!(a.chain(), "a");
        let b = a.get("b").unwrap().into_node().unwrap();
        assert_eq!(b.chain(), "a.b");
        let item = model
            .get("list")
            .and_then(Slot::into_node)
            .and_then(|list| list.get("0"))
            .and_then(Slot::into_node)
            .unwrap();
        assert_eq!(item.chain(), "list.0");
        assert!(matches!(model.get("list").unwrap().into_node().unwrap().get("1"), Some(Slot::Value(_))));
    }

    #[test]
    fn reads_are_live() {
        let model = isolated(json!({"a": {"b": 1}}));
        let a = model.get("a").unwrap().into_node().unwrap();
        model.set_chain_value("a.b", json!(2));
        assert_eq!(a.get_value("b"), Some(json!(2)));
    }

    #[test]
    fn write_through_nested_handle_notifies_full_chain() {
        let model = isolated(json!({"a": {"b": 1}}));
        let log = record(&model, "a.b");
        let a = model.get("a").unwrap().into_node().unwrap();
        a.set("b", 5).unwrap();
        assert_eq!(*log.borrow(), vec!["a.b"]);
        assert_eq!(model.value_at("a.b"), Some(json!(5)));
    }

    #[test]
    fn written_objects_are_wrapped() {
        let model = isolated(json!({}));
        model.set("a", json!({"b": {"c": [1, 2]}})).unwrap();
        let c = model
            .get_chain_value("a.b.c")
            .and_then(Slot::into_node)
            .unwrap();
        assert!(c.is_array());
        assert_eq!(c.chain(), "a.b.c");
    }

    #[test]
    fn writing_a_node_stores_a_copy() {
        let model = isolated(json!({"src": {"v": 1}}));
        let src = model.get("src").unwrap().into_node().unwrap();
        model.set("dst", &src).unwrap();
        let dst = model.get("dst").unwrap().into_node().unwrap();
        assert!(!dst.ptr_eq(&src));
        assert_eq!(dst.chain(), "dst");
        dst.set("v", 2).unwrap();
        assert_eq!(src.get_value("v"), Some(json!(1)));
    }

    #[test]
    fn delete_does_not_notify() {
        let model = isolated(json!({"a": 1, "b": 2}));
        let log = record(&model, "*");
        let removed = model.delete("a");
        assert_eq!(removed.map(Value::from), Some(json!(1)));
        assert!(!model.contains_key("a"));
        assert_eq!(model.keys(), vec!["b"]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn delete_array_element_leaves_hole() {
        let model = isolated(json!({"xs": [1, 2, 3]}));
        let xs = model.get("xs").unwrap().into_node().unwrap();
        xs.delete("1");
        assert_eq!(xs.len(), 3);
        assert_eq!(xs.to_value(), json!([1, null, 3]));
        assert!(xs.delete("9").is_none());
    }

    #[test]
    fn array_writes() {
        let model = isolated(json!({"xs": [1]}));
        let xs = model.get("xs").unwrap().into_node().unwrap();
        xs.set("2", "c").unwrap();
        assert_eq!(xs.to_value(), json!([1, null, "c"]));
        assert_eq!(xs.get_value("length"), Some(json!(3)));
        assert!(matches!(xs.set("name", 1), Err(ModelError::InvalidIndex { .. })));
        assert!(matches!(xs.set("01", 1), Err(ModelError::InvalidIndex { .. })));
    }

    #[test]
    fn oversized_index_is_rejected() {
        let model = isolated(json!({"xs": [1]}));
        let log = record(&model, "*");
        let xs = model.get("xs").unwrap().into_node().unwrap();

        let huge = usize::MAX.to_string();
        assert!(matches!(xs.set(&huge, 1), Err(ModelError::IndexOutOfRange { .. })));
        assert!(!model.set_chain_value(&format!("xs.{huge}"), json!(1)));
        assert!(!model.set_chain_value("xs.4000000000", json!(1)));
        assert!(!model.set_chain_value("xs.99999999999999999999", json!(1)));

        assert_eq!(xs.to_value(), json!([1]));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn oversized_length_is_rejected() {
        let model = isolated(json!({"xs": [1, 2]}));
        let xs = model.get("xs").unwrap().into_node().unwrap();
        assert!(matches!(
            xs.set("length", u64::MAX),
            Err(ModelError::IndexOutOfRange { .. })
        ));
        assert!(!model.set_chain_value("xs.length", json!(u64::MAX)));
        assert_eq!(xs.to_value(), json!([1, 2]));
    }

    #[test]
    fn growth_up_to_the_configured_limit() {
        let config = crate::ModelConfig {
            max_array_length: 4,
            ..Default::default()
        };
        let model = crate::testing::isolated_with(json!({"xs": []}), config);
        let xs = model.get("xs").unwrap().into_node().unwrap();
        xs.set("3", "last").unwrap();
        assert_eq!(xs.len(), 4);
        assert!(matches!(xs.set("4", 1), Err(ModelError::IndexOutOfRange { max: 4, .. })));
        assert!(xs.set("length", 4).is_ok());
        assert!(matches!(xs.set("length", 5), Err(ModelError::IndexOutOfRange { .. })));
    }

    #[test]
    fn array_length_write() {
        let model = isolated(json!({"xs": [1, 2, 3]}));
        let log = record(&model, "xs");
        let xs = model.get("xs").unwrap().into_node().unwrap();
        xs.set("length", 1).unwrap();
        assert_eq!(xs.to_value(), json!([1]));
        assert_eq!(*log.borrow(), vec!["xs"]);
        assert!(matches!(xs.set("length", -1), Err(ModelError::InvalidIndex { .. })));
    }

    #[test]
    fn introspection() {
        let model = isolated(json!({"a": 1, "b": [true]}));
        assert_eq!(model.keys(), vec!["a", "b"]);
        assert!(model.contains_key("a"));
        assert!(!model.contains_key("z"));
        assert_eq!(model.len(), 2);
        assert!(model.is_object());
        let b = model.get("b").unwrap().into_node().unwrap();
        assert_eq!(b.keys(), vec!["0"]);
        assert!(b.contains_key("length"));
        assert!(b.contains_key("0"));
        assert!(!b.contains_key("1"));
    }

    #[test]
    fn prevent_extensions_blocks_new_keys_only() {
        let model = isolated(json!({"a": 1, "xs": [1]}));
        assert!(model.is_extensible());
        model.prevent_extensions();
        assert!(!model.is_extensible());
        assert!(model.set("a", 2).is_ok());
        assert!(matches!(model.set("b", 1), Err(ModelError::NotExtensible { .. })));

        let xs = model.get("xs").unwrap().into_node().unwrap();
        xs.prevent_extensions();
        assert!(xs.set("0", 9).is_ok());
        assert!(matches!(xs.set("1", 9), Err(ModelError::NotExtensible { .. })));
    }

    #[test]
    fn rejected_write_does_not_notify() {
        let model = isolated(json!({"a": 1}));
        model.prevent_extensions();
        let log = record(&model, "*");
        assert!(model.set("b", 1).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn defined_setter_composes_with_observation() {
        let model = isolated(json!({}));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        model
            .define_property(
                "count",
                PropertyDescriptor::value(0).with_setter(move |v| sink.borrow_mut().push(v.clone())),
            )
            .unwrap();
        let log = record(&model, "count");

        model.set("count", 3).unwrap();
        assert_eq!(*seen.borrow(), vec![json!(3)]);
        assert_eq!(*log.borrow(), vec!["count"]);
        assert_eq!(model.get_value("count"), Some(json!(3)));
        assert!(model.descriptor("count").unwrap().has_setter());
    }

    #[test]
    fn setter_runs_before_the_write_lands() {
        let model = isolated(json!({}));
        let stored = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&stored);
        let reader = model.clone();
        model
            .define_property(
                "count",
                PropertyDescriptor::value(0).with_setter(move |incoming| {
                    sink.borrow_mut()
                        .push((reader.get_value("count"), incoming.clone()))
                }),
            )
            .unwrap();

        model.set("count", 3).unwrap();
        assert_eq!(*stored.borrow(), vec![(Some(json!(0)), json!(3))]);
        assert_eq!(model.get_value("count"), Some(json!(3)));
    }

    #[test]
    fn define_without_value_creates_null_slot() {
        let model = isolated(json!({}));
        let log = record(&model, "*");
        model
            .define_property("x", PropertyDescriptor::default())
            .unwrap();
        assert_eq!(model.get_value("x"), Some(Value::Null));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn descriptor_of_missing_key() {
        let model = isolated(json!({"a": 1}));
        assert!(model.descriptor("zz").is_none());
        let d = model.descriptor("a").unwrap();
        assert_eq!(d.value, Some(json!(1)));
        assert!(!d.has_setter());
    }

    #[test]
    fn slot_equality_against_values() {
        let model = isolated(json!({"a": {"b": 1}, "n": 2}));
        assert!(model.get("a").unwrap() == json!({"b": 1}));
        assert!(model.get("n").unwrap() == json!(2));
    }

    #[test]
    fn canonical_indices() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("01"), None);
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("x"), None);
    }
}
