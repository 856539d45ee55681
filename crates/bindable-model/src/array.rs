//! Array mutation interception.
//!
//! Array methods are an explicit enumeration, [`ArrayOp`], and every variant
//! maps to a fixed [`NotifyPolicy`]:
//!
//! | operation                                    | policy   | chain notified          |
//! |----------------------------------------------|----------|-------------------------|
//! | `push`                                       | `Index`  | `array.(new_len - 1)`   |
//! | `copyWithin`, `fill`, `pop`, `reverse`,      | `Own`    | the array's own chain   |
//! | `shift`, `sort`, `splice`, `unshift`         |          |                         |
//! | `slice`                                      | `None`*  | nothing                 |
//! | `length`, `indexOf`, `includes`              | `None`   | nothing                 |
//!
//! \* `slice` notifies the own chain when
//! [`ModelConfig::notify_on_slice`](crate::ModelConfig::notify_on_slice) is
//! set.
//!
//! Index arguments follow the usual sequence conventions: negative values
//! count from the end and everything is clamped to the array bounds.
//! Operations that reorder elements move child nodes to their new chains.
//!
//! A failing operation is logged and its error returned unchanged.

use std::cmp::Ordering;
use std::rc::Rc;

use serde_json::Value;
use tracing::error;

use bindable_chain::extend;

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::node::{wrap_value, Node, Slot, Storage};

/// Comparator used by [`ArrayOp::SortBy`].
pub type Comparator = Rc<dyn Fn(&Value, &Value) -> Ordering>;

/// Which chain an array operation notifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyPolicy {
    /// The chain of the last element after the operation.
    Index,
    /// The array's own chain.
    Own,
    /// Nothing.
    None,
}

/// A supported array operation.
#[derive(Clone)]
pub enum ArrayOp {
    Push(Vec<Value>),
    Pop,
    Shift,
    Unshift(Vec<Value>),
    Reverse,
    /// Sort by the elements' string forms.
    Sort,
    SortBy(Comparator),
    Splice {
        start: i64,
        delete_count: Option<usize>,
        items: Vec<Value>,
    },
    Fill {
        value: Value,
        start: i64,
        end: Option<i64>,
    },
    CopyWithin {
        target: i64,
        start: i64,
        end: Option<i64>,
    },
    Slice {
        start: i64,
        end: Option<i64>,
    },
    Len,
    IndexOf(Value),
    Includes(Value),
}

impl ArrayOp {
    /// Conventional method name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Pop => "pop",
            Self::Shift => "shift",
            Self::Unshift(_) => "unshift",
            Self::Reverse => "reverse",
            Self::Sort | Self::SortBy(_) => "sort",
            Self::Splice { .. } => "splice",
            Self::Fill { .. } => "fill",
            Self::CopyWithin { .. } => "copyWithin",
            Self::Slice { .. } => "slice",
            Self::Len => "length",
            Self::IndexOf(_) => "indexOf",
            Self::Includes(_) => "includes",
        }
    }

    pub fn policy(&self, config: &ModelConfig) -> NotifyPolicy {
        match self {
            Self::Push(_) => NotifyPolicy::Index,
            Self::Pop
            | Self::Shift
            | Self::Unshift(_)
            | Self::Reverse
            | Self::Sort
            | Self::SortBy(_)
            | Self::Splice { .. }
            | Self::Fill { .. }
            | Self::CopyWithin { .. } => NotifyPolicy::Own,
            Self::Slice { .. } if config.notify_on_slice => NotifyPolicy::Own,
            Self::Slice { .. } | Self::Len | Self::IndexOf(_) | Self::Includes(_) => {
                NotifyPolicy::None
            }
        }
    }
}

impl std::fmt::Debug for ArrayOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push(items) => f.debug_tuple("Push").field(items).finish(),
            Self::Unshift(items) => f.debug_tuple("Unshift").field(items).finish(),
            Self::SortBy(_) => f.write_str("SortBy(..)"),
            Self::Splice {
                start,
                delete_count,
                items,
            } => f
                .debug_struct("Splice")
                .field("start", start)
                .field("delete_count", delete_count)
                .field("items", items)
                .finish(),
            Self::Fill { value, start, end } => f
                .debug_struct("Fill")
                .field("value", value)
                .field("start", start)
                .field("end", end)
                .finish(),
            Self::CopyWithin { target, start, end } => f
                .debug_struct("CopyWithin")
                .field("target", target)
                .field("start", start)
                .field("end", end)
                .finish(),
            Self::Slice { start, end } => f
                .debug_struct("Slice")
                .field("start", start)
                .field("end", end)
                .finish(),
            Self::IndexOf(v) => f.debug_tuple("IndexOf").field(v).finish(),
            Self::Includes(v) => f.debug_tuple("Includes").field(v).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// Result of an [`ArrayOp`].
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayOutput {
    /// New (or current) length: `push`, `unshift`, `length`.
    Length(usize),
    /// Removed element: `pop`, `shift`.
    Element(Option<Value>),
    /// Removed or copied elements: `splice`, `slice`.
    Elements(Vec<Value>),
    /// Position of a match: `indexOf`.
    Position(Option<usize>),
    /// `includes`.
    Flag(bool),
    /// In-place operations with nothing to report.
    Done,
}

impl ArrayOutput {
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::Length(len) => Some(*len),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<Value> {
        match self {
            Self::Element(value) => value,
            _ => None,
        }
    }

    pub fn into_elements(self) -> Vec<Value> {
        match self {
            Self::Elements(values) => values,
            _ => Vec::new(),
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Position(pos) => *pos,
            _ => None,
        }
    }

    pub fn flag(&self) -> bool {
        matches!(self, Self::Flag(true))
    }
}

/// Resolve a possibly negative index against `len`, clamped to `0..=len`.
fn relative(index: i64, len: usize) -> usize {
    if index < 0 {
        let from_end = len as i64 + index;
        from_end.max(0) as usize
    } else {
        (index as usize).min(len)
    }
}

/// String form used by the default sort.
fn sort_key(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => sort_key(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

impl Node {
    /// Run an array operation and notify according to its [`NotifyPolicy`].
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotAnArray`] if this node is an object
    /// - [`ModelError::NotExtensible`] if the operation would grow an array
    ///   after [`prevent_extensions`](Node::prevent_extensions)
    pub fn apply(&self, op: ArrayOp) -> Result<ArrayOutput> {
        let name = op.name();
        let policy = op.policy(&self.ctx.config);

        let output = match self.run(op) {
            Ok(output) => output,
            Err(err) => {
                error!(chain = %self.chain(), op = name, %err, "array operation failed");
                return Err(err);
            }
        };

        let chain = self.chain();
        match policy {
            NotifyPolicy::Index => {
                let len = output.length().unwrap_or_else(|| self.len());
                self.ctx.notify(&extend(&chain, len as i64 - 1));
            }
            NotifyPolicy::Own => {
                self.rebase(chain.clone());
                self.ctx.notify(&chain);
            }
            NotifyPolicy::None => {}
        }
        Ok(output)
    }

    fn run(&self, op: ArrayOp) -> Result<ArrayOutput> {
        let op = match op {
            ArrayOp::Sort => return self.sort_with(|a, b| sort_key(a).cmp(&sort_key(b))),
            ArrayOp::SortBy(compare) => return self.sort_with(|a, b| compare(a, b)),
            other => other,
        };

        let mut data = self.data.borrow_mut();
        let chain = data.chain.clone();
        let extensible = data.extensible;
        let Storage::Array(items) = &mut data.storage else {
            return Err(ModelError::NotAnArray { chain });
        };
        let len = items.len();
        let grow_check = |adding: usize, key: String| -> Result<()> {
            if adding > 0 && !extensible {
                return Err(ModelError::NotExtensible {
                    chain: chain.clone(),
                    key,
                });
            }
            Ok(())
        };

        let output = match op {
            ArrayOp::Push(values) => {
                grow_check(values.len(), len.to_string())?;
                for value in values {
                    let index = items.len();
                    items.push(wrap_value(value, &extend(&chain, index), &self.ctx));
                }
                ArrayOutput::Length(items.len())
            }
            ArrayOp::Pop => ArrayOutput::Element(items.pop().map(|slot| slot.to_value())),
            ArrayOp::Shift => {
                let first = (!items.is_empty()).then(|| items.remove(0));
                ArrayOutput::Element(first.map(|slot| slot.to_value()))
            }
            ArrayOp::Unshift(values) => {
                grow_check(values.len(), "0".to_string())?;
                let wrapped: Vec<Slot> = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| wrap_value(value, &extend(&chain, i), &self.ctx))
                    .collect();
                items.splice(0..0, wrapped);
                ArrayOutput::Length(items.len())
            }
            ArrayOp::Reverse => {
                items.reverse();
                ArrayOutput::Done
            }
            // Dispatched to `sort_with` before borrowing.
            ArrayOp::Sort | ArrayOp::SortBy(_) => ArrayOutput::Done,
            ArrayOp::Splice {
                start,
                delete_count,
                items: inserted,
            } => {
                let start = relative(start, len);
                let delete_count = delete_count.unwrap_or(len - start).min(len - start);
                grow_check(inserted.len().saturating_sub(delete_count), start.to_string())?;
                let wrapped: Vec<Slot> = inserted
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| wrap_value(value, &extend(&chain, start + i), &self.ctx))
                    .collect();
                let removed = items
                    .splice(start..start + delete_count, wrapped)
                    .map(|slot| slot.to_value())
                    .collect();
                ArrayOutput::Elements(removed)
            }
            ArrayOp::Fill { value, start, end } => {
                let start = relative(start, len);
                let end = relative(end.unwrap_or(len as i64), len);
                for index in start..end {
                    items[index] = wrap_value(value.clone(), &extend(&chain, index), &self.ctx);
                }
                ArrayOutput::Done
            }
            ArrayOp::CopyWithin { target, start, end } => {
                let target = relative(target, len);
                let start = relative(start, len);
                let end = relative(end.unwrap_or(len as i64), len);
                let count = end.saturating_sub(start).min(len - target);
                let copied: Vec<Value> = items[start..start + count]
                    .iter()
                    .map(Slot::to_value)
                    .collect();
                for (offset, value) in copied.into_iter().enumerate() {
                    let index = target + offset;
                    items[index] = wrap_value(value, &extend(&chain, index), &self.ctx);
                }
                ArrayOutput::Done
            }
            ArrayOp::Slice { start, end } => {
                let start = relative(start, len);
                let end = relative(end.unwrap_or(len as i64), len);
                let copied = if start < end {
                    items[start..end].iter().map(Slot::to_value).collect()
                } else {
                    Vec::new()
                };
                ArrayOutput::Elements(copied)
            }
            ArrayOp::Len => ArrayOutput::Length(len),
            ArrayOp::IndexOf(needle) => ArrayOutput::Position(
                items
                    .iter()
                    .position(|slot| slot.as_value() == Some(&needle)),
            ),
            ArrayOp::Includes(needle) => {
                ArrayOutput::Flag(items.iter().any(|slot| slot.as_value() == Some(&needle)))
            }
        };
        Ok(output)
    }

    /// Stable sort with `compare` running outside any borrow of this node,
    /// so the comparator may read the model.
    ///
    /// The comparator sees plain copies of the elements. The resulting order
    /// is applied to the slots afterwards; slots the comparator added in the
    /// meantime stay at the end.
    fn sort_with(&self, compare: impl Fn(&Value, &Value) -> Ordering) -> Result<ArrayOutput> {
        let values: Vec<Value> = {
            let data = self.data.borrow();
            match &data.storage {
                Storage::Array(items) => items.iter().map(Slot::to_value).collect(),
                Storage::Object(_) => {
                    return Err(ModelError::NotAnArray {
                        chain: data.chain.clone(),
                    })
                }
            }
        };

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| compare(&values[a], &values[b]));

        let mut data = self.data.borrow_mut();
        if let Storage::Array(items) = &mut data.storage {
            let mut slots: Vec<Option<Slot>> = std::mem::take(items).into_iter().map(Some).collect();
            let mut reordered: Vec<Slot> = order
                .iter()
                .filter_map(|&index| slots.get_mut(index).and_then(Option::take))
                .collect();
            reordered.extend(slots.into_iter().flatten());
            *items = reordered;
        }
        Ok(ArrayOutput::Done)
    }

    /// Append values; returns the new length.
    pub fn push<I, V>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Ok(self.apply(ArrayOp::Push(values))?.length().unwrap_or_default())
    }

    pub fn pop(&self) -> Result<Option<Value>> {
        Ok(self.apply(ArrayOp::Pop)?.into_element())
    }

    pub fn shift(&self) -> Result<Option<Value>> {
        Ok(self.apply(ArrayOp::Shift)?.into_element())
    }

    /// Prepend values; returns the new length.
    pub fn unshift<I, V>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Ok(self.apply(ArrayOp::Unshift(values))?.length().unwrap_or_default())
    }

    pub fn reverse(&self) -> Result<()> {
        self.apply(ArrayOp::Reverse).map(drop)
    }

    pub fn sort(&self) -> Result<()> {
        self.apply(ArrayOp::Sort).map(drop)
    }

    pub fn sort_by(&self, compare: impl Fn(&Value, &Value) -> Ordering + 'static) -> Result<()> {
        self.apply(ArrayOp::SortBy(Rc::new(compare))).map(drop)
    }

    /// Remove `delete_count` elements at `start` (all remaining when `None`)
    /// and insert `items` in their place; returns the removed elements.
    pub fn splice<I, V>(&self, start: i64, delete_count: Option<usize>, items: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect();
        Ok(self
            .apply(ArrayOp::Splice {
                start,
                delete_count,
                items,
            })?
            .into_elements())
    }

    pub fn fill(&self, value: impl Into<Value>, start: i64, end: Option<i64>) -> Result<()> {
        self.apply(ArrayOp::Fill {
            value: value.into(),
            start,
            end,
        })
        .map(drop)
    }

    pub fn copy_within(&self, target: i64, start: i64, end: Option<i64>) -> Result<()> {
        self.apply(ArrayOp::CopyWithin { target, start, end })
            .map(drop)
    }

    pub fn slice(&self, start: i64, end: Option<i64>) -> Result<Vec<Value>> {
        Ok(self.apply(ArrayOp::Slice { start, end })?.into_elements())
    }

    /// Position of the first primitive element equal to `needle`.
    pub fn index_of(&self, needle: impl Into<Value>) -> Result<Option<usize>> {
        Ok(self.apply(ArrayOp::IndexOf(needle.into()))?.position())
    }

    pub fn includes(&self, needle: impl Into<Value>) -> Result<bool> {
        Ok(self.apply(ArrayOp::Includes(needle.into()))?.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{isolated, isolated_with, record};
    use crate::Model;
    use serde_json::json;

    fn items_of(model: &Model) -> Node {
        model.get("items").and_then(Slot::into_node).unwrap()
    }

    #[test]
    fn push_notifies_new_index_once() {
        let model = isolated(json!({"items": [1, 2]}));
        let all = record(&model, "*");
        let items_log = record(&model, "items");
        let index_log = record(&model, "items.2");

        let len = items_of(&model).push([3]).unwrap();

        assert_eq!(len, 3);
        assert_eq!(*all.borrow(), vec!["*"]);
        assert_eq!(*items_log.borrow(), vec!["items"]);
        assert_eq!(*index_log.borrow(), vec!["items.2"]);
        assert_eq!(model.value_at("items"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn push_many_notifies_last_index() {
        let model = isolated(json!({"items": []}));
        let last = record(&model, "items.2");
        items_of(&model).push([json!("a"), json!("b"), json!("c")]).unwrap();
        assert_eq!(last.borrow().len(), 1);
    }

    #[test]
    fn pushed_objects_are_wrapped_at_their_index() {
        let model = isolated(json!({"items": [0]}));
        items_of(&model).push([json!({"name": "x"})]).unwrap();
        let pushed = model.get_chain_value("items.1").and_then(Slot::into_node).unwrap();
        assert_eq!(pushed.chain(), "items.1");

        let log = record(&model, "items.1.name");
        pushed.set("name", "y").unwrap();
        assert_eq!(*log.borrow(), vec!["items.1.name"]);
    }

    #[test]
    fn read_only_operations_do_not_notify() {
        let model = isolated(json!({"items": [1, 2, 3]}));
        let all = record(&model, "*");
        let items = items_of(&model);

        assert_eq!(items.apply(ArrayOp::Len).unwrap(), ArrayOutput::Length(3));
        assert_eq!(items.index_of(2).unwrap(), Some(1));
        assert_eq!(items.index_of(9).unwrap(), None);
        assert!(items.includes(3).unwrap());
        assert!(!items.includes("3").unwrap());
        assert_eq!(items.slice(1, None).unwrap(), vec![json!(2), json!(3)]);

        assert!(all.borrow().is_empty());
    }

    #[test]
    fn slice_can_be_configured_to_notify() {
        let config = ModelConfig {
            notify_on_slice: true,
            ..Default::default()
        };
        let model = isolated_with(json!({"items": [1, 2, 3]}), config);
        let log = record(&model, "items");
        let copied = items_of(&model).slice(-2, None).unwrap();
        assert_eq!(copied, vec![json!(2), json!(3)]);
        assert_eq!(*log.borrow(), vec!["items"]);
        assert_eq!(model.value_at("items"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn mutators_notify_own_chain_once() {
        let cases: Vec<(ArrayOp, Value)> = vec![
            (ArrayOp::Pop, json!([3, 1])),
            (ArrayOp::Shift, json!([1, 2])),
            (ArrayOp::Unshift(vec![json!(0)]), json!([0, 3, 1, 2])),
            (ArrayOp::Reverse, json!([2, 1, 3])),
            (ArrayOp::Sort, json!([1, 2, 3])),
            (
                ArrayOp::Splice {
                    start: 1,
                    delete_count: Some(1),
                    items: vec![json!(9), json!(8)],
                },
                json!([3, 9, 8, 2]),
            ),
            (
                ArrayOp::Fill {
                    value: json!(0),
                    start: 1,
                    end: None,
                },
                json!([3, 0, 0]),
            ),
            (
                ArrayOp::CopyWithin {
                    target: 0,
                    start: 1,
                    end: None,
                },
                json!([1, 2, 2]),
            ),
        ];

        for (op, expected) in cases {
            let name = op.name();
            let model = isolated(json!({"items": [3, 1, 2]}));
            let own = record(&model, "items");
            let parent = record(&model, "*");
            items_of(&model).apply(op).unwrap();
            assert_eq!(*own.borrow(), vec!["items"], "{name}");
            assert_eq!(parent.borrow().len(), 1, "{name}");
            assert_eq!(model.value_at("items"), Some(expected), "{name}");
        }
    }

    #[test]
    fn mutator_on_observed_element_reaches_element_watchers() {
        let model = isolated(json!({"items": [1, 2]}));
        let first = record(&model, "items.0");
        items_of(&model).reverse().unwrap();
        assert_eq!(*first.borrow(), vec!["items.0"]);
    }

    #[test]
    fn outputs() {
        let model = isolated(json!({"items": [1, 2, 3, 4]}));
        let items = items_of(&model);
        assert_eq!(items.pop().unwrap(), Some(json!(4)));
        assert_eq!(items.shift().unwrap(), Some(json!(1)));
        assert_eq!(items.unshift([0]).unwrap(), 3);
        assert_eq!(items.splice(0, Some(2), Vec::<Value>::new()).unwrap(), vec![json!(0), json!(2)]);
        assert_eq!(items.to_value(), json!([3]));
        assert_eq!(items.splice(0, None, [7, 8]).unwrap(), vec![json!(3)]);
        assert_eq!(items.to_value(), json!([7, 8]));
    }

    #[test]
    fn empty_array_edges() {
        let model = isolated(json!({"items": []}));
        let items = items_of(&model);
        assert_eq!(items.pop().unwrap(), None);
        assert_eq!(items.shift().unwrap(), None);
        assert_eq!(items.slice(0, Some(5)).unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn negative_and_clamped_indices() {
        let model = isolated(json!({"items": [1, 2, 3, 4, 5]}));
        let items = items_of(&model);
        assert_eq!(items.slice(-2, None).unwrap(), vec![json!(4), json!(5)]);
        assert_eq!(items.slice(3, Some(100)).unwrap(), vec![json!(4), json!(5)]);
        assert_eq!(items.slice(4, Some(2)).unwrap(), Vec::<Value>::new());
        items.fill(0, -2, Some(-1)).unwrap();
        assert_eq!(items.to_value(), json!([1, 2, 3, 0, 5]));
        assert_eq!(items.splice(-100, Some(1), Vec::<Value>::new()).unwrap(), vec![json!(1)]);
    }

    #[test]
    fn default_sort_compares_string_forms() {
        let model = isolated(json!({"items": [10, 9, 1, "b", "a"]}));
        let items = items_of(&model);
        items.sort().unwrap();
        assert_eq!(items.to_value(), json!([1, 10, 9, "a", "b"]));
    }

    #[test]
    fn sort_by_comparator() {
        let model = isolated(json!({"items": [{"n": 2}, {"n": 1}, {"n": 3}]}));
        let items = items_of(&model);
        items
            .sort_by(|a, b| a["n"].as_i64().cmp(&b["n"].as_i64()))
            .unwrap();
        assert_eq!(items.to_value(), json!([{"n": 1}, {"n": 2}, {"n": 3}]));
    }

    #[test]
    fn comparator_may_read_the_model() {
        let model = isolated(json!({"items": [3, 1, 2]}));
        let reader = model.clone();
        let seen_len = Rc::new(std::cell::Cell::new(0));
        let seen = Rc::clone(&seen_len);
        items_of(&model)
            .sort_by(move |a, b| {
                let len = reader.value_at("items.length").and_then(|v| v.as_u64());
                seen.set(len.unwrap_or_default());
                a.as_i64().cmp(&b.as_i64())
            })
            .unwrap();
        assert_eq!(seen_len.get(), 3);
        assert_eq!(model.value_at("items"), Some(json!([1, 2, 3])));
    }

    #[test]
    fn sort_keeps_nodes_and_rebases_them() {
        let model = isolated(json!({"items": [{"k": "b"}, {"k": "a"}]}));
        let items = items_of(&model);
        let b = items.get("0").and_then(Slot::into_node).unwrap();
        items
            .sort_by(|x, y| x["k"].as_str().cmp(&y["k"].as_str()))
            .unwrap();
        assert!(items.get("1").and_then(Slot::into_node).unwrap().ptr_eq(&b));
        assert_eq!(b.chain(), "items.1");
    }

    #[test]
    fn reordering_rebases_child_chains() {
        let model = isolated(json!({"items": [{"id": "a"}, {"id": "b"}]}));
        let items = items_of(&model);
        let a = items.get("0").and_then(Slot::into_node).unwrap();
        items.reverse().unwrap();
        assert_eq!(a.chain(), "items.1");

        let log = record(&model, "items.1.id");
        a.set("id", "z").unwrap();
        assert_eq!(*log.borrow(), vec!["items.1.id"]);
    }

    #[test]
    fn copy_within_does_not_alias_nodes() {
        let model = isolated(json!({"items": [{"v": 1}, {"v": 2}]}));
        let items = items_of(&model);
        items.copy_within(1, 0, Some(1)).unwrap();
        let first = items.get("0").and_then(Slot::into_node).unwrap();
        let second = items.get("1").and_then(Slot::into_node).unwrap();
        assert!(!first.ptr_eq(&second));
        second.set("v", 5).unwrap();
        assert_eq!(items.to_value(), json!([{"v": 1}, {"v": 5}]));
    }

    #[test]
    fn object_node_rejects_array_ops() {
        let model = isolated(json!({"obj": {"a": 1}}));
        let all = record(&model, "*");
        let obj = model.get("obj").and_then(Slot::into_node).unwrap();
        assert!(matches!(obj.push([1]), Err(ModelError::NotAnArray { .. })));
        assert!(matches!(obj.apply(ArrayOp::Len), Err(ModelError::NotAnArray { .. })));
        assert!(all.borrow().is_empty());
    }

    #[test]
    fn non_extensible_array_cannot_grow() {
        let model = isolated(json!({"items": [1, 2]}));
        let items = items_of(&model);
        items.prevent_extensions();
        let all = record(&model, "*");

        assert!(matches!(items.push([3]), Err(ModelError::NotExtensible { .. })));
        assert!(matches!(items.unshift([0]), Err(ModelError::NotExtensible { .. })));
        assert!(all.borrow().is_empty());

        assert_eq!(items.pop().unwrap(), Some(json!(2)));
        assert_eq!(items.splice(0, Some(1), [9]).unwrap(), vec![json!(1)]);
        assert_eq!(items.to_value(), json!([9]));
    }

    #[test]
    fn root_array_model() {
        let model = isolated(json!([1]));
        let all = record(&model, "*");
        let first = record(&model, "1");
        model.push([2]).unwrap();
        assert_eq!(*first.borrow(), vec!["1"]);
        assert_eq!(all.borrow().len(), 1);
    }

    #[test]
    fn policies() {
        let config = ModelConfig::default();
        assert_eq!(ArrayOp::Push(vec![]).policy(&config), NotifyPolicy::Index);
        assert_eq!(ArrayOp::Pop.policy(&config), NotifyPolicy::Own);
        assert_eq!(ArrayOp::Slice { start: 0, end: None }.policy(&config), NotifyPolicy::None);
        assert_eq!(ArrayOp::Len.policy(&config), NotifyPolicy::None);
        let config = ModelConfig {
            notify_on_slice: true,
            ..Default::default()
        };
        assert_eq!(ArrayOp::Slice { start: 0, end: None }.policy(&config), NotifyPolicy::Own);
    }

    #[test]
    fn sort_keys() {
        assert_eq!(sort_key(&json!(null)), "null");
        assert_eq!(sort_key(&json!([1, null, "a"])), "1,,a");
        assert_eq!(sort_key(&json!({"a": 1})), "[object Object]");
        assert_eq!(sort_key(&json!(1.5)), "1.5");
    }
}
