//! Plain, detached copies of model data.

use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::Result;
use crate::model::Model;
use crate::node::{Node, Slot, Storage};

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.data.borrow().storage {
            Storage::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, slot) in map {
                    out.serialize_entry(key, slot)?;
                }
                out.end()
            }
            Storage::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for slot in items {
                    out.serialize_element(slot)?;
                }
                out.end()
            }
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Slot::Value(value) => value.serialize(serializer),
            Slot::Node(node) => node.serialize(serializer),
        }
    }
}

impl Model {
    /// Detached copy of the whole tree, or of the value at `chain`.
    ///
    /// Returns `Ok(None)` when `chain` does not resolve. Mutating the copy
    /// never affects the model and never notifies.
    pub fn to_object(&self, chain: Option<&str>) -> Result<Option<Value>> {
        let slot = match chain {
            None => Some(Slot::Node(self.root.clone())),
            Some(chain) => self.get_chain_value(chain),
        };
        slot.map(|slot| serde_json::to_value(&slot))
            .transpose()
            .map_err(Into::into)
    }

    /// Like [`to_object`](Self::to_object), deserialized into `T`.
    pub fn to_object_as<T: DeserializeOwned>(&self, chain: Option<&str>) -> Result<Option<T>> {
        match self.to_object(chain)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}
