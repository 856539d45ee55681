use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A message flowing through the transport.
///
/// `kind` classifies the message (serialized as `type`) and selects the
/// compactor applied to it while it is pending. `data` carries the
/// kind-specific payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Message {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Encode a serializable payload into a message of the given kind.
    pub fn encode<T: Serialize>(kind: impl Into<String>, payload: &T) -> Result<Self> {
        Ok(Self::new(kind, serde_json::to_value(payload)?))
    }

    /// Decode the payload into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.data)?)
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
