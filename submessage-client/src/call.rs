//! Runtime calls built from names and dynamic values.
//!
//! Calls are encoded against the node's metadata at signing time, so no generated
//! runtime bindings are needed.
use subxt::ext::scale_value::{Composite, Value};
use subxt::tx::DynamicPayload;

use crate::address::Address;

/// A pallet call with named arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeCall {
    /// Pallet name, e.g. `SubMessage`.
    pallet: String,
    /// Call name, e.g. `new_channel`.
    call: String,
    /// Named arguments in declaration order.
    fields: Vec<(String, Value)>,
}

impl RuntimeCall {
    /// A call with no arguments yet.
    pub fn new(pallet: &str, call: &str) -> Self {
        Self {
            pallet: pallet.to_string(),
            call: call.to_string(),
            fields: Vec::new(),
        }
    }

    /// Appends a named argument.
    pub fn arg(mut self, name: &str, value: Value) -> Self {
        self.fields.push((name.to_string(), value));
        self
    }

    /// The pallet name.
    pub fn pallet(&self) -> &str {
        &self.pallet
    }

    /// The call name.
    pub fn call(&self) -> &str {
        &self.call
    }

    /// The named arguments.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    /// The payload subxt signs and encodes.
    pub fn to_payload(&self) -> DynamicPayload {
        subxt::dynamic::tx(
            self.pallet.as_str(),
            self.call.as_str(),
            Composite::named(self.fields.iter().cloned()),
        )
    }
}

/// An `AccountId32` argument.
pub fn account_value(address: &Address) -> Value {
    Value::from_bytes(address.as_bytes())
}

/// A `Vec<u8>` argument.
pub fn bytes_value(bytes: impl AsRef<[u8]>) -> Value {
    Value::from_bytes(bytes)
}
