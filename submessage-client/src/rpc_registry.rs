//! Custom RPC methods the client knows how to call.
//!
//! Each method is described by its section, name, parameter types and return type.
//! The registry is built by the caller and handed to the session; there is no
//! global registration. Definitions can be loaded from JSON in the polkadot-js
//! layout:
//!
//! ```json
//! { "sumStorage": { "getSum": { "description": "...", "params": [], "type": "u32" } } }
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use snafu::ResultExt;

use crate::error::{Result, RpcDefinitionsReadSnafu, RpcDefinitionsSnafu};

/// Value types a custom RPC can take or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcType {
    /// Unsigned 32-bit integer, as a JSON number.
    U32,
    /// Unsigned 64-bit integer, as a JSON number.
    U64,
    /// Unsigned 128-bit integer, as a JSON number or a decimal/hex string.
    U128,
    /// Boolean.
    Bool,
    /// `0x`-prefixed hex bytes.
    Bytes,
    /// UTF-8 text.
    Text,
    /// `0x`-prefixed 32-byte hash.
    Hash,
}

impl RpcType {
    /// Whether `value` has the shape of this type.
    pub fn check(&self, value: &JsonValue) -> bool {
        match self {
            Self::U32 => value.as_u64().is_some_and(|n| n <= u64::from(u32::MAX)),
            Self::U64 => value.as_u64().is_some(),
            Self::U128 => {
                value.as_u64().is_some()
                    || value.as_str().is_some_and(|s| {
                        s.parse::<u128>().is_ok()
                            || s.strip_prefix("0x")
                                .is_some_and(|h| u128::from_str_radix(h, 16).is_ok())
                    })
            }
            Self::Bool => value.is_boolean(),
            Self::Bytes => value.as_str().is_some_and(is_hex),
            Self::Text => value.is_string(),
            Self::Hash => value
                .as_str()
                .is_some_and(|s| is_hex(s) && s.len() == 2 + 64),
        }
    }

    /// The name used in definition files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Bool => "bool",
            Self::Bytes => "bytes",
            Self::Text => "text",
            Self::Hash => "hash",
        }
    }
}

/// `0x` followed by an even number of hex digits.
fn is_hex(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|h| h.len() % 2 == 0 && h.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcParam {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: RpcType,
}

/// A custom RPC method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcMethod {
    /// RPC section, e.g. `sumStorage`.
    pub section: String,
    /// Method within the section, e.g. `getSum`.
    pub method: String,
    /// Human readable description.
    pub description: String,
    /// Declared parameters, in call order.
    pub params: Vec<RpcParam>,
    /// Declared return type.
    pub returns: RpcType,
}

impl RpcMethod {
    /// A method with no parameters.
    pub fn new(section: &str, method: &str, returns: RpcType) -> Self {
        Self {
            section: section.to_string(),
            method: method.to_string(),
            description: String::new(),
            params: Vec::new(),
            returns,
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Appends a parameter.
    pub fn param(mut self, name: &str, ty: RpcType) -> Self {
        self.params.push(RpcParam {
            name: name.to_string(),
            ty,
        });
        self
    }

    /// The JSON-RPC method name, `<section>_<method>`.
    pub fn rpc_name(&self) -> String {
        format!("{}_{}", self.section, self.method)
    }
}

/// A method entry as written in a definitions file.
#[derive(Debug, Deserialize)]
struct MethodDefinition {
    /// Description text.
    #[serde(default)]
    description: String,
    /// Parameters.
    #[serde(default)]
    params: Vec<RpcParam>,
    /// Return type.
    #[serde(rename = "type")]
    returns: RpcType,
}

/// The set of custom RPC methods a session recognises.
#[derive(Debug, Clone, Default)]
pub struct RpcRegistry {
    /// Methods keyed by `(section, method)`.
    methods: BTreeMap<(String, String), RpcMethod>,
}

impl RpcRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method, replacing any previous definition with the same name.
    pub fn register(&mut self, method: RpcMethod) -> &mut Self {
        self.methods
            .insert((method.section.clone(), method.method.clone()), method);
        self
    }

    /// Builder form of [`RpcRegistry::register`].
    pub fn with(mut self, method: RpcMethod) -> Self {
        self.register(method);
        self
    }

    /// Looks up a method.
    pub fn get(&self, section: &str, method: &str) -> Option<&RpcMethod> {
        self.methods.get(&(section.to_string(), method.to_string()))
    }

    /// All registered methods, ordered by section then name.
    pub fn methods(&self) -> impl Iterator<Item = &RpcMethod> {
        self.methods.values()
    }

    /// Parses polkadot-js style definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let sections: BTreeMap<String, BTreeMap<String, MethodDefinition>> =
            serde_json::from_str(json).context(RpcDefinitionsSnafu)?;

        let mut registry = Self::new();
        for (section, methods) in sections {
            for (method, definition) in methods {
                registry.register(RpcMethod {
                    section: section.clone(),
                    method,
                    description: definition.description,
                    params: definition.params,
                    returns: definition.returns,
                });
            }
        }
        Ok(registry)
    }

    /// Reads definitions from a JSON file.
    pub async fn from_file(path: &str) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .context(RpcDefinitionsReadSnafu {
                path: path.to_string(),
            })?;
        Self::from_json(&json)
    }

    /// Merges another registry into this one.
    pub fn extend(&mut self, other: RpcRegistry) {
        self.methods.extend(other.methods);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn we_can_load_polkadot_js_definitions() {
        let registry = RpcRegistry::from_json(
            r#"{
                "sumStorage": {
                    "getSum": { "description": "Gets the sum of the two storage values.", "params": [], "type": "u32" }
                },
                "subMessage": {
                    "commonKey": {
                        "params": [{ "name": "channelId", "type": "text" }, { "name": "account", "type": "hash" }],
                        "type": "bytes"
                    }
                }
            }"#,
        )
        .unwrap();

        let get_sum = registry.get("sumStorage", "getSum").unwrap();
        assert_eq!(get_sum.rpc_name(), "sumStorage_getSum");
        assert_eq!(get_sum.returns, RpcType::U32);
        assert!(get_sum.params.is_empty());

        let common_key = registry.get("subMessage", "commonKey").unwrap();
        assert_eq!(common_key.params.len(), 2);
        assert_eq!(common_key.params[1].ty, RpcType::Hash);
        assert_eq!(registry.methods().count(), 2);

        assert!(registry.get("sumStorage", "getProduct").is_none());
    }

    #[test]
    fn we_cannot_load_malformed_definitions() {
        let err = RpcRegistry::from_json(r#"{"sumStorage": {"getSum": {"type": "f64"}}}"#)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn we_can_check_values_against_declared_types() {
        assert!(RpcType::U32.check(&json!(7)));
        assert!(!RpcType::U32.check(&json!(u64::from(u32::MAX) + 1)));
        assert!(!RpcType::U32.check(&json!("7")));
        assert!(RpcType::U128.check(&json!("340282366920938463463374607431768211455")));
        assert!(RpcType::U128.check(&json!("0xff")));
        assert!(RpcType::Bytes.check(&json!("0x6b31")));
        assert!(!RpcType::Bytes.check(&json!("0x6b3")));
        assert!(RpcType::Hash.check(&json!(format!("0x{}", "ab".repeat(32)))));
        assert!(!RpcType::Hash.check(&json!("0xab")));
        assert!(RpcType::Bool.check(&json!(true)));
        assert!(RpcType::Text.check(&json!("abc123")));
    }

    #[test]
    fn we_can_register_methods_by_hand() {
        let mut registry = RpcRegistry::new();
        registry.register(
            RpcMethod::new("sumStorage", "getSum", RpcType::U32)
                .description("Gets the sum of the two storage values."),
        );
        registry.extend(
            RpcRegistry::new().with(RpcMethod::new("chain", "custom", RpcType::Bool).param("flag", RpcType::Bool)),
        );
        assert_eq!(registry.methods().count(), 2);
        assert_eq!(registry.get("chain", "custom").unwrap().params[0].name, "flag");
    }
}
