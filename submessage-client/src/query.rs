//! Storage reads and custom RPC calls.
use std::sync::Arc;

use codec::Decode;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use snafu::{ensure, OptionExt, ResultExt};

use crate::error::{
    HexDecodeSnafu,
    JsonDecodeSnafu,
    Result,
    ReturnTypeMismatchSnafu,
    RpcAritySnafu,
    RpcArgumentSnafu,
    UnknownRpcMethodSnafu,
};
use crate::rpc_registry::RpcRegistry;
use crate::session::{RpcTransport, Session};
use crate::storage::{decode_cell, StorageKey};

/// Issues read-only requests against a node.
///
/// Each call is independent: concurrent calls may complete in any order, and a
/// failed decode only fails the call that triggered it.
#[derive(Clone)]
pub struct QueryInvoker {
    /// Where requests go.
    transport: Arc<dyn RpcTransport>,
    /// Custom RPC methods that may be called.
    registry: Arc<RpcRegistry>,
}

impl QueryInvoker {
    /// Queries through an open session, using its registry.
    pub fn new(session: &Session) -> Self {
        Self {
            transport: Arc::new(session.clone()),
            registry: session.registry(),
        }
    }

    /// Queries through any transport.
    pub fn with_transport(transport: Arc<dyn RpcTransport>, registry: Arc<RpcRegistry>) -> Self {
        Self {
            transport,
            registry,
        }
    }

    /// Reads the raw bytes stored under `key` at the best block.
    pub async fn read_raw(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
        let what = format!("{}::{}", key.pallet(), key.entry());
        let value = self
            .transport
            .request("state_getStorage", vec![JsonValue::String(key.to_hex())])
            .await?;

        let hex_value: Option<String> =
            serde_json::from_value(value).context(JsonDecodeSnafu { what: what.clone() })?;
        hex_value
            .map(|hex_value| {
                hex::decode(hex_value.trim_start_matches("0x")).context(HexDecodeSnafu { what })
            })
            .transpose()
    }

    /// Reads and decodes the value under `key`, or `None` if nothing is stored.
    pub async fn read_storage<T: Decode>(&self, key: &StorageKey) -> Result<Option<T>> {
        let what = format!("{}::{}", key.pallet(), key.entry());
        let value = self
            .read_raw(key)
            .await?
            .map(|bytes| decode_cell::<T>(&bytes, &what))
            .transpose()?;
        debug!("read {what}: {}", if value.is_some() { "found" } else { "empty" });
        Ok(value)
    }

    /// Reads `key`, treating an empty cell as the type's default.
    pub async fn read_storage_or_default<T: Decode + Default>(&self, key: &StorageKey) -> Result<T> {
        Ok(self.read_storage(key).await?.unwrap_or_default())
    }

    /// Calls the registered custom RPC `<section>_<method>`.
    ///
    /// Arguments and the result are checked against the registered definition
    /// before the result is deserialised into `T`.
    pub async fn call_runtime_api<T: DeserializeOwned>(
        &self,
        section: &str,
        method: &str,
        args: Vec<JsonValue>,
    ) -> Result<T> {
        let definition = self
            .registry
            .get(section, method)
            .context(UnknownRpcMethodSnafu { section, method })?;
        let rpc_name = definition.rpc_name();

        ensure!(
            definition.params.len() == args.len(),
            RpcAritySnafu {
                method: rpc_name.clone(),
                expected: definition.params.len(),
                actual: args.len(),
            }
        );
        for (param, arg) in definition.params.iter().zip(&args) {
            ensure!(
                param.ty.check(arg),
                RpcArgumentSnafu {
                    method: rpc_name.clone(),
                    param: param.name.clone(),
                    expected: param.ty.name(),
                }
            );
        }

        let value = self.transport.request(&rpc_name, args).await?;
        ensure!(
            definition.returns.check(&value),
            ReturnTypeMismatchSnafu {
                method: rpc_name.clone(),
                expected: definition.returns.name(),
                value,
            }
        );

        serde_json::from_value(value).context(JsonDecodeSnafu { what: rpc_name })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use codec::Encode;
    use serde_json::json;

    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::rpc_registry::{RpcMethod, RpcType};
    use crate::storage::StorageHasher;

    /// An in-memory node answering `state_getStorage` and fixed RPC results.
    #[derive(Default)]
    pub(crate) struct FakeNode {
        /// Raw storage, keyed by hex key.
        pub storage: Mutex<HashMap<String, Vec<u8>>>,
        /// Canned RPC results.
        pub results: HashMap<String, JsonValue>,
        /// Methods called, in order.
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeNode {
        pub fn put(&self, key: &StorageKey, value: &impl Encode) {
            self.storage
                .lock()
                .unwrap()
                .insert(key.to_hex(), value.encode());
        }
    }

    #[async_trait]
    impl RpcTransport for FakeNode {
        async fn request(&self, method: &str, params: Vec<JsonValue>) -> Result<JsonValue> {
            self.calls.lock().unwrap().push(method.to_string());
            if method == "state_getStorage" {
                let key = params[0].as_str().unwrap();
                let storage = self.storage.lock().unwrap();
                return Ok(match storage.get(key) {
                    Some(bytes) => json!(format!("0x{}", hex::encode(bytes))),
                    None => JsonValue::Null,
                });
            }
            Ok(self.results.get(method).cloned().unwrap_or(JsonValue::Null))
        }
    }

    fn registry() -> Arc<RpcRegistry> {
        Arc::new(
            RpcRegistry::new()
                .with(RpcMethod::new("sumStorage", "getSum", RpcType::U32))
                .with(RpcMethod::new("demo", "echo", RpcType::Text).param("text", RpcType::Text)),
        )
    }

    fn invoker(node: FakeNode) -> (QueryInvoker, Arc<FakeNode>) {
        let node = Arc::new(node);
        (
            QueryInvoker::with_transport(node.clone(), registry()),
            node,
        )
    }

    #[tokio::test]
    async fn we_can_read_storage_values() {
        let node = FakeNode::default();
        let key = StorageKey::plain("SumStorage", "Thing1");
        node.put(&key, &3u32);
        let (invoker, _) = invoker(node);

        assert_eq!(invoker.read_storage::<u32>(&key).await.unwrap(), Some(3));

        let missing = StorageKey::plain("SumStorage", "Thing2");
        assert_eq!(invoker.read_storage::<u32>(&missing).await.unwrap(), None);
        assert_eq!(invoker.read_storage_or_default::<u32>(&missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn we_cannot_read_storage_as_the_wrong_type() {
        let node = FakeNode::default();
        let key = StorageKey::plain("SumStorage", "Thing1")
            .key(StorageHasher::Twox64Concat, &1u8);
        node.put(&key, &3u16);
        let (invoker, _) = invoker(node);

        let err = invoker.read_storage::<u32>(&key).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        // The invoker stays usable after a decode failure.
        assert_eq!(invoker.read_storage::<u16>(&key).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn we_can_call_a_registered_runtime_api() {
        let node = FakeNode {
            results: HashMap::from([
                ("sumStorage_getSum".to_string(), json!(7)),
                ("demo_echo".to_string(), json!("hi")),
            ]),
            ..Default::default()
        };
        let (invoker, node) = invoker(node);

        let sum: u32 = invoker
            .call_runtime_api("sumStorage", "getSum", vec![])
            .await
            .unwrap();
        assert_eq!(sum, 7);

        let echoed: String = invoker
            .call_runtime_api("demo", "echo", vec![json!("hi")])
            .await
            .unwrap();
        assert_eq!(echoed, "hi");
        assert_eq!(
            *node.calls.lock().unwrap(),
            vec!["sumStorage_getSum".to_string(), "demo_echo".to_string()]
        );
    }

    #[tokio::test]
    async fn we_cannot_misuse_a_runtime_api() {
        let node = FakeNode {
            results: HashMap::from([("sumStorage_getSum".to_string(), json!("seven"))]),
            ..Default::default()
        };
        let (invoker, node) = invoker(node);

        let err = invoker
            .call_runtime_api::<u32>("sumStorage", "getProduct", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRpcMethod { .. }));

        let err = invoker
            .call_runtime_api::<u32>("sumStorage", "getSum", vec![json!(1)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RpcArity { expected: 0, actual: 1, .. }));

        let err = invoker
            .call_runtime_api::<String>("demo", "echo", vec![json!(5)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RpcArgument { .. }));

        // None of the rejected calls reached the node.
        assert!(node.calls.lock().unwrap().is_empty());

        let err = invoker
            .call_runtime_api::<u32>("sumStorage", "getSum", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReturnTypeMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
