//! The connection to one node.
//!
//! A [`Session`] owns a single WebSocket transport. Requests and subscriptions from
//! every clone of the session are multiplexed over it, and responses are matched to
//! requests by id. There is one connection attempt and no reconnection.
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::ws_client::WsClientBuilder;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use snafu::{ensure, ResultExt};
use subxt::backend::rpc::{RpcClient, RpcParams, RpcSubscription};
use subxt::{OnlineClient, PolkadotConfig};
use url::Url;

use crate::address::DEFAULT_SS58_PREFIX;
use crate::dispatch_error::ErrorTable;
use crate::error::{
    HandshakeSnafu,
    Result,
    RpcSnafu,
    TransportSnafu,
    UnsupportedSchemeSnafu,
};
use crate::rpc_registry::RpcRegistry;

/// Default timeout for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for opening the connection.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default limit on request and response sizes.
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 50 * 1024 * 1024;

/// Everything needed to open a [`Session`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// `ws://` or `wss://` endpoint of the node.
    pub endpoint: Url,
    /// Custom RPC methods the session may call.
    pub registry: RpcRegistry,
    /// Timeout for a single request.
    pub request_timeout: Duration,
    /// Timeout for opening the connection.
    pub connection_timeout: Duration,
    /// Largest request the client will send.
    pub max_request_size: u32,
    /// Largest response the client will accept.
    pub max_response_size: u32,
}

impl ConnectionConfig {
    /// A config with default timeouts and an empty registry.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            registry: RpcRegistry::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            max_request_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_response_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Sets the custom RPC registry.
    pub fn registry(mut self, registry: RpcRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets both message size limits.
    pub fn max_message_size(mut self, bytes: u32) -> Self {
        self.max_request_size = bytes;
        self.max_response_size = bytes;
        self
    }
}

/// One-shot JSON-RPC requests.
///
/// [`Session`] is the production implementation; queries only depend on this trait.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Calls `method` with positional `params` and returns the raw JSON result.
    async fn request(&self, method: &str, params: Vec<JsonValue>) -> Result<JsonValue>;
}

/// An open connection to a node.
#[derive(Clone)]
pub struct Session {
    /// The endpoint this session is connected to.
    endpoint: Url,
    /// Raw RPC access over the shared transport.
    rpc: RpcClient,
    /// Typed chain access over the same transport.
    api: OnlineClient<PolkadotConfig>,
    /// Custom RPC methods this session recognises.
    registry: Arc<RpcRegistry>,
    /// Module error names from the runtime metadata.
    error_table: Arc<ErrorTable>,
    /// The chain's SS58 address prefix.
    ss58_prefix: u16,
}

impl Session {
    /// Opens the transport and performs the handshake.
    ///
    /// Fails with a connection error if the endpoint is not `ws`/`wss`, cannot be
    /// reached, or does not complete the metadata and runtime-version handshake.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let endpoint = config.endpoint;
        ensure!(
            matches!(endpoint.scheme(), "ws" | "wss"),
            UnsupportedSchemeSnafu {
                endpoint: endpoint.to_string(),
                scheme: endpoint.scheme().to_string(),
            }
        );

        info!("🔵 Connecting to node: {endpoint}");
        let ws = WsClientBuilder::default()
            .request_timeout(config.request_timeout)
            .connection_timeout(config.connection_timeout)
            .max_request_size(config.max_request_size)
            .max_response_size(config.max_response_size)
            .build(endpoint.as_str())
            .await
            .context(TransportSnafu {
                endpoint: endpoint.to_string(),
            })?;

        let rpc = RpcClient::new(ws);
        let api = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc.clone())
            .await
            .context(HandshakeSnafu {
                endpoint: endpoint.to_string(),
            })?;

        let error_table = ErrorTable::from_metadata(&api.metadata());
        let ss58_prefix = read_ss58_prefix(&api);
        info!(
            "🟢 Connected to {endpoint} ({} module errors known)",
            error_table.len()
        );

        Ok(Self {
            endpoint,
            rpc,
            api,
            registry: Arc::new(config.registry),
            error_table: Arc::new(error_table),
            ss58_prefix,
        })
    }

    /// The endpoint this session is connected to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Raw RPC access.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Typed chain access.
    pub fn api(&self) -> &OnlineClient<PolkadotConfig> {
        &self.api
    }

    /// The custom RPC registry.
    pub fn registry(&self) -> Arc<RpcRegistry> {
        Arc::clone(&self.registry)
    }

    /// Module error names for this runtime.
    pub fn error_table(&self) -> Arc<ErrorTable> {
        Arc::clone(&self.error_table)
    }

    /// The chain's SS58 address prefix.
    pub fn ss58_prefix(&self) -> u16 {
        self.ss58_prefix
    }

    /// Opens a subscription. Dropping the returned stream unsubscribes.
    pub async fn subscribe<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<JsonValue>,
        unsubscribe: &str,
    ) -> Result<RpcSubscription<T>> {
        let params = rpc_params(method, params)?;
        self.rpc
            .subscribe(method, params, unsubscribe)
            .await
            .context(RpcSnafu { method })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.as_str())
            .field("ss58_prefix", &self.ss58_prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RpcTransport for Session {
    async fn request(&self, method: &str, params: Vec<JsonValue>) -> Result<JsonValue> {
        let params = rpc_params(method, params)?;
        self.rpc
            .request::<JsonValue>(method, params)
            .await
            .context(RpcSnafu { method })
    }
}

/// Packs positional JSON values into subxt's parameter list.
fn rpc_params(method: &str, params: Vec<JsonValue>) -> Result<RpcParams> {
    let mut rpc_params = RpcParams::new();
    for param in params {
        rpc_params.push(param).context(RpcSnafu { method })?;
    }
    Ok(rpc_params)
}

/// Reads `System::SS58Prefix`, falling back to the generic prefix.
fn read_ss58_prefix(api: &OnlineClient<PolkadotConfig>) -> u16 {
    let address = subxt::dynamic::constant("System", "SS58Prefix");
    let prefix = api
        .constants()
        .at(&address)
        .map_err(|err| err.to_string())
        .and_then(|value| value.as_type::<u16>().map_err(|err| err.to_string()));
    match prefix {
        Ok(prefix) => prefix,
        Err(err) => {
            warn!("⚠️ Could not read System::SS58Prefix ({err}), using {DEFAULT_SS58_PREFIX}");
            DEFAULT_SS58_PREFIX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};

    #[test]
    fn we_can_build_a_config_with_defaults() {
        let config = ConnectionConfig::new("ws://127.0.0.1:9944".parse().unwrap())
            .request_timeout(Duration::from_secs(5))
            .max_message_size(1024);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.connection_timeout, DEFAULT_CONNECTION_TIMEOUT);
        assert_eq!(config.max_request_size, 1024);
        assert_eq!(config.max_response_size, 1024);
        assert_eq!(config.registry.methods().count(), 0);
    }

    #[tokio::test]
    async fn we_cannot_connect_to_a_non_websocket_endpoint() {
        let config = ConnectionConfig::new("http://127.0.0.1:9944".parse().unwrap());
        let err = Session::connect(config).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme { ref scheme, .. } if scheme == "http"));
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn we_cannot_connect_to_an_unreachable_node() {
        let config = ConnectionConfig::new("ws://127.0.0.1:1".parse().unwrap())
            .connection_timeout(Duration::from_secs(2));
        let err = Session::connect(config).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(err.kind(), ErrorKind::Connection);
    }
}
