use snafu::Snafu;
use subxt::utils::H256;

use crate::tx_status::TransactionStatus;

/// Represents errors that can occur while connecting to a node, querying it,
/// deriving keys, and submitting or tracking transactions.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The endpoint does not use a WebSocket scheme.
    #[snafu(display("Unsupported endpoint scheme '{scheme}' in {endpoint}, expected ws or wss"))]
    UnsupportedScheme {
        /// The rejected endpoint.
        endpoint: String,
        /// The scheme found in the endpoint.
        scheme: String,
    },

    /// Error when opening the WebSocket transport to the node.
    #[snafu(display("Failed to reach node at {endpoint}: {source}"))]
    Transport {
        /// The endpoint that could not be reached.
        endpoint: String,
        /// The underlying jsonrpsee client error.
        source: jsonrpsee::core::client::Error,
    },

    /// Error while negotiating metadata and runtime version with the node.
    #[snafu(display("Handshake with node at {endpoint} failed: {source}"))]
    Handshake {
        /// The endpoint the handshake was attempted against.
        endpoint: String,
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// Error when reading a key from a file.
    #[snafu(display("Failed to read key from file '{}': {}", path, source))]
    KeyFileRead {
        /// The path of the key file that could not be read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Error when parsing a key from a hexadecimal string.
    #[snafu(display("Failed to parse key as hex: {}", source))]
    KeyParse {
        /// The underlying hex parsing error.
        source: hex::FromHexError,
    },

    /// sr25519 secret keys must be exactly 32 bytes long.
    #[snafu(display("Invalid key length: expected 32 bytes, got {}", length))]
    InvalidKeyLength {
        /// The actual length of the provided key.
        length: usize,
    },

    /// The seed and derivation path do not form a valid secret URI.
    #[snafu(display("Invalid seed or derivation path: {source}"))]
    InvalidSeed {
        /// The underlying secret URI error.
        source: subxt_signer::SecretUriError,
    },

    /// The derivation path must be empty or start with a junction.
    #[snafu(display("Invalid derivation path '{path}': junctions start with '/'"))]
    InvalidDerivationPath {
        /// The rejected path.
        path: String,
    },

    /// The secret URI parsed but no keypair could be derived from it.
    #[snafu(display("Failed to derive keypair: {source}"))]
    KeyDerivation {
        /// The underlying sr25519 error.
        source: subxt_signer::sr25519::Error,
    },

    /// An address string is not valid base58.
    #[snafu(display("Invalid base58 in address: {source}"))]
    AddressBase58 {
        /// The underlying base58 error.
        source: bs58::decode::Error,
    },

    /// An address or public key has the wrong length.
    #[snafu(display("Invalid address length: {length} bytes"))]
    AddressLength {
        /// The decoded length.
        length: usize,
    },

    /// The checksum embedded in an address does not match its payload.
    #[snafu(display("Invalid address checksum"))]
    AddressChecksum,

    /// The network prefix is outside the SS58 range.
    #[snafu(display("Invalid SS58 prefix {prefix}"))]
    AddressPrefix {
        /// The offending prefix.
        prefix: u16,
    },

    /// Bytes returned by the node do not decode as the expected type.
    #[snafu(display("Failed to decode {what}: {source}"))]
    Decode {
        /// What was being decoded.
        what: String,
        /// The underlying SCALE codec error.
        source: codec::Error,
    },

    /// Hex returned by the node is malformed.
    #[snafu(display("Failed to decode hex for {what}: {source}"))]
    HexDecode {
        /// What was being decoded.
        what: String,
        /// The underlying hex error.
        source: hex::FromHexError,
    },

    /// JSON returned by the node does not deserialise as the expected type.
    #[snafu(display("Failed to deserialise {what}: {source}"))]
    JsonDecode {
        /// What was being decoded.
        what: String,
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// A custom RPC returned a value that does not match its declared type.
    #[snafu(display("RPC {method} returned {value}, which is not a {expected}"))]
    ReturnTypeMismatch {
        /// The full RPC method name.
        method: String,
        /// The declared return type.
        expected: String,
        /// The value that was returned.
        value: serde_json::Value,
    },

    /// The custom RPC is not present in the registry.
    #[snafu(display("Unknown RPC method {section}_{method}"))]
    UnknownRpcMethod {
        /// The RPC section.
        section: String,
        /// The RPC method within the section.
        method: String,
    },

    /// A custom RPC was called with the wrong number of arguments.
    #[snafu(display("RPC {method} expects {expected} arguments, got {actual}"))]
    RpcArity {
        /// The full RPC method name.
        method: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// A custom RPC argument does not match its declared type.
    #[snafu(display("Argument '{param}' of RPC {method} must be a {expected}"))]
    RpcArgument {
        /// The full RPC method name.
        method: String,
        /// The parameter name.
        param: String,
        /// The declared parameter type.
        expected: String,
    },

    /// Error when reading RPC definitions.
    #[snafu(display("Invalid RPC definitions: {source}"))]
    RpcDefinitions {
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// Error when reading an RPC definitions file.
    #[snafu(display("Failed to read RPC definitions from '{}': {}", path, source))]
    RpcDefinitionsRead {
        /// The path of the definitions file.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A request to the node failed at the transport or RPC level.
    #[snafu(display("RPC {method} failed: {source}"))]
    Rpc {
        /// The RPC method name.
        method: String,
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// Error while resolving nonce or mortality, or signing the extrinsic.
    #[snafu(display("Error building extrinsic: {source}"))]
    Build {
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// The node rejected the extrinsic before it entered the pool.
    #[snafu(display("Error submitting tx: {source}"))]
    Submission {
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// The status subscription failed after the extrinsic was pooled.
    #[snafu(display("Error while watching transaction progress: {source}"))]
    StatusStream {
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// The status subscription closed before a terminal status arrived.
    #[snafu(display("Status stream for {extrinsic_hash:?} ended before a terminal status"))]
    StatusStreamEnded {
        /// The watched extrinsic.
        extrinsic_hash: H256,
    },

    /// Error when fetching a block or its events to find the dispatch outcome.
    #[snafu(display("Error fetching blockchain events for block {block_hash:?}: {source}"))]
    FetchEvents {
        /// The block being inspected.
        block_hash: H256,
        /// The underlying error from the `subxt` library.
        source: subxt::Error,
    },

    /// The finalized block does not contain the watched extrinsic.
    #[snafu(display("Extrinsic {extrinsic_hash:?} not found in block {block_hash:?}"))]
    ExtrinsicNotInBlock {
        /// The block that was searched.
        block_hash: H256,
        /// The watched extrinsic.
        extrinsic_hash: H256,
    },

    /// Neither `ExtrinsicSuccess` nor `ExtrinsicFailed` was emitted for the extrinsic.
    #[snafu(display("No dispatch event for {extrinsic_hash:?} in block {block_hash:?}"))]
    MissingDispatchEvent {
        /// The block that was searched.
        block_hash: H256,
        /// The watched extrinsic.
        extrinsic_hash: H256,
    },

    /// The transaction pool discarded the extrinsic before inclusion.
    #[snafu(display("Transaction rejected by the pool: {status}"))]
    PoolRejection {
        /// The terminal status reported for the extrinsic.
        status: TransactionStatus,
    },

    /// The transaction was included in a block but failed execution.
    #[snafu(display("Extrinsic execution failed in block {block_hash:?}: {error}"))]
    DispatchFailure {
        /// The finalized block containing the failed extrinsic.
        block_hash: H256,
        /// The decoded dispatch error.
        error: crate::dispatch_error::DispatchErrorDetails,
    },
}

/// Coarse classification of [`Error`], used by callers deciding how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The node is unreachable or the handshake failed. Fatal to the session.
    Connection,
    /// A response did not match the expected type. Only the triggering call fails.
    Decode,
    /// The extrinsic never entered the pool.
    Submission,
    /// The pool dropped, invalidated or replaced the extrinsic.
    PoolRejection,
    /// The extrinsic was finalized but its execution failed.
    DispatchFailure,
    /// Seed, path or key material is malformed.
    InvalidSeed,
    /// A query or status subscription failed in flight.
    Query,
    /// The caller misused the RPC registry or supplied a bad address.
    Configuration,
    /// Local file access failed.
    Io,
}

impl Error {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedScheme { .. } | Error::Transport { .. } | Error::Handshake { .. } => {
                ErrorKind::Connection
            }
            Error::Decode { .. }
            | Error::HexDecode { .. }
            | Error::JsonDecode { .. }
            | Error::ReturnTypeMismatch { .. } => ErrorKind::Decode,
            Error::Build { .. } | Error::Submission { .. } => ErrorKind::Submission,
            Error::PoolRejection { .. } => ErrorKind::PoolRejection,
            Error::DispatchFailure { .. } => ErrorKind::DispatchFailure,
            Error::KeyParse { .. }
            | Error::InvalidKeyLength { .. }
            | Error::InvalidSeed { .. }
            | Error::InvalidDerivationPath { .. }
            | Error::KeyDerivation { .. } => ErrorKind::InvalidSeed,
            Error::Rpc { .. }
            | Error::StatusStream { .. }
            | Error::StatusStreamEnded { .. }
            | Error::FetchEvents { .. }
            | Error::ExtrinsicNotInBlock { .. }
            | Error::MissingDispatchEvent { .. } => ErrorKind::Query,
            Error::AddressBase58 { .. }
            | Error::AddressLength { .. }
            | Error::AddressChecksum
            | Error::AddressPrefix { .. }
            | Error::UnknownRpcMethod { .. }
            | Error::RpcArity { .. }
            | Error::RpcArgument { .. }
            | Error::RpcDefinitions { .. } => ErrorKind::Configuration,
            Error::KeyFileRead { .. } | Error::RpcDefinitionsRead { .. } => ErrorKind::Io,
        }
    }
}

/// Type alias for results that return a `Result<T, Error>`, simplifying error handling.
///
/// This is useful for functions that return `Error` as the failure case.
pub type Result<T, E = Error> = std::result::Result<T, E>;
