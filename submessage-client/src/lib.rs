//! # Substrate Channel Client
//!
//! This library talks to a Substrate node over a single WebSocket session: it reads
//! storage, calls custom RPCs, derives sr25519 keys, and submits extrinsics while
//! tracking them to finality.

/// SS58 account addresses.
pub mod address;

/// Runtime calls.
///
/// Builds pallet calls from names and dynamic values, encoded against the node's
/// metadata when signed.
pub mod call;

/// Dispatch error decoding.
///
/// Resolves module errors reported by `System::ExtrinsicFailed` to pallet and
/// variant names using the runtime metadata.
pub mod dispatch_error;

/// Error handling module.
///
/// Defines a custom error type using the `snafu` crate to provide detailed and structured
/// error messages for various failures encountered when interacting with the blockchain.
pub mod error;

/// Application pallets
pub mod pallets;

/// Storage reads and custom RPC calls.
pub mod query;

/// Registry of custom RPC methods.
pub mod rpc_registry;

/// Connection to a node.
pub mod session;

/// Cryptographic signer module.
///
/// Derives sr25519 keys from seeds and derivation paths, or loads them from disk.
pub mod signer;

/// Raw storage keys
pub mod storage;

/// Transaction status tracking.
pub mod tx_status;

/// Transaction submission module.
///
/// Signs extrinsics, submits them, and exposes their progress as a stream ending in
/// a terminal status.
pub mod tx_submitter;
