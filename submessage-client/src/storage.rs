//! Raw storage keys and SCALE decoding of storage cells.
//!
//! A storage key is `twox128(pallet) ‖ twox128(entry)` followed by each map key
//! hashed with the hasher the pallet declared for it.
use codec::{DecodeAll, Encode};
use snafu::ResultExt;
use sp_core::hashing::{blake2_128, blake2_256, twox_128, twox_256, twox_64};

use crate::error::{DecodeSnafu, Result};

/// Hashers a pallet can declare for a storage map key.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageHasher {
    /// `blake2_128(key) ‖ key`
    Blake2_128Concat,
    /// `twox64(key) ‖ key`
    Twox64Concat,
    /// `key`
    Identity,
    /// `blake2_128(key)`
    Blake2_128,
    /// `blake2_256(key)`
    Blake2_256,
    /// `twox128(key)`
    Twox128,
    /// `twox256(key)`
    Twox256,
}

impl StorageHasher {
    /// Hashes already SCALE-encoded key bytes.
    pub fn hash(&self, encoded: &[u8]) -> Vec<u8> {
        match self {
            Self::Blake2_128Concat => [&blake2_128(encoded)[..], encoded].concat(),
            Self::Twox64Concat => [&twox_64(encoded)[..], encoded].concat(),
            Self::Identity => encoded.to_vec(),
            Self::Blake2_128 => blake2_128(encoded).to_vec(),
            Self::Blake2_256 => blake2_256(encoded).to_vec(),
            Self::Twox128 => twox_128(encoded).to_vec(),
            Self::Twox256 => twox_256(encoded).to_vec(),
        }
    }
}

/// Address of one storage cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    /// Pallet name as declared in the runtime.
    pallet: String,
    /// Storage item name.
    entry: String,
    /// Hashed map keys, in declaration order.
    keys: Vec<Vec<u8>>,
}

impl StorageKey {
    /// A plain storage value, or the prefix of a map before any key is added.
    pub fn plain(pallet: &str, entry: &str) -> Self {
        Self {
            pallet: pallet.to_string(),
            entry: entry.to_string(),
            keys: Vec::new(),
        }
    }

    /// Appends a map key, SCALE-encoding it and hashing it with `hasher`.
    pub fn key(mut self, hasher: StorageHasher, key: &impl Encode) -> Self {
        self.keys.push(hasher.hash(&key.encode()));
        self
    }

    /// Appends a map key whose bytes are already in their encoded form.
    pub fn raw_key(mut self, hasher: StorageHasher, encoded: &[u8]) -> Self {
        self.keys.push(hasher.hash(encoded));
        self
    }

    /// The pallet this key belongs to.
    pub fn pallet(&self) -> &str {
        &self.pallet
    }

    /// The storage item this key belongs to.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// The full raw key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32 + self.keys.iter().map(Vec::len).sum::<usize>());
        bytes.extend_from_slice(&twox_128(self.pallet.as_bytes()));
        bytes.extend_from_slice(&twox_128(self.entry.as_bytes()));
        for key in &self.keys {
            bytes.extend_from_slice(key);
        }
        bytes
    }

    /// The full raw key as `0x`-prefixed hex, as the node RPC expects it.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }
}

/// Decodes a storage cell, requiring every byte to be consumed.
pub fn decode_cell<T: DecodeAll>(bytes: &[u8], what: &str) -> Result<T> {
    T::decode_all(&mut &bytes[..]).context(DecodeSnafu { what })
}
