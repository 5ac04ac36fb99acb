//! Decoding of on-chain dispatch errors.
//!
//! A failed extrinsic emits `System::ExtrinsicFailed` carrying a SCALE-encoded
//! `DispatchError`. Module errors only carry a pallet index and an error index, so
//! turning them into something readable needs the name table from the runtime
//! metadata, held here as an [`ErrorTable`].
use std::collections::HashMap;
use std::fmt;

use codec::{Decode, Encode};
use snafu::ResultExt;
use subxt::Metadata;

use crate::error::{DecodeSnafu, Result};

/// Position of a module error inside its pallet's error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ModuleError {
    /// Index of the pallet in the runtime.
    pub index: u8,
    /// Error index followed by up to three bytes of nested error data.
    pub error: [u8; 4],
}

/// The SCALE layout of a runtime `DispatchError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum RawDispatchError {
    /// Some untyped error. The message is not carried over the wire.
    #[codec(index = 0)]
    Other,
    /// Failed to look up some data.
    #[codec(index = 1)]
    CannotLookup,
    /// A bad origin.
    #[codec(index = 2)]
    BadOrigin,
    /// A custom error in a module.
    #[codec(index = 3)]
    Module(ModuleError),
    /// At least one consumer is remaining so the account cannot be destroyed.
    #[codec(index = 4)]
    ConsumerRemaining,
    /// There are no providers so the account cannot be created.
    #[codec(index = 5)]
    NoProviders,
    /// There are too many consumers so the account cannot be created.
    #[codec(index = 6)]
    TooManyConsumers,
    /// An error to do with tokens.
    #[codec(index = 7)]
    Token(u8),
    /// An arithmetic error.
    #[codec(index = 8)]
    Arithmetic(u8),
    /// The number of transactional layers has been reached.
    #[codec(index = 9)]
    Transactional(u8),
    /// Resources exhausted.
    #[codec(index = 10)]
    Exhausted,
    /// The state is corrupt.
    #[codec(index = 11)]
    Corruption,
    /// Some resource is unavailable.
    #[codec(index = 12)]
    Unavailable,
    /// Root origin is not allowed.
    #[codec(index = 13)]
    RootNotAllowed,
}

impl RawDispatchError {
    /// Decodes the error from the leading bytes of an `ExtrinsicFailed` event's fields.
    ///
    /// Trailing bytes (the dispatch info) are left unread.
    pub fn from_event_fields(mut bytes: &[u8]) -> Result<Self> {
        Self::decode(&mut bytes).context(DecodeSnafu {
            what: "dispatch error",
        })
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Other => "Other",
            Self::CannotLookup => "CannotLookup",
            Self::BadOrigin => "BadOrigin",
            Self::Module(_) => "Module",
            Self::ConsumerRemaining => "ConsumerRemaining",
            Self::NoProviders => "NoProviders",
            Self::TooManyConsumers => "TooManyConsumers",
            Self::Token(_) => "Token",
            Self::Arithmetic(_) => "Arithmetic",
            Self::Transactional(_) => "Transactional",
            Self::Exhausted => "Exhausted",
            Self::Corruption => "Corruption",
            Self::Unavailable => "Unavailable",
            Self::RootNotAllowed => "RootNotAllowed",
        }
    }
}

/// A dispatch error in a form a person can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchErrorDetails {
    /// A pallet-defined error, resolved through the error table.
    Module {
        /// Pallet name, e.g. `Balances`.
        section: String,
        /// Error variant name, e.g. `InsufficientBalance`.
        name: String,
        /// The variant's documentation, joined into one line.
        docs: String,
    },
    /// Failed to look up some data.
    CannotLookup,
    /// The call was made with a bad origin.
    BadOrigin,
    /// Anything else, including module errors missing from the table.
    Other(String),
}

impl fmt::Display for DispatchErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module {
                section,
                name,
                docs,
            } if docs.is_empty() => write!(f, "{section}.{name}"),
            Self::Module {
                section,
                name,
                docs,
            } => write!(f, "{section}.{name}: {docs}"),
            Self::CannotLookup => f.write_str("CannotLookup"),
            Self::BadOrigin => f.write_str("BadOrigin"),
            Self::Other(message) => f.write_str(message),
        }
    }
}

/// Name and documentation of one module error.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ErrorEntry {
    /// Pallet name.
    section: String,
    /// Variant name.
    name: String,
    /// Documentation, joined with spaces.
    docs: String,
}

/// Maps `(pallet index, error index)` to the names declared by the runtime.
#[derive(Debug, Clone, Default)]
pub struct ErrorTable {
    /// Known module errors.
    entries: HashMap<(u8, u8), ErrorEntry>,
}

impl ErrorTable {
    /// An empty table. Every module error decodes to [`DispatchErrorDetails::Other`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from every pallet's error enum in the runtime metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mut table = Self::new();
        for pallet in metadata.pallets() {
            let Some(variants) = pallet.error_variants() else {
                continue;
            };
            for variant in variants {
                table.insert(
                    pallet.index(),
                    variant.index,
                    pallet.name(),
                    &variant.name,
                    &variant.docs.join(" "),
                );
            }
        }
        table
    }

    /// Adds or replaces one entry.
    pub fn insert(&mut self, pallet_index: u8, error_index: u8, section: &str, name: &str, docs: &str) {
        self.entries.insert(
            (pallet_index, error_index),
            ErrorEntry {
                section: section.to_string(),
                name: name.to_string(),
                docs: docs.trim().to_string(),
            },
        );
    }

    /// Number of known module errors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves a raw dispatch error.
    ///
    /// Module errors missing from the table are reported as `Other` with the raw
    /// pallet index and error bytes.
    pub fn decode(&self, error: &RawDispatchError) -> DispatchErrorDetails {
        match error {
            RawDispatchError::CannotLookup => DispatchErrorDetails::CannotLookup,
            RawDispatchError::BadOrigin => DispatchErrorDetails::BadOrigin,
            RawDispatchError::Module(ModuleError { index, error }) => {
                match self.entries.get(&(*index, error[0])) {
                    Some(entry) => DispatchErrorDetails::Module {
                        section: entry.section.clone(),
                        name: entry.name.clone(),
                        docs: entry.docs.clone(),
                    },
                    None => DispatchErrorDetails::Other(format!(
                        "Unknown module error: pallet index {index}, error 0x{}",
                        hex::encode(error)
                    )),
                }
            }
            RawDispatchError::Token(code)
            | RawDispatchError::Arithmetic(code)
            | RawDispatchError::Transactional(code) => {
                DispatchErrorDetails::Other(format!("{}({code})", error.variant_name()))
            }
            other => DispatchErrorDetails::Other(other.variant_name().to_string()),
        }
    }
}
