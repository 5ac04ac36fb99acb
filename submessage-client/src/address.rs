//! SS58 account addresses.
//!
//! An [`Address`] is the raw 32-byte public key of an account. Its textual form is
//! base58 over `prefix ‖ public key ‖ checksum`, where the checksum is the first two
//! bytes of Blake2b-512 over `"SS58PRE" ‖ prefix ‖ public key`.
//! See: <https://docs.substrate.io/reference/address-formats/>

use std::fmt;
use std::str::FromStr;

use blake2::{Blake2b512, Digest};
use snafu::{ensure, ResultExt};
use subxt::utils::AccountId32;

use crate::error::{AddressBase58Snafu, AddressChecksumSnafu, Error, Result};

/// Generic Substrate network prefix, used when no chain-specific prefix is known.
pub const DEFAULT_SS58_PREFIX: u16 = 42;

/// Highest prefix expressible in the two-byte SS58 form.
const MAX_SS58_PREFIX: u16 = 16383;

/// Domain separator hashed in front of every checksum.
const SS58_CHECKSUM_DOMAIN: &[u8] = b"SS58PRE";

/// Length of the checksum appended to 32-byte account addresses.
const CHECKSUM_LEN: usize = 2;

/// Length of an account public key.
pub const PUBLIC_KEY_LEN: usize = 32;

/// The public identifier of an account.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; PUBLIC_KEY_LEN]);

impl Address {
    /// Wraps a raw public key.
    pub const fn from_public_key(public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(public_key)
    }

    /// Builds an address from a byte slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let public_key: [u8; PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| {
            Error::AddressLength {
                length: bytes.len(),
            }
        })?;
        Ok(Self(public_key))
    }

    /// The raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Encodes the address for the given network prefix.
    pub fn to_ss58(&self, prefix: u16) -> Result<String> {
        let mut payload = encode_prefix(prefix)?;
        payload.extend_from_slice(&self.0);

        let checksum = ss58_checksum(&payload);
        payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);

        Ok(bs58::encode(payload).into_string())
    }

    /// Decodes an SS58 string, returning the address and the prefix it was encoded with.
    pub fn from_ss58(encoded: &str) -> Result<(Self, u16)> {
        let decoded = bs58::decode(encoded).into_vec().context(AddressBase58Snafu)?;

        ensure!(
            !decoded.is_empty(),
            crate::error::AddressLengthSnafu { length: 0usize }
        );
        let (prefix, prefix_len) = decode_prefix(&decoded)?;

        let expected_len = prefix_len + PUBLIC_KEY_LEN + CHECKSUM_LEN;
        ensure!(
            decoded.len() == expected_len,
            crate::error::AddressLengthSnafu {
                length: decoded.len().saturating_sub(prefix_len + CHECKSUM_LEN)
            }
        );

        let checksum_start = decoded.len() - CHECKSUM_LEN;
        let (payload, checksum) = decoded.split_at(checksum_start);
        ensure!(
            checksum == &ss58_checksum(payload)[..CHECKSUM_LEN],
            AddressChecksumSnafu
        );

        let address = Self::from_slice(&payload[prefix_len..])?;
        Ok((address, prefix))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_ss58(DEFAULT_SS58_PREFIX) {
            Ok(encoded) => f.write_str(&encoded),
            Err(_) => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Accepts an SS58 string under any prefix, or a `0x`-prefixed hex public key.
    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix("0x") {
            Some(hex_key) => {
                let bytes = hex::decode(hex_key).context(crate::error::HexDecodeSnafu {
                    what: "address",
                })?;
                Self::from_slice(&bytes)
            }
            None => Self::from_ss58(s).map(|(address, _)| address),
        }
    }
}

impl From<Address> for AccountId32 {
    fn from(address: Address) -> Self {
        AccountId32(address.0)
    }
}

impl From<AccountId32> for Address {
    fn from(account_id: AccountId32) -> Self {
        Self(account_id.0)
    }
}

/// Encode SS58 prefix (supports single and two-byte prefixes)
fn encode_prefix(prefix: u16) -> Result<Vec<u8>> {
    match prefix {
        0..=63 => Ok(vec![prefix as u8]),
        64..=MAX_SS58_PREFIX => {
            let first = (((prefix & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            Ok(vec![first, second])
        }
        _ => Err(Error::AddressPrefix { prefix }),
    }
}

/// Decode SS58 prefix from raw bytes, returning the prefix and its encoded length.
fn decode_prefix(data: &[u8]) -> Result<(u16, usize)> {
    match data[0] {
        0..=63 => Ok((data[0] as u16, 1)),
        64..=127 => {
            ensure!(
                data.len() >= 2,
                crate::error::AddressLengthSnafu { length: data.len() }
            );
            let lower = ((data[0] & 0b0011_1111) << 2) | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            Ok((((upper as u16) << 8) | (lower as u16), 2))
        }
        first => Err(Error::AddressPrefix {
            prefix: first as u16,
        }),
    }
}

/// Blake2b-512 of the checksum domain followed by the payload.
fn ss58_checksum(payload: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CHECKSUM_DOMAIN);
    hasher.update(payload);
    let mut checksum = [0u8; 64];
    checksum.copy_from_slice(&hasher.finalize());
    checksum
}
