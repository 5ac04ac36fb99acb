use std::fmt;
use std::str::FromStr;

use hex::FromHex;
use snafu::{ensure, ResultExt};
use subxt::utils::{AccountId32, MultiAddress, MultiSignature};
use subxt::PolkadotConfig;
use subxt_signer::sr25519::{self, Keypair, PublicKey, Signature};
use subxt_signer::SecretUri;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::address::Address;
use crate::error::*;

/// An sr25519 account key derived from a seed and a derivation path.
///
/// The secret half never leaves this type: callers see the public key, the
/// [`Address`], and signatures.
#[derive(Clone)]
pub struct AccountKey {
    /// The derived keypair.
    keypair: Keypair,
}

impl AccountKey {
    /// Derives a key from a seed and a `//hard/soft` style derivation path.
    ///
    /// `seed` may be a BIP-39 phrase, a `0x`-prefixed hex seed, or empty for the
    /// well-known development phrase. The same inputs always yield the same key.
    pub fn derive(seed: &str, path: &str) -> Result<Self> {
        ensure!(
            path.is_empty() || path.starts_with('/'),
            InvalidDerivationPathSnafu { path }
        );

        let uri = SecretUri::from_str(&format!("{}{}", seed.trim(), path)).context(InvalidSeedSnafu)?;
        let keypair = Keypair::from_uri(&uri).context(KeyDerivationSnafu)?;
        Ok(Self { keypair })
    }

    /// One of the development accounts, e.g. `dev("Alice")` for `//Alice`.
    pub fn dev(name: &str) -> Result<Self> {
        Self::derive("", &format!("//{name}"))
    }

    /// Wraps a raw 32-byte sr25519 secret seed.
    pub fn from_secret_key(secret: [u8; 32]) -> Result<Self> {
        let keypair = Keypair::from_secret_key(secret).context(KeyDerivationSnafu)?;
        Ok(Self { keypair })
    }

    /// The public key of this account.
    pub fn public_key(&self) -> [u8; 32] {
        self.keypair.public_key().0
    }

    /// The address of this account.
    pub fn address(&self) -> Address {
        Address::from_public_key(self.public_key())
    }

    /// Signs an arbitrary payload.
    pub fn sign(&self, payload: &[u8]) -> Signature {
        self.keypair.sign(payload)
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl subxt::tx::Signer<PolkadotConfig> for AccountKey {
    fn account_id(&self) -> AccountId32 {
        <Keypair as subxt::tx::Signer<PolkadotConfig>>::account_id(&self.keypair)
    }

    fn address(&self) -> MultiAddress<AccountId32, ()> {
        <Keypair as subxt::tx::Signer<PolkadotConfig>>::address(&self.keypair)
    }

    fn sign(&self, signer_payload: &[u8]) -> MultiSignature {
        <Keypair as subxt::tx::Signer<PolkadotConfig>>::sign(&self.keypair, signer_payload)
    }
}

/// Checks an sr25519 signature over `payload` against a public key.
pub fn verify(signature: &Signature, payload: &[u8], public_key: &[u8; 32]) -> bool {
    sr25519::verify(signature, payload, &PublicKey(*public_key))
}

/// load a hex encoded sr25519 secret seed from a file
pub async fn load_key_file(file_path: &str) -> Result<AccountKey> {
    let mut file = File::open(file_path).await.context(KeyFileReadSnafu {
        path: file_path.to_string(),
    })?;

    let mut hex_string = String::new();
    file.read_to_string(&mut hex_string)
        .await
        .context(KeyFileReadSnafu {
            path: file_path.to_string(),
        })?;

    let hex_string = hex_string.trim();
    let key_bytes =
        Vec::from_hex(hex_string.strip_prefix("0x").unwrap_or(hex_string)).context(KeyParseSnafu)?;

    let length = key_bytes.len();
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| Error::InvalidKeyLength { length })?;

    AccountKey::from_secret_key(key_bytes)
}
