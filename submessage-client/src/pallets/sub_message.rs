use std::collections::BTreeMap;

use subxt::ext::scale_value::Value;

use crate::address::Address;
use crate::call::{account_value, bytes_value, RuntimeCall};
use crate::error::Result;
use crate::query::QueryInvoker;
use crate::storage::{StorageHasher, StorageKey};

/// Pallet name in the runtime.
pub const PALLET: &str = "SubMessage";

/// Double map from `(channel id, account)` to that account's common key.
pub const COMMON_KEY_ENTRY: &str = "CommonKeyByChannelIdAccountId";

/// A channel and the common key each member account holds for it.
///
/// The pallet rejects a channel whose creator is not one of the members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    /// Opaque channel identifier.
    pub channel_id: String,
    /// Common key per member.
    pub common_keys: BTreeMap<Address, String>,
}

impl ChannelRecord {
    /// A channel with no members yet.
    pub fn new(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            common_keys: BTreeMap::new(),
        }
    }

    /// Adds a member and its common key.
    pub fn member(mut self, account: Address, common_key: &str) -> Self {
        self.common_keys.insert(account, common_key.to_string());
        self
    }

    /// Whether `account` is a member.
    pub fn includes(&self, account: &Address) -> bool {
        self.common_keys.contains_key(account)
    }

    /// The `new_channel` call creating this channel on chain.
    pub fn new_channel_call(&self) -> RuntimeCall {
        let entries = self.common_keys.iter().map(|(account, common_key)| {
            Value::unnamed_composite([account_value(account), bytes_value(common_key)])
        });

        RuntimeCall::new(PALLET, "new_channel")
            .arg("channel_id", bytes_value(&self.channel_id))
            .arg("account_common_keys", Value::unnamed_composite(entries))
    }
}

/// Storage key of one member's common key.
pub fn common_key_key(channel_id: &str, account: &Address) -> StorageKey {
    StorageKey::plain(PALLET, COMMON_KEY_ENTRY)
        .key(StorageHasher::Blake2_128Concat, &channel_id.as_bytes().to_vec())
        .key(StorageHasher::Blake2_128Concat, account.as_bytes())
}

/// Reads the common key `account` holds for `channel_id`, if any.
pub async fn common_key(
    query: &QueryInvoker,
    channel_id: &str,
    account: &Address,
) -> Result<Option<String>> {
    query
        .read_storage::<String>(&common_key_key(channel_id, account))
        .await
}
