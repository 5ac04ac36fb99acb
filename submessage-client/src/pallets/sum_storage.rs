use subxt::ext::scale_value::Value;

use crate::call::RuntimeCall;
use crate::error::Result;
use crate::query::QueryInvoker;
use crate::rpc_registry::{RpcMethod, RpcType};
use crate::storage::StorageKey;

/// Pallet name in the runtime.
pub const PALLET: &str = "SumStorage";

/// RPC section of the sum runtime API.
pub const RPC_SECTION: &str = "sumStorage";

/// Storage key of the first value.
pub fn thing1_key() -> StorageKey {
    StorageKey::plain(PALLET, "Thing1")
}

/// Storage key of the second value.
pub fn thing2_key() -> StorageKey {
    StorageKey::plain(PALLET, "Thing2")
}

/// Sets the first value.
pub fn set_thing_1(val: u32) -> RuntimeCall {
    RuntimeCall::new(PALLET, "set_thing_1").arg("val", Value::u128(val.into()))
}

/// Sets the second value.
pub fn set_thing_2(val: u32) -> RuntimeCall {
    RuntimeCall::new(PALLET, "set_thing_2").arg("val", Value::u128(val.into()))
}

/// Registry entry for `sumStorage_getSum`.
pub fn get_sum_method() -> RpcMethod {
    RpcMethod::new(RPC_SECTION, "getSum", RpcType::U32)
        .description("Gets the sum of the two storage values in sum-storage pallet via a runtime api.")
}

/// Reads both stored values. Unset values read as zero.
pub async fn things(query: &QueryInvoker) -> Result<(u32, u32)> {
    let (key1, key2) = (thing1_key(), thing2_key());
    let (thing1, thing2) = futures::try_join!(
        query.read_storage_or_default::<u32>(&key1),
        query.read_storage_or_default::<u32>(&key2),
    )?;
    Ok((thing1, thing2))
}

/// Adds the two stored values without overflowing.
pub fn client_sum(thing1: u32, thing2: u32) -> u64 {
    u64::from(thing1) + u64::from(thing2)
}

/// Asks the runtime API for the sum.
pub async fn get_sum(query: &QueryInvoker) -> Result<u32> {
    query.call_runtime_api(RPC_SECTION, "getSum", vec![]).await
}
