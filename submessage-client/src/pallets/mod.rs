//! Calls and storage of the node's application pallets.

/// The `SubMessage` pallet: channels with a shared key per member account.
pub mod sub_message;

/// The `SumStorage` pallet: two numbers and a runtime API returning their sum.
pub mod sum_storage;
