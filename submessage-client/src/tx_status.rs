//! Lifecycle of a submitted extrinsic.
//!
//! The node pushes [`PoolStatus`] notifications on the `author_submitAndWatchExtrinsic`
//! subscription. [`StatusTracker`] folds them into the ordered [`TransactionStatus`]
//! sequence handed to callers: `Submitted` first, `InBlock` before `Finalized`, and
//! nothing after a terminal status.
use std::fmt;

use serde::Deserialize;
use subxt::utils::H256;

use crate::dispatch_error::DispatchErrorDetails;

/// A raw status notification as sent by the node's transaction pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolStatus {
    /// Waiting on an earlier nonce.
    Future,
    /// Ready to be included.
    Ready,
    /// Gossiped to the listed peers.
    Broadcast(Vec<String>),
    /// Included in a block.
    InBlock(H256),
    /// The including block left the best chain.
    Retracted(H256),
    /// Finality was not reached within the pool's timeout.
    FinalityTimeout(H256),
    /// The including block was finalized.
    Finalized(H256),
    /// Replaced by another extrinsic with the same nonce.
    Usurped(H256),
    /// Dropped because the pool is full.
    Dropped,
    /// No longer valid against the current state.
    Invalid,
}

/// Whether a finalized extrinsic's call actually applied.
#[must_use = "a finalized extrinsic may still have failed on-chain"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `System::ExtrinsicSuccess` was emitted.
    Success,
    /// `System::ExtrinsicFailed` was emitted with this error.
    Failed(DispatchErrorDetails),
}

impl DispatchOutcome {
    /// Whether the call applied.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A status in the lifecycle of one submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepted into the pool.
    Submitted,
    /// Gossiped to this many peers.
    Broadcast {
        /// Number of peers.
        peers: usize,
    },
    /// Included in a block that is not yet final.
    InBlock {
        /// The including block.
        block_hash: H256,
    },
    /// The including block was retracted; the extrinsic is back in the pool.
    Retracted {
        /// The retracted block.
        block_hash: H256,
    },
    /// Included in a final block. `outcome` tells whether the call applied.
    Finalized {
        /// The finalized block.
        block_hash: H256,
        /// Result of executing the call.
        outcome: DispatchOutcome,
    },
    /// The pool gave up waiting for finality of the including block.
    FinalityTimeout {
        /// The including block.
        block_hash: H256,
    },
    /// Replaced by another extrinsic.
    Usurped {
        /// Hash of the replacing extrinsic.
        by: H256,
    },
    /// Dropped from the pool.
    Dropped,
    /// Declared invalid by the pool.
    Invalid,
}

impl TransactionStatus {
    /// Whether no further status can follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finalized { .. }
                | Self::FinalityTimeout { .. }
                | Self::Usurped { .. }
                | Self::Dropped
                | Self::Invalid
        )
    }

    /// Whether this is a terminal status in which the pool discarded the extrinsic.
    pub fn is_pool_rejection(&self) -> bool {
        self.is_terminal() && !matches!(self, Self::Finalized { .. })
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => f.write_str("Submitted"),
            Self::Broadcast { peers } => write!(f, "Broadcast to {peers} peers"),
            Self::InBlock { block_hash } => write!(f, "InBlock {block_hash:?}"),
            Self::Retracted { block_hash } => write!(f, "Retracted from {block_hash:?}"),
            Self::Finalized {
                block_hash,
                outcome: DispatchOutcome::Success,
            } => write!(f, "Finalized in {block_hash:?}"),
            Self::Finalized {
                block_hash,
                outcome: DispatchOutcome::Failed(error),
            } => write!(f, "Finalized in {block_hash:?} with dispatch error {error}"),
            Self::FinalityTimeout { block_hash } => write!(f, "FinalityTimeout in {block_hash:?}"),
            Self::Usurped { by } => write!(f, "Usurped by {by:?}"),
            Self::Dropped => f.write_str("Dropped"),
            Self::Invalid => f.write_str("Invalid"),
        }
    }
}

/// What the watcher should do in response to a pool notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Yield this status.
    Emit(TransactionStatus),
    /// Look up the dispatch outcome in this block, then yield `Finalized`.
    Finalize(H256),
}

/// Where the tracked extrinsic currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Nothing observed yet.
    Pending,
    /// In the pool, not in a block.
    Pooled,
    /// In the given block.
    Included(H256),
    /// A terminal status was produced.
    Done,
}

/// Folds raw pool notifications into the ordered status sequence.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    /// Current stage.
    stage: Stage,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    /// A tracker for a freshly submitted extrinsic.
    pub fn new() -> Self {
        Self {
            stage: Stage::Pending,
        }
    }

    /// Whether a terminal status has been produced.
    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Advances on one notification. Returns nothing once the tracker is done.
    pub fn advance(&mut self, status: PoolStatus) -> Vec<Transition> {
        if self.is_done() {
            return Vec::new();
        }

        let mut transitions = Vec::new();
        if self.stage == Stage::Pending {
            self.stage = Stage::Pooled;
            transitions.push(Transition::Emit(TransactionStatus::Submitted));
        }

        match status {
            PoolStatus::Future | PoolStatus::Ready => {}
            PoolStatus::Broadcast(peers) => {
                transitions.push(Transition::Emit(TransactionStatus::Broadcast {
                    peers: peers.len(),
                }));
            }
            PoolStatus::InBlock(block_hash) => {
                self.stage = Stage::Included(block_hash);
                transitions.push(Transition::Emit(TransactionStatus::InBlock { block_hash }));
            }
            PoolStatus::Retracted(block_hash) => {
                self.stage = Stage::Pooled;
                transitions.push(Transition::Emit(TransactionStatus::Retracted { block_hash }));
            }
            PoolStatus::Finalized(block_hash) => {
                if self.stage != Stage::Included(block_hash) {
                    transitions.push(Transition::Emit(TransactionStatus::InBlock { block_hash }));
                }
                self.stage = Stage::Done;
                transitions.push(Transition::Finalize(block_hash));
            }
            PoolStatus::FinalityTimeout(block_hash) => {
                self.stage = Stage::Done;
                transitions.push(Transition::Emit(TransactionStatus::FinalityTimeout {
                    block_hash,
                }));
            }
            PoolStatus::Usurped(by) => {
                self.stage = Stage::Done;
                transitions.push(Transition::Emit(TransactionStatus::Usurped { by }));
            }
            PoolStatus::Dropped => {
                self.stage = Stage::Done;
                transitions.push(Transition::Emit(TransactionStatus::Dropped));
            }
            PoolStatus::Invalid => {
                self.stage = Stage::Done;
                transitions.push(Transition::Emit(TransactionStatus::Invalid));
            }
        }

        transitions
    }
}
