//! substrate transaction submitter
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_stream::stream;
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde_json::Value as JsonValue;
use log::{error, info, warn};
use snafu::{OptionExt, ResultExt};
use subxt::backend::rpc::RpcParams;
use subxt::config::polkadot::PolkadotExtrinsicParamsBuilder as Params;
use subxt::utils::H256;

use crate::call::RuntimeCall;
use crate::dispatch_error::{ErrorTable, RawDispatchError};
use crate::error::{
    BuildSnafu,
    DispatchFailureSnafu,
    Error,
    ExtrinsicNotInBlockSnafu,
    FetchEventsSnafu,
    MissingDispatchEventSnafu,
    PoolRejectionSnafu,
    Result,
    StatusStreamEndedSnafu,
    StatusStreamSnafu,
};
use crate::session::Session;
use crate::signer::AccountKey;
use crate::tx_status::{DispatchOutcome, PoolStatus, StatusTracker, TransactionStatus, Transition};

/// Subscription that submits an extrinsic and streams its pool status.
const SUBMIT_AND_WATCH: &str = "author_submitAndWatchExtrinsic";

/// Matching unsubscribe method.
const UNWATCH: &str = "author_unwatchExtrinsic";

/// Per-submission transaction parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Explicit nonce. Fetched from the node when `None`.
    pub nonce: Option<u64>,
    /// Tip paid to the block author.
    pub tip: u128,
    /// Number of blocks the extrinsic stays valid for. Immortal when `None`.
    pub mortality: Option<u64>,
}

impl TxOptions {
    /// Uses an explicit nonce.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Adds a tip.
    pub fn tip(mut self, tip: u128) -> Self {
        self.tip = tip;
        self
    }

    /// Makes the extrinsic mortal for `blocks` blocks from the latest block.
    pub fn mortal(mut self, blocks: u64) -> Self {
        self.mortality = Some(blocks);
        self
    }
}

/// A signed extrinsic, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExtrinsic {
    /// SCALE-encoded extrinsic.
    pub bytes: Vec<u8>,
    /// Blake2-256 hash of `bytes`.
    pub hash: H256,
    /// Nonce the extrinsic was signed with.
    pub nonce: u64,
}

/// An extrinsic that was finalized and whose call applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizedExtrinsic {
    /// Hash of the extrinsic.
    pub extrinsic_hash: H256,
    /// The finalized block containing it.
    pub block_hash: H256,
}

/// Looks up what happened to an extrinsic in a block.
#[async_trait]
pub trait InclusionInspector: Send + Sync {
    /// Finds the extrinsic in the block and reports its dispatch outcome.
    async fn dispatch_outcome(&self, block_hash: H256, extrinsic_hash: H256)
        -> Result<DispatchOutcome>;
}

#[async_trait]
impl InclusionInspector for Session {
    async fn dispatch_outcome(
        &self,
        block_hash: H256,
        extrinsic_hash: H256,
    ) -> Result<DispatchOutcome> {
        let block = self
            .api()
            .blocks()
            .at(block_hash)
            .await
            .context(FetchEventsSnafu { block_hash })?;

        let extrinsics = block
            .extrinsics()
            .await
            .context(FetchEventsSnafu { block_hash })?;

        let extrinsic = extrinsics
            .iter()
            .find(|ext| ext.hash() == extrinsic_hash)
            .context(ExtrinsicNotInBlockSnafu {
                block_hash,
                extrinsic_hash,
            })?;

        let events = extrinsic
            .events()
            .await
            .context(FetchEventsSnafu { block_hash })?;

        let events = events
            .iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .context(FetchEventsSnafu { block_hash })?;

        let outcome = scan_dispatch_events(
            events
                .iter()
                .map(|event| (event.pallet_name(), event.variant_name(), event.field_bytes())),
            &self.error_table(),
        )?;
        outcome.context(MissingDispatchEventSnafu {
            block_hash,
            extrinsic_hash,
        })
    }
}

/// Finds the first `System::ExtrinsicSuccess` or `System::ExtrinsicFailed` among
/// `(pallet, variant, field bytes)` triples and turns it into an outcome.
///
/// `None` if neither event is present.
pub fn scan_dispatch_events<'a>(
    events: impl IntoIterator<Item = (&'a str, &'a str, &'a [u8])>,
    error_table: &ErrorTable,
) -> Result<Option<DispatchOutcome>> {
    for (pallet, variant, fields) in events {
        if pallet != "System" {
            continue;
        }
        match variant {
            "ExtrinsicSuccess" => {
                info!("✅ Extrinsic execution was successful.");
                return Ok(Some(DispatchOutcome::Success));
            }
            "ExtrinsicFailed" => {
                let raw = RawDispatchError::from_event_fields(fields)?;
                let details = error_table.decode(&raw);
                error!("❌ Extrinsic execution failed: {details}");
                return Ok(Some(DispatchOutcome::Failed(details)));
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Hands signed extrinsics to the node's pool and streams their status.
#[async_trait]
pub trait ExtrinsicPool: Send + Sync {
    /// Submits the encoded extrinsic and subscribes to its pool status.
    async fn submit_and_watch(
        &self,
        extrinsic: &[u8],
    ) -> Result<BoxStream<'static, Result<PoolStatus>>>;
}

#[async_trait]
impl ExtrinsicPool for Session {
    async fn submit_and_watch(
        &self,
        extrinsic: &[u8],
    ) -> Result<BoxStream<'static, Result<PoolStatus>>> {
        let params = vec![JsonValue::String(format!("0x{}", hex::encode(extrinsic)))];
        let subscription = self
            .subscribe::<PoolStatus>(SUBMIT_AND_WATCH, params, UNWATCH)
            .await?;
        Ok(subscription
            .map(|status| status.context(StatusStreamSnafu))
            .boxed())
    }
}

/// Signs and submits extrinsics through one session.
#[derive(Clone, Debug)]
pub struct TxSubmitter {
    /// The session extrinsics are built against and submitted through.
    session: Session,
}

impl TxSubmitter {
    /// A submitter using `session`.
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Resolves nonce and mortality, then signs `call`.
    pub async fn sign(
        &self,
        call: &RuntimeCall,
        signer: &AccountKey,
        options: TxOptions,
    ) -> Result<SignedExtrinsic> {
        let nonce = match options.nonce {
            Some(nonce) => nonce,
            None => self.fetch_nonce(signer).await?,
        };

        let mut params = Params::new().nonce(nonce).tip(options.tip);
        if let Some(blocks) = options.mortality {
            let latest = self
                .session
                .api()
                .blocks()
                .at_latest()
                .await
                .context(BuildSnafu)?;
            params = params.mortal(latest.header(), blocks);
        }

        let extrinsic = self
            .session
            .api()
            .tx()
            .create_signed(&call.to_payload(), signer, params.build())
            .await
            .context(BuildSnafu)?;

        Ok(SignedExtrinsic {
            bytes: extrinsic.encoded().to_vec(),
            hash: extrinsic.hash(),
            nonce,
        })
    }

    /// Signs and submits `call` with default options.
    pub async fn submit(&self, call: &RuntimeCall, signer: &AccountKey) -> Result<TxWatch> {
        self.submit_with(call, signer, TxOptions::default()).await
    }

    /// Signs and submits `call`, returning a watch over its status.
    ///
    /// Errors before the extrinsic is pooled are returned here and never appear in
    /// the status sequence.
    pub async fn submit_with(
        &self,
        call: &RuntimeCall,
        signer: &AccountKey,
        options: TxOptions,
    ) -> Result<TxWatch> {
        let extrinsic = self.sign(call, signer, options).await?;
        self.submit_signed(&extrinsic).await
    }

    /// Submits an already signed extrinsic.
    pub async fn submit_signed(&self, extrinsic: &SignedExtrinsic) -> Result<TxWatch> {
        TxWatch::submit(&self.session, Arc::new(self.session.clone()), extrinsic).await
    }

    /// Fetches the next nonce for the signer, including pooled extrinsics.
    async fn fetch_nonce(&self, signer: &AccountKey) -> Result<u64> {
        let account = signer.address().to_ss58(self.session.ss58_prefix())?;
        let mut params = RpcParams::new();
        params.push(account).context(BuildSnafu)?;
        self.session
            .rpc()
            .request::<u64>("system_accountNextIndex", params)
            .await
            .context(BuildSnafu)
    }
}

/// The status sequence of one submitted extrinsic.
///
/// Yields statuses in order and ends after the first terminal status. If the node
/// stops reporting first, one error is yielded and the stream ends. Dropping the
/// watch unsubscribes without affecting the pooled extrinsic.
pub struct TxWatch {
    /// Hash of the watched extrinsic.
    extrinsic_hash: H256,
    /// The tracked status sequence.
    inner: BoxStream<'static, Result<TransactionStatus>>,
}

impl TxWatch {
    /// Tracks raw pool notifications for `extrinsic_hash`, resolving the dispatch
    /// outcome through `inspector` once finalized.
    pub fn new(
        extrinsic_hash: H256,
        mut statuses: BoxStream<'static, Result<PoolStatus>>,
        inspector: Arc<dyn InclusionInspector>,
    ) -> Self {
        let inner = stream! {
            let mut tracker = StatusTracker::new();
            while let Some(status) = statuses.next().await {
                let status = match status {
                    Ok(status) => status,
                    Err(err) => {
                        error!("❌ Error while watching transaction progress: {err}");
                        yield Err(err);
                        return;
                    }
                };

                for transition in tracker.advance(status) {
                    match transition {
                        Transition::Emit(status) => {
                            log_status(&status);
                            yield Ok(status);
                        }
                        Transition::Finalize(block_hash) => {
                            match inspector.dispatch_outcome(block_hash, extrinsic_hash).await {
                                Ok(outcome) => {
                                    let status = TransactionStatus::Finalized { block_hash, outcome };
                                    log_status(&status);
                                    yield Ok(status);
                                }
                                Err(err) => {
                                    error!("❌ Failed to resolve dispatch outcome: {err}");
                                    yield Err(err);
                                }
                            }
                        }
                    }
                }

                if tracker.is_done() {
                    return;
                }
            }

            warn!("⚠️ Status stream for {extrinsic_hash:?} ended before a terminal status");
            yield StatusStreamEndedSnafu { extrinsic_hash }.fail();
        };

        Self {
            extrinsic_hash,
            inner: inner.boxed(),
        }
    }

    /// Submits `extrinsic` to `pool` and watches it.
    ///
    /// A rejection before pooling is returned as a submission error and no watch
    /// is created.
    pub async fn submit(
        pool: &dyn ExtrinsicPool,
        inspector: Arc<dyn InclusionInspector>,
        extrinsic: &SignedExtrinsic,
    ) -> Result<Self> {
        let statuses = pool
            .submit_and_watch(&extrinsic.bytes)
            .await
            .map_err(|err| {
                error!("❌ Failed to submit transaction: {err}");
                match err {
                    Error::Rpc { source, .. } => Error::Submission { source },
                    other => other,
                }
            })?;
        info!(
            "✅ Transaction submitted successfully: {:?} (nonce {})",
            extrinsic.hash, extrinsic.nonce
        );
        Ok(Self::new(extrinsic.hash, statuses, inspector))
    }

    /// Hash of the watched extrinsic.
    pub fn extrinsic_hash(&self) -> H256 {
        self.extrinsic_hash
    }

    /// Drives the watch to its end.
    ///
    /// Succeeds only if the extrinsic was finalized and its call applied. Pool
    /// rejections and on-chain dispatch failures are returned as errors.
    pub async fn wait_for_finalized(mut self) -> Result<FinalizedExtrinsic> {
        while let Some(status) = self.next().await {
            match status? {
                TransactionStatus::Finalized {
                    block_hash,
                    outcome: DispatchOutcome::Success,
                } => {
                    return Ok(FinalizedExtrinsic {
                        extrinsic_hash: self.extrinsic_hash,
                        block_hash,
                    })
                }
                TransactionStatus::Finalized {
                    block_hash,
                    outcome: DispatchOutcome::Failed(error),
                } => return DispatchFailureSnafu { block_hash, error }.fail(),
                status if status.is_terminal() => return PoolRejectionSnafu { status }.fail(),
                _ => {}
            }
        }

        StatusStreamEndedSnafu {
            extrinsic_hash: self.extrinsic_hash,
        }
        .fail()
    }
}

impl Stream for TxWatch {
    type Item = Result<TransactionStatus>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for TxWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxWatch")
            .field("extrinsic_hash", &self.extrinsic_hash)
            .finish_non_exhaustive()
    }
}

/// Logs one status update.
fn log_status(status: &TransactionStatus) {
    match status {
        TransactionStatus::Submitted => info!("📄 Transaction has been accepted into the pool."),
        TransactionStatus::Broadcast { peers } => {
            info!("📡 Transaction broadcasted to {peers} peers.")
        }
        TransactionStatus::InBlock { block_hash } => {
            info!("📦 Transaction is in block {block_hash:?}")
        }
        TransactionStatus::Retracted { block_hash } => {
            warn!("⚠️ Block {block_hash:?} was retracted. The transaction is back in the pool.")
        }
        TransactionStatus::Finalized {
            block_hash,
            outcome: DispatchOutcome::Success,
        } => info!("✅ Transaction finalized in block {block_hash:?}"),
        TransactionStatus::Finalized {
            block_hash,
            outcome: DispatchOutcome::Failed(details),
        } => error!("❌ Transaction finalized in block {block_hash:?} but failed: {details}"),
        rejected => error!("❌ Transaction rejected: {rejected}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::stream;

    use super::*;
    use crate::dispatch_error::DispatchErrorDetails;
    use crate::error::ErrorKind;

    /// Reports a fixed outcome and counts lookups.
    struct FakeInspector {
        /// The outcome every lookup returns.
        outcome: DispatchOutcome,
        /// Number of lookups made.
        lookups: AtomicUsize,
    }

    impl FakeInspector {
        fn new(outcome: DispatchOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                lookups: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InclusionInspector for FakeInspector {
        async fn dispatch_outcome(
            &self,
            _block_hash: H256,
            _extrinsic_hash: H256,
        ) -> Result<DispatchOutcome> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    /// Rejects every extrinsic it is handed.
    #[derive(Default)]
    struct RejectingPool {
        /// Number of submissions seen.
        submissions: AtomicUsize,
    }

    #[async_trait]
    impl ExtrinsicPool for RejectingPool {
        async fn submit_and_watch(
            &self,
            _extrinsic: &[u8],
        ) -> Result<BoxStream<'static, Result<PoolStatus>>> {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            Err(Error::Rpc {
                method: SUBMIT_AND_WATCH.to_string(),
                source: subxt::Error::Other("1010: Invalid Transaction: Inability to pay some fees".into()),
            })
        }
    }

    /// Accepts every extrinsic and replays fixed statuses.
    struct ReplayPool {
        /// Statuses reported for the next submission.
        statuses: Vec<PoolStatus>,
    }

    #[async_trait]
    impl ExtrinsicPool for ReplayPool {
        async fn submit_and_watch(
            &self,
            _extrinsic: &[u8],
        ) -> Result<BoxStream<'static, Result<PoolStatus>>> {
            Ok(stream::iter(self.statuses.clone().into_iter().map(Ok)).boxed())
        }
    }

    fn signed(byte: u8) -> SignedExtrinsic {
        SignedExtrinsic {
            bytes: vec![byte; 8],
            hash: hash(byte),
            nonce: 0,
        }
    }

    fn balances_table() -> ErrorTable {
        let mut table = ErrorTable::new();
        table.insert(5, 2, "Balances", "InsufficientBalance", "Balance too low to send value.");
        table
    }

    fn hash(byte: u8) -> H256 {
        H256::repeat_byte(byte)
    }

    fn watch(statuses: Vec<Result<PoolStatus>>, inspector: Arc<FakeInspector>) -> TxWatch {
        TxWatch::new(hash(0xee), stream::iter(statuses).boxed(), inspector)
    }

    fn insufficient_balance() -> DispatchErrorDetails {
        DispatchErrorDetails::Module {
            section: "Balances".into(),
            name: "InsufficientBalance".into(),
            docs: "Balance too low to send value.".into(),
        }
    }

    #[tokio::test]
    async fn we_can_watch_a_transaction_to_finality() {
        let inspector = FakeInspector::new(DispatchOutcome::Success);
        let statuses: Vec<_> = watch(
            vec![
                Ok(PoolStatus::Ready),
                Ok(PoolStatus::Broadcast(vec!["peer".into(), "peer2".into()])),
                Ok(PoolStatus::InBlock(hash(1))),
                Ok(PoolStatus::Finalized(hash(1))),
            ],
            inspector.clone(),
        )
        .map(|status| status.unwrap())
        .collect()
        .await;

        assert_eq!(
            statuses,
            vec![
                TransactionStatus::Submitted,
                TransactionStatus::Broadcast { peers: 2 },
                TransactionStatus::InBlock {
                    block_hash: hash(1)
                },
                TransactionStatus::Finalized {
                    block_hash: hash(1),
                    outcome: DispatchOutcome::Success
                },
            ]
        );
        assert_eq!(inspector.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn we_stop_after_the_first_terminal_status() {
        let inspector = FakeInspector::new(DispatchOutcome::Success);
        let statuses: Vec<_> = watch(
            vec![
                Ok(PoolStatus::Finalized(hash(1))),
                Ok(PoolStatus::Finalized(hash(1))),
                Ok(PoolStatus::Invalid),
            ],
            inspector.clone(),
        )
        .collect()
        .await;

        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|status| status.is_ok()));
        let terminal = statuses
            .iter()
            .filter(|status| status.as_ref().is_ok_and(TransactionStatus::is_terminal))
            .count();
        assert_eq!(terminal, 1);
        assert_eq!(inspector.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn we_can_finalize_a_successful_transaction() {
        let finalized = watch(
            vec![Ok(PoolStatus::Ready), Ok(PoolStatus::Finalized(hash(4)))],
            FakeInspector::new(DispatchOutcome::Success),
        )
        .wait_for_finalized()
        .await
        .unwrap();

        assert_eq!(
            finalized,
            FinalizedExtrinsic {
                extrinsic_hash: hash(0xee),
                block_hash: hash(4)
            }
        );
    }

    #[tokio::test]
    async fn we_cannot_miss_a_dispatch_failure() {
        let err = watch(
            vec![
                Ok(PoolStatus::Ready),
                Ok(PoolStatus::InBlock(hash(2))),
                Ok(PoolStatus::Finalized(hash(2))),
            ],
            FakeInspector::new(DispatchOutcome::Failed(insufficient_balance())),
        )
        .wait_for_finalized()
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DispatchFailure);
        match err {
            Error::DispatchFailure { block_hash, error } => {
                assert_eq!(block_hash, hash(2));
                assert_eq!(error, insufficient_balance());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn we_report_pool_rejections() {
        for (status, expected) in [
            (PoolStatus::Dropped, TransactionStatus::Dropped),
            (PoolStatus::Invalid, TransactionStatus::Invalid),
            (
                PoolStatus::Usurped(hash(9)),
                TransactionStatus::Usurped { by: hash(9) },
            ),
        ] {
            let inspector = FakeInspector::new(DispatchOutcome::Success);
            let err = watch(vec![Ok(PoolStatus::Ready), Ok(status)], inspector.clone())
                .wait_for_finalized()
                .await
                .unwrap_err();

            assert_eq!(err.kind(), ErrorKind::PoolRejection);
            assert!(matches!(err, Error::PoolRejection { status } if status == expected));
            assert_eq!(inspector.lookups.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn we_report_a_status_stream_that_ends_early() {
        let statuses: Vec<_> = watch(
            vec![Ok(PoolStatus::Ready), Ok(PoolStatus::InBlock(hash(3)))],
            FakeInspector::new(DispatchOutcome::Success),
        )
        .collect()
        .await;

        assert_eq!(statuses.len(), 3);
        assert!(matches!(
            statuses.last(),
            Some(Err(Error::StatusStreamEnded { extrinsic_hash })) if *extrinsic_hash == hash(0xee)
        ));
    }

    #[tokio::test]
    async fn we_stop_after_a_status_stream_error() {
        let statuses: Vec<_> = watch(
            vec![
                Ok(PoolStatus::Ready),
                Err(Error::StatusStreamEnded {
                    extrinsic_hash: hash(0xee),
                }),
                Ok(PoolStatus::Finalized(hash(1))),
            ],
            FakeInspector::new(DispatchOutcome::Success),
        )
        .collect()
        .await;

        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].is_ok());
        assert!(statuses[1].is_err());
    }

    #[tokio::test]
    async fn we_cannot_submit_a_rejected_extrinsic() {
        let pool = RejectingPool::default();
        let inspector = FakeInspector::new(DispatchOutcome::Success);
        let err = TxWatch::submit(&pool, inspector.clone(), &signed(0xaa))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Submission);
        assert!(matches!(err, Error::Submission { .. }));
        assert_eq!(pool.submissions.load(Ordering::SeqCst), 1);
        assert_eq!(inspector.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn we_can_submit_an_extrinsic_and_watch_it() {
        let pool = ReplayPool {
            statuses: vec![PoolStatus::Ready, PoolStatus::Finalized(hash(6))],
        };
        let watch = TxWatch::submit(
            &pool,
            FakeInspector::new(DispatchOutcome::Success),
            &signed(0xab),
        )
        .await
        .unwrap();
        assert_eq!(watch.extrinsic_hash(), hash(0xab));

        let finalized = watch.wait_for_finalized().await.unwrap();
        assert_eq!(finalized.block_hash, hash(6));
        assert_eq!(finalized.extrinsic_hash, hash(0xab));
    }

    #[test]
    fn we_can_find_a_successful_dispatch_among_events() {
        let events: [(&str, &str, &[u8]); 3] = [
            ("Balances", "Withdraw", &[1, 2]),
            ("System", "NewAccount", &[]),
            ("System", "ExtrinsicSuccess", &[0; 4]),
        ];
        let outcome = scan_dispatch_events(events, &balances_table()).unwrap();
        assert_eq!(outcome, Some(DispatchOutcome::Success));
        assert!(outcome.is_some_and(|outcome| outcome.is_success()));
    }

    #[test]
    fn we_can_decode_a_failed_dispatch_among_events() {
        // Module { index: 5, error: [2, 0, 0, 0] } followed by dispatch info bytes.
        let fields = [3u8, 5, 2, 0, 0, 0, 0xaa, 0xbb, 0x00];
        let events: [(&str, &str, &[u8]); 2] = [
            ("Balances", "Withdraw", &[1, 2]),
            ("System", "ExtrinsicFailed", &fields),
        ];
        let outcome = scan_dispatch_events(events, &balances_table()).unwrap();
        assert_eq!(outcome, Some(DispatchOutcome::Failed(insufficient_balance())));
        assert!(!outcome.is_some_and(|outcome| outcome.is_success()));
    }

    #[test]
    fn we_cannot_find_a_dispatch_outcome_without_system_events() {
        let events: [(&str, &str, &[u8]); 2] = [
            ("Balances", "Withdraw", &[1, 2]),
            ("SubMessage", "ExtrinsicFailed", &[3, 5, 2, 0, 0, 0]),
        ];
        assert_eq!(scan_dispatch_events(events, &balances_table()).unwrap(), None);
        let nothing: Vec<(&str, &str, &[u8])> = Vec::new();
        assert!(scan_dispatch_events(nothing, &balances_table()).unwrap().is_none());
    }

    #[test]
    fn we_cannot_scan_a_malformed_dispatch_error() {
        let events: [(&str, &str, &[u8]); 1] = [("System", "ExtrinsicFailed", &[42])];
        let err = scan_dispatch_events(events, &balances_table()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn we_can_build_tx_options() {
        let options = TxOptions::default().nonce(5).tip(10).mortal(64);
        assert_eq!(
            options,
            TxOptions {
                nonce: Some(5),
                tip: 10,
                mortality: Some(64)
            }
        );
        assert_eq!(TxOptions::default().mortality, None);
    }
}
