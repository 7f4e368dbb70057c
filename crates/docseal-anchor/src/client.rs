use std::sync::Arc;
use std::time::Duration;

use docseal_types::{Fingerprint, Round, TransactionRef};
use tracing::{debug, info, warn};

use crate::error::{AnchorError, NetworkError, SignError};
use crate::state::{AnchorFailure, AnchorObserver, AnchorState};
use crate::traits::{LedgerNetwork, SigningService};
use crate::transaction::Transaction;

/// Tunables of an [`AnchoringClient`].
#[derive(Clone, Debug)]
pub struct AnchorConfig {
    /// Rounds to wait for finality before giving up.
    pub confirmation_rounds: Round,
    /// Wall-clock bound on the submission round-trip.
    pub submit_timeout: Duration,
    /// Width of the transaction validity window, in rounds.
    pub validity_rounds: Round,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            confirmation_rounds: 4,
            submit_timeout: Duration::from_secs(30),
            validity_rounds: 1000,
        }
    }
}

/// A fingerprint anchored in a finalized block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorReceipt {
    pub transaction_id: TransactionRef,
    pub confirmed_round: Round,
}

/// Drives the anchoring protocol against injected signing and ledger
/// services.
#[derive(Clone)]
pub struct AnchoringClient {
    signer: Arc<dyn SigningService>,
    network: Arc<dyn LedgerNetwork>,
    config: AnchorConfig,
}

/// Tracks the current state and refuses anything but forward moves.
struct Progress<'a> {
    current: Option<AnchorState>,
    observer: &'a dyn AnchorObserver,
}

impl<'a> Progress<'a> {
    fn new(observer: &'a dyn AnchorObserver) -> Self {
        Self {
            current: None,
            observer,
        }
    }

    fn enter(&mut self, next: AnchorState, tx: Option<&TransactionRef>) {
        let legal = match &self.current {
            None => next == AnchorState::Hashing,
            Some(current) => current.can_advance_to(&next),
        };
        debug_assert!(legal, "illegal anchoring transition to {next}");
        if !legal {
            return;
        }
        info!(state = %next, "anchoring transition");
        self.observer.on_transition(&next, tx);
        self.current = Some(next);
    }

    fn fail(&mut self, failure: AnchorFailure) -> AnchorError {
        let stage = self.current.clone().unwrap_or(AnchorState::Hashing);
        warn!(%stage, %failure, "anchoring failed");
        self.enter(AnchorState::Failed(failure.clone()), None);
        AnchorError { stage, failure }
    }
}

impl AnchoringClient {
    pub fn new(
        signer: Arc<dyn SigningService>,
        network: Arc<dyn LedgerNetwork>,
        config: AnchorConfig,
    ) -> Self {
        Self {
            signer,
            network,
            config,
        }
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn network(&self) -> &Arc<dyn LedgerNetwork> {
        &self.network
    }

    /// Anchor `fingerprint`, reporting each transition to `observer`.
    ///
    /// Every call submits a new transaction; nothing is retried or resumed.
    pub async fn anchor(
        &self,
        fingerprint: &Fingerprint,
        observer: &dyn AnchorObserver,
    ) -> Result<AnchorReceipt, AnchorError> {
        let mut progress = Progress::new(observer);

        progress.enter(AnchorState::Hashing, None);
        debug!(hash = %fingerprint.short_hex(), "anchoring fingerprint");

        progress.enter(AnchorState::Signing, None);
        let round = self.network.current_round().await.map_err(|e| {
            progress.fail(AnchorFailure::SigningFailed(format!(
                "could not prepare transaction: {e}"
            )))
        })?;
        let transaction = Transaction::anchor(
            self.signer.address(),
            fingerprint,
            round,
            self.config.validity_rounds,
            self.network.genesis_id(),
        );
        let signed = match self.signer.sign(&transaction).await {
            Ok(signed) if signed.transaction == transaction => signed,
            Ok(_) => {
                return Err(progress.fail(AnchorFailure::SigningFailed(
                    "signer returned a different transaction".into(),
                )))
            }
            Err(SignError::Cancelled) => return Err(progress.fail(AnchorFailure::UserCancelled)),
            Err(SignError::Failed(reason)) => {
                return Err(progress.fail(AnchorFailure::SigningFailed(reason)))
            }
        };

        progress.enter(AnchorState::Sending, None);
        let pending =
            match tokio::time::timeout(self.config.submit_timeout, self.network.submit(&signed))
                .await
            {
                Ok(Ok(pending)) => pending,
                Ok(Err(NetworkError::Rejected(reason))) => {
                    return Err(progress.fail(AnchorFailure::SubmissionRejected(reason)))
                }
                Ok(Err(e)) => {
                    return Err(progress.fail(AnchorFailure::SubmissionRejected(e.to_string())))
                }
                Err(_) => {
                    return Err(progress.fail(AnchorFailure::SubmissionRejected(format!(
                        "no response within {:?}",
                        self.config.submit_timeout
                    ))))
                }
            };

        progress.enter(AnchorState::Confirming, None);
        let rounds = self.config.confirmation_rounds;
        let confirmation = match self.network.await_confirmation(&pending, rounds).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                debug!(error = %e, tx = %pending.short(), "confirmation not observed");
                return Err(progress.fail(AnchorFailure::ConfirmationTimeout { pending, rounds }));
            }
        };

        progress.enter(AnchorState::Complete, Some(&confirmation.tx_ref));
        info!(
            tx = %confirmation.tx_ref.short(),
            round = confirmation.confirmed_round,
            "fingerprint anchored"
        );
        Ok(AnchorReceipt {
            transaction_id: confirmation.tx_ref,
            confirmed_round: confirmation.confirmed_round,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use docseal_crypto::DocumentHasher;
    use docseal_types::AccountAddress;

    use super::*;
    use crate::devnet::{DevnetConfig, DevnetLedger};
    use crate::error::NetworkResult;
    use crate::signer::LocalSigner;
    use crate::state::RecordingObserver;
    use crate::traits::{Confirmation, LedgerEntry};
    use crate::transaction::SignedTransaction;

    /// Network fake whose every stage can be made to fail.
    #[derive(Default)]
    struct ScriptedNetwork {
        round_error: Option<NetworkError>,
        submit_error: Option<NetworkError>,
        submit_delay: Option<Duration>,
        confirm_error: Option<NetworkError>,
        submitted: Mutex<Vec<SignedTransaction>>,
        confirm_budget: Mutex<Option<Round>>,
    }

    #[async_trait]
    impl LedgerNetwork for ScriptedNetwork {
        fn genesis_id(&self) -> &str {
            "scripted"
        }

        async fn current_round(&self) -> NetworkResult<Round> {
            match &self.round_error {
                Some(e) => Err(e.clone()),
                None => Ok(100),
            }
        }

        async fn submit(&self, transaction: &SignedTransaction) -> NetworkResult<TransactionRef> {
            if let Some(delay) = self.submit_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(e) = &self.submit_error {
                return Err(e.clone());
            }
            self.submitted.lock().unwrap().push(transaction.clone());
            Ok(transaction.tx_ref())
        }

        async fn await_confirmation(
            &self,
            pending: &TransactionRef,
            max_rounds: Round,
        ) -> NetworkResult<Confirmation> {
            *self.confirm_budget.lock().unwrap() = Some(max_rounds);
            match &self.confirm_error {
                Some(e) => Err(e.clone()),
                None => Ok(Confirmation {
                    tx_ref: pending.clone(),
                    confirmed_round: 102,
                }),
            }
        }

        async fn lookup(&self, tx_ref: &TransactionRef) -> NetworkResult<LedgerEntry> {
            Err(NetworkError::NotFound(tx_ref.clone()))
        }
    }

    /// Signer that returns a transaction other than the one it was asked for.
    struct SwappingSigner(LocalSigner);

    #[async_trait]
    impl SigningService for SwappingSigner {
        fn address(&self) -> AccountAddress {
            self.0.address()
        }

        async fn sign(&self, transaction: &Transaction) -> Result<SignedTransaction, SignError> {
            let mut other = transaction.clone();
            other.note = b"something else".to_vec();
            self.0.sign_now(&other)
        }
    }

    fn fingerprint() -> Fingerprint {
        DocumentHasher::hash(b"deed of sale").unwrap()
    }

    fn client(signer: Arc<dyn SigningService>, network: Arc<dyn LedgerNetwork>) -> AnchoringClient {
        AnchoringClient::new(
            signer,
            network,
            AnchorConfig {
                submit_timeout: Duration::from_millis(200),
                ..AnchorConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn successful_anchor_walks_every_state_once() {
        let network = Arc::new(ScriptedNetwork::default());
        let signer = Arc::new(LocalSigner::generate());
        let recorder = RecordingObserver::new();

        let receipt = client(signer.clone(), network.clone())
            .anchor(&fingerprint(), &recorder)
            .await
            .unwrap();

        let events = recorder.events();
        let states: Vec<_> = events.iter().map(|(s, _)| s.clone()).collect();
        assert_eq!(
            states,
            vec![
                AnchorState::Hashing,
                AnchorState::Signing,
                AnchorState::Sending,
                AnchorState::Confirming,
                AnchorState::Complete,
            ]
        );
        assert!(events[..4].iter().all(|(_, tx)| tx.is_none()));
        assert_eq!(events[4].1.as_ref(), Some(&receipt.transaction_id));
        assert_eq!(receipt.confirmed_round, 102);

        let submitted = network.submitted.lock().unwrap();
        let tx = &submitted[0].transaction;
        assert_eq!(tx.note, fingerprint().to_hex().as_bytes());
        assert_eq!(tx.amount, 0);
        assert_eq!(tx.sender, signer.address());
        assert_eq!(tx.receiver, signer.address());
        assert_eq!(tx.first_valid, 100);
        assert_eq!(*network.confirm_budget.lock().unwrap(), Some(4));
    }

    #[tokio::test]
    async fn declined_signature_ends_in_user_cancelled() {
        let network = Arc::new(ScriptedNetwork::default());
        let signer = Arc::new(LocalSigner::generate());
        signer.set_declining(true);
        let recorder = RecordingObserver::new();

        let err = client(signer, network.clone())
            .anchor(&fingerprint(), &recorder)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AnchorError {
                stage: AnchorState::Signing,
                failure: AnchorFailure::UserCancelled
            }
        );
        assert_eq!(
            recorder.states(),
            vec![
                AnchorState::Hashing,
                AnchorState::Signing,
                AnchorState::Failed(AnchorFailure::UserCancelled),
            ]
        );
        assert!(network.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_network_before_signing_is_a_signing_failure() {
        let network = Arc::new(ScriptedNetwork {
            round_error: Some(NetworkError::Unavailable("down".into())),
            ..ScriptedNetwork::default()
        });
        let recorder = RecordingObserver::new();

        let err = client(Arc::new(LocalSigner::generate()), network)
            .anchor(&fingerprint(), &recorder)
            .await
            .unwrap_err();

        assert_eq!(err.stage, AnchorState::Signing);
        assert!(matches!(err.failure, AnchorFailure::SigningFailed(_)));
        assert_eq!(recorder.states().len(), 3);
    }

    #[tokio::test]
    async fn signer_substituting_the_transaction_is_refused() {
        let network = Arc::new(ScriptedNetwork::default());
        let recorder = RecordingObserver::new();

        let err = client(Arc::new(SwappingSigner(LocalSigner::generate())), network.clone())
            .anchor(&fingerprint(), &recorder)
            .await
            .unwrap_err();

        assert!(matches!(err.failure, AnchorFailure::SigningFailed(_)));
        assert!(network.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_submission_ends_in_submission_rejected() {
        let network = Arc::new(ScriptedNetwork {
            submit_error: Some(NetworkError::Rejected("overspend".into())),
            ..ScriptedNetwork::default()
        });
        let recorder = RecordingObserver::new();

        let err = client(Arc::new(LocalSigner::generate()), network)
            .anchor(&fingerprint(), &recorder)
            .await
            .unwrap_err();

        let failure = AnchorFailure::SubmissionRejected("overspend".into());
        assert_eq!(
            err,
            AnchorError {
                stage: AnchorState::Sending,
                failure: failure.clone()
            }
        );
        assert_eq!(
            recorder.states(),
            vec![
                AnchorState::Hashing,
                AnchorState::Signing,
                AnchorState::Sending,
                AnchorState::Failed(failure),
            ]
        );
    }

    #[tokio::test]
    async fn slow_submission_is_rejected_after_timeout() {
        let network = Arc::new(ScriptedNetwork {
            submit_delay: Some(Duration::from_secs(30)),
            ..ScriptedNetwork::default()
        });
        let recorder = RecordingObserver::new();

        let err = client(Arc::new(LocalSigner::generate()), network)
            .anchor(&fingerprint(), &recorder)
            .await
            .unwrap_err();

        assert_eq!(err.stage, AnchorState::Sending);
        assert!(matches!(err.failure, AnchorFailure::SubmissionRejected(_)));
    }

    #[tokio::test]
    async fn unconfirmed_transaction_ends_in_confirmation_timeout() {
        for confirm_error in [
            NetworkError::Timeout {
                pending: TransactionRef::from_digest(&[0; 32]),
                rounds: 4,
            },
            NetworkError::Unavailable("partition".into()),
        ] {
            let network = Arc::new(ScriptedNetwork {
                confirm_error: Some(confirm_error),
                ..ScriptedNetwork::default()
            });
            let recorder = RecordingObserver::new();

            let err = client(Arc::new(LocalSigner::generate()), network.clone())
                .anchor(&fingerprint(), &recorder)
                .await
                .unwrap_err();

            let pending = network.submitted.lock().unwrap()[0].tx_ref();
            let failure = AnchorFailure::ConfirmationTimeout { pending, rounds: 4 };
            assert_eq!(err.stage, AnchorState::Confirming);
            assert_eq!(err.failure, failure);
            assert_eq!(
                recorder.states(),
                vec![
                    AnchorState::Hashing,
                    AnchorState::Signing,
                    AnchorState::Sending,
                    AnchorState::Confirming,
                    AnchorState::Failed(failure),
                ]
            );
        }
    }

    #[tokio::test]
    async fn anchors_against_devnet_and_reanchoring_yields_new_reference() {
        let network = Arc::new(DevnetLedger::new(DevnetConfig {
            round_interval: Duration::ZERO,
            ..DevnetConfig::default()
        }));
        let client = client(Arc::new(LocalSigner::generate()), network.clone());
        let fp = fingerprint();

        let first = client.anchor(&fp, &crate::state::NoopObserver).await.unwrap();
        network.advance_round().unwrap();
        let second = client.anchor(&fp, &crate::state::NoopObserver).await.unwrap();

        assert_ne!(first.transaction_id, second.transaction_id);
        for receipt in [first, second] {
            let entry = network.lookup(&receipt.transaction_id).await.unwrap();
            assert_eq!(entry.note, fp.to_hex().into_bytes());
        }
    }
}
