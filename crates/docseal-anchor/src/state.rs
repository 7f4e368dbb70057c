use std::fmt;
use std::sync::Mutex;

use docseal_types::{Round, TransactionRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an anchoring attempt stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum AnchorFailure {
    #[error("user declined to sign")]
    UserCancelled,

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// The transaction was submitted but not seen finalized in time. It may
    /// still land later under `pending`.
    #[error("transaction {pending} not confirmed within {rounds} rounds")]
    ConfirmationTimeout { pending: TransactionRef, rounds: Round },
}

/// A point in the anchoring protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorState {
    Hashing,
    Signing,
    Sending,
    Confirming,
    Complete,
    Failed(AnchorFailure),
}

impl AnchorState {
    /// Position in the forward order; terminal failures have none.
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Hashing => Some(0),
            Self::Signing => Some(1),
            Self::Sending => Some(2),
            Self::Confirming => Some(3),
            Self::Complete => Some(4),
            Self::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed(_))
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Non-terminal states advance by exactly one step. Each failure can
    /// only be entered from the stage that produces it.
    pub fn can_advance_to(&self, next: &AnchorState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed(failure) => matches!(
                (self, failure),
                (Self::Signing, AnchorFailure::UserCancelled)
                    | (Self::Signing, AnchorFailure::SigningFailed(_))
                    | (Self::Sending, AnchorFailure::SubmissionRejected(_))
                    | (Self::Confirming, AnchorFailure::ConfirmationTimeout { .. })
            ),
            _ => match (self.rank(), next.rank()) {
                (Some(from), Some(to)) => to == from + 1,
                _ => false,
            },
        }
    }
}

impl fmt::Display for AnchorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashing => f.write_str("hashing"),
            Self::Signing => f.write_str("signing"),
            Self::Sending => f.write_str("sending"),
            Self::Confirming => f.write_str("confirming"),
            Self::Complete => f.write_str("complete"),
            Self::Failed(failure) => write!(f, "failed ({failure})"),
        }
    }
}

/// Receives every anchoring transition.
///
/// The transaction reference is present only on [`AnchorState::Complete`].
pub trait AnchorObserver: Send + Sync {
    fn on_transition(&self, state: &AnchorState, tx: Option<&TransactionRef>);
}

impl<F> AnchorObserver for F
where
    F: Fn(&AnchorState, Option<&TransactionRef>) + Send + Sync,
{
    fn on_transition(&self, state: &AnchorState, tx: Option<&TransactionRef>) {
        self(state, tx)
    }
}

/// Observer that ignores every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AnchorObserver for NoopObserver {
    fn on_transition(&self, _state: &AnchorState, _tx: Option<&TransactionRef>) {}
}

/// Observer that keeps every transition in order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(AnchorState, Option<TransactionRef>)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(AnchorState, Option<TransactionRef>)> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn states(&self) -> Vec<AnchorState> {
        self.events().into_iter().map(|(state, _)| state).collect()
    }
}

impl AnchorObserver for RecordingObserver {
    fn on_transition(&self, state: &AnchorState, tx: Option<&TransactionRef>) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push((state.clone(), tx.cloned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRESSION: [AnchorState; 5] = [
        AnchorState::Hashing,
        AnchorState::Signing,
        AnchorState::Sending,
        AnchorState::Confirming,
        AnchorState::Complete,
    ];

    #[test]
    fn forward_steps_are_legal() {
        for pair in PROGRESSION.windows(2) {
            assert!(pair[0].can_advance_to(&pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn backward_and_skipping_steps_are_illegal() {
        for (i, from) in PROGRESSION.iter().enumerate() {
            for (j, to) in PROGRESSION.iter().enumerate() {
                if j != i + 1 {
                    assert!(!from.can_advance_to(to), "{from} -> {to}");
                }
            }
        }
        assert!(!AnchorState::Confirming.can_advance_to(&AnchorState::Signing));
    }

    #[test]
    fn failures_only_from_their_stage() {
        let cancelled = AnchorState::Failed(AnchorFailure::UserCancelled);
        let rejected = AnchorState::Failed(AnchorFailure::SubmissionRejected("bad".into()));
        let timeout = AnchorState::Failed(AnchorFailure::ConfirmationTimeout {
            pending: TransactionRef::from_digest(&[1; 32]),
            rounds: 4,
        });

        assert!(AnchorState::Signing.can_advance_to(&cancelled));
        assert!(!AnchorState::Sending.can_advance_to(&cancelled));
        assert!(AnchorState::Sending.can_advance_to(&rejected));
        assert!(!AnchorState::Confirming.can_advance_to(&rejected));
        assert!(AnchorState::Confirming.can_advance_to(&timeout));
        assert!(!AnchorState::Hashing.can_advance_to(&timeout));
    }

    #[test]
    fn terminal_states_never_advance() {
        let failed = AnchorState::Failed(AnchorFailure::UserCancelled);
        for next in PROGRESSION.iter().chain(std::iter::once(&failed)) {
            assert!(!AnchorState::Complete.can_advance_to(next));
            assert!(!failed.can_advance_to(next));
        }
    }

    #[test]
    fn closures_are_observers() {
        let seen = Mutex::new(Vec::new());
        let observer = |state: &AnchorState, _tx: Option<&TransactionRef>| {
            seen.lock().unwrap().push(state.to_string());
        };
        observer.on_transition(&AnchorState::Signing, None);
        assert_eq!(seen.into_inner().unwrap(), vec!["signing".to_string()]);
    }

    #[test]
    fn recording_observer_keeps_order() {
        let recorder = RecordingObserver::new();
        let tx = TransactionRef::from_digest(&[2; 32]);
        recorder.on_transition(&AnchorState::Confirming, None);
        recorder.on_transition(&AnchorState::Complete, Some(&tx));
        assert_eq!(
            recorder.events(),
            vec![(AnchorState::Confirming, None), (AnchorState::Complete, Some(tx))]
        );
    }
}
