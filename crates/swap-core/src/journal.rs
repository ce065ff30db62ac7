//! Coordinator persistence entity (§3, §4.8(b), §4.9).

use serde::{Deserialize, Serialize};

use crate::types::{OrderHash, Preimage, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalState {
    Observed,
    DestinationInitiated,
    PreimageKnown,
    Completed,
    Abandoned,
}

impl JournalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JournalState::Completed | JournalState::Abandoned)
    }

    /// Monotonic forward-progress check for §4.8(b)'s state machine. The
    /// journal may only move strictly forward, or sideways into Abandoned
    /// from any non-terminal state.
    pub fn can_advance_to(&self, next: JournalState) -> bool {
        use JournalState::*;
        if self.is_terminal() {
            return false;
        }
        if next == Abandoned {
            return true;
        }
        matches!(
            (self, next),
            (Observed, DestinationInitiated)
                | (Observed, PreimageKnown)
                | (DestinationInitiated, PreimageKnown)
                | (PreimageKnown, Completed)
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub order_hash: OrderHash,
    pub state: JournalState,
    pub preimage: Option<Preimage>,
    pub last_step_at: Timestamp,
    pub retries: u32,
    /// Sequence number of the last append-only log record applied to this
    /// entry's snapshot (§4.9), used by `replay-from` (§6).
    pub last_seq: u64,
}

impl JournalEntry {
    pub fn new(order_hash: OrderHash, observed_at: Timestamp) -> Self {
        Self {
            order_hash,
            state: JournalState::Observed,
            preimage: None,
            last_step_at: observed_at,
            retries: 0,
            last_seq: 0,
        }
    }
}

/// One append-only log record (§4.9). `payload` is the bincode-serialized
/// `ChainEvent` or administrative command that produced this entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogRecord {
    pub seq: u64,
    pub order_hash: OrderHash,
    pub event_kind: String,
    pub payload: Vec<u8>,
    pub observed_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_cannot_advance() {
        assert!(!JournalState::Completed.can_advance_to(JournalState::Observed));
        assert!(!JournalState::Abandoned.can_advance_to(JournalState::PreimageKnown));
    }

    #[test]
    fn any_non_terminal_state_can_abandon() {
        assert!(JournalState::Observed.can_advance_to(JournalState::Abandoned));
        assert!(JournalState::DestinationInitiated.can_advance_to(JournalState::Abandoned));
    }

    #[test]
    fn forward_progress_is_monotonic() {
        assert!(JournalState::Observed.can_advance_to(JournalState::DestinationInitiated));
        assert!(!JournalState::PreimageKnown.can_advance_to(JournalState::Observed));
        assert!(!JournalState::DestinationInitiated.can_advance_to(JournalState::Observed));
    }
}
