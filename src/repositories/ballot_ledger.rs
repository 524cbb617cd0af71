use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::participant::ParticipantId;

/// The set of (vote, participant) pairs that have already voted.
///
/// Only the fact of having voted is kept; the chosen option lives in the
/// vote's tallies, so a ballot can never be changed or revoked. The ledger is
/// plain data with no lock of its own: the store mutates it under the same
/// lock as the tallies, which is what makes check-then-register indivisible.
#[derive(Debug, Default)]
pub struct BallotLedger {
    entries: HashMap<Uuid, HashSet<ParticipantId>>,
}

impl BallotLedger {
    pub fn has_voted(&self, vote_id: Uuid, participant: &ParticipantId) -> bool {
        self.entries
            .get(&vote_id)
            .is_some_and(|voters| voters.contains(participant))
    }

    /// Records the ballot; returns false if the participant already had one.
    pub fn register(&mut self, vote_id: Uuid, participant: ParticipantId) -> bool {
        self.entries.entry(vote_id).or_default().insert(participant)
    }

    /// Drops every record for a vote. Used when the vote is deleted.
    pub fn purge(&mut self, vote_id: Uuid) {
        self.entries.remove(&vote_id);
    }
}
