use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::{
    error::VoteError,
    events::{EventBus, VoteEvent},
    lifecycle,
    models::{
        participant::ParticipantId,
        vote::{Vote, VoteOption},
    },
};

use super::ballot_ledger::BallotLedger;

/// In-memory store for all votes and their ballot ledger.
///
/// The table and the ledger sit behind one lock, making every mutation a
/// single critical section: the duplicate-ballot check and the tally
/// increment cannot interleave with another cast for the same vote. Events
/// are published while the lock is still held, so subscribers observe the
/// changes of a given vote in commit order. No critical section awaits,
/// blocks, or performs I/O.
pub struct VoteStore {
    table: RwLock<VoteTable>,
    events: EventBus,
}

#[derive(Default)]
struct VoteTable {
    votes: HashMap<Uuid, Vote>,
    /// Insertion order, so listings stay stable.
    order: Vec<Uuid>,
    ledger: BallotLedger,
}

impl VoteTable {
    fn snapshot(&self) -> Vec<Vote> {
        self.order
            .iter()
            .filter_map(|id| self.votes.get(id).cloned())
            .collect()
    }
}

impl VoteStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            table: RwLock::new(VoteTable::default()),
            events,
        }
    }

    /// Validates and registers a new vote. Options keep their given order;
    /// blank texts are discarded before the two-option minimum is checked.
    pub async fn create_vote(
        &self,
        subject: &str,
        option_texts: &[String],
        duration_hours: f64,
        now: DateTime<Utc>,
    ) -> Result<Vote, VoteError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(VoteError::Validation("subject must not be empty".into()));
        }

        let options: Vec<VoteOption> = option_texts
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(|text| VoteOption {
                id: Uuid::new_v4(),
                text: text.to_owned(),
                count: 0,
            })
            .collect();
        if options.len() < 2 {
            return Err(VoteError::Validation(
                "at least two non-empty options are required".into(),
            ));
        }

        if !(duration_hours.is_finite() && duration_hours > 0.0) {
            return Err(VoteError::Validation(
                "durationHours must be a positive number".into(),
            ));
        }
        let expires_at = duration_as_delta(duration_hours)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| VoteError::Validation("durationHours is out of range".into()))?;

        let vote = Vote {
            id: Uuid::new_v4(),
            subject: subject.to_owned(),
            options,
            total_votes: 0,
            created_at: now,
            duration_hours,
            expires_at,
            is_active: true,
            closed_at: None,
        };

        let mut table = self.table.write().await;
        table.order.push(vote.id);
        table.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    pub async fn get_vote(&self, id: Uuid, now: DateTime<Utc>) -> Result<Vote, VoteError> {
        {
            let table = self.table.read().await;
            match table.votes.get(&id) {
                None => return Err(VoteError::VoteNotFound),
                Some(vote) if !vote.is_expiry_due(now) => return Ok(vote.clone()),
                Some(_) => {}
            }
        }

        // Expiry is due: retake as a writer so the close commits atomically
        // with this read. The vote may have been closed or deleted while the
        // lock was released, hence the re-check.
        let mut table = self.table.write().await;
        let vote = table.votes.get_mut(&id).ok_or(VoteError::VoteNotFound)?;
        if lifecycle::expiry_close(vote, now) {
            self.events.publish(VoteEvent::closed(vote.clone()));
        }
        Ok(vote.clone())
    }

    /// All votes in insertion order, with due expiries applied first.
    pub async fn list_votes(&self, now: DateTime<Utc>) -> Vec<Vote> {
        {
            let table = self.table.read().await;
            if !table.votes.values().any(|vote| vote.is_expiry_due(now)) {
                return table.snapshot();
            }
        }

        let mut table = self.table.write().await;
        self.expire_due(&mut table, now);
        table.snapshot()
    }

    pub async fn vote_status(
        &self,
        id: Uuid,
        participant: &ParticipantId,
    ) -> Result<bool, VoteError> {
        let table = self.table.read().await;
        if !table.votes.contains_key(&id) {
            return Err(VoteError::VoteNotFound);
        }
        Ok(table.ledger.has_voted(id, participant))
    }

    /// Accepts at most one ballot per participant per vote. The whole
    /// read-check-increment-register sequence runs under the write lock.
    pub async fn cast_ballot(
        &self,
        id: Uuid,
        participant: ParticipantId,
        option_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vote, VoteError> {
        let mut table = self.table.write().await;
        let VoteTable { votes, ledger, .. } = &mut *table;
        let vote = votes.get_mut(&id).ok_or(VoteError::VoteNotFound)?;

        if lifecycle::expiry_close(vote, now) {
            self.events.publish(VoteEvent::closed(vote.clone()));
        }
        if !vote.is_active {
            return Err(VoteError::VoteClosed(Box::new(vote.clone())));
        }
        if ledger.has_voted(id, &participant) {
            return Err(VoteError::AlreadyVoted(Box::new(vote.clone())));
        }

        let option = vote
            .options
            .iter_mut()
            .find(|option| option.id == option_id)
            .ok_or(VoteError::InvalidOption)?;
        option.count += 1;
        vote.total_votes += 1;
        ledger.register(id, participant);
        debug_assert_eq!(
            vote.total_votes,
            vote.options.iter().map(|option| option.count).sum::<u64>()
        );

        let vote = vote.clone();
        self.events.publish(VoteEvent::updated(vote.clone()));
        Ok(vote)
    }

    /// Manual close. Returns the snapshot and whether this call performed
    /// the transition; closing an inactive vote is a no-op with notice.
    pub async fn close_vote(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Vote, bool), VoteError> {
        let mut table = self.table.write().await;
        let vote = table.votes.get_mut(&id).ok_or(VoteError::VoteNotFound)?;
        let transitioned = lifecycle::manual_close(vote, now);
        let vote = vote.clone();
        if transitioned {
            self.events.publish(VoteEvent::closed(vote.clone()));
        }
        Ok((vote, transitioned))
    }

    /// Removes the vote and purges its ledger entries in the same critical
    /// section, so a lingering ballot record can never outlive its vote.
    pub async fn delete_vote(&self, id: Uuid) -> Result<Uuid, VoteError> {
        let mut table = self.table.write().await;
        table.votes.remove(&id).ok_or(VoteError::VoteNotFound)?;
        table.order.retain(|kept| *kept != id);
        table.ledger.purge(id);
        self.events.publish(VoteEvent::deleted(id));
        Ok(id)
    }

    /// Closes every due vote; returns how many transitioned.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut table = self.table.write().await;
        self.expire_due(&mut table, now)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.events.subscribe()
    }

    fn expire_due(&self, table: &mut VoteTable, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for vote in table.votes.values_mut() {
            if lifecycle::expiry_close(vote, now) {
                self.events.publish(VoteEvent::closed(vote.clone()));
                expired += 1;
            }
        }
        expired
    }
}

fn duration_as_delta(hours: f64) -> Option<TimeDelta> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis < 0.0 || millis > i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn store() -> VoteStore {
        VoteStore::new(EventBus::new(16))
    }

    fn snack_options() -> Vec<String> {
        vec!["Chips".to_string(), "Fruit".to_string()]
    }

    fn participant(token: &str) -> ParticipantId {
        ParticipantId::new(token)
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids_and_zero_tallies() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();

        assert_eq!(vote.subject, "Snack choice");
        assert_eq!(vote.options.len(), 2);
        assert_eq!(vote.options[0].text, "Chips");
        assert_eq!(vote.options[1].text, "Fruit");
        assert!(vote.options.iter().all(|option| option.count == 0));
        assert_ne!(vote.options[0].id, vote.options[1].id);
        assert_eq!(vote.total_votes, 0);
        assert!(vote.is_active);
        assert_eq!(vote.closed_at, None);
        assert_eq!(vote.expires_at, now + TimeDelta::hours(24));
    }

    #[tokio::test]
    async fn create_rejects_malformed_input() {
        let store = store();
        let now = Utc::now();

        let blank_subject = store
            .create_vote("   ", &snack_options(), 24.0, now)
            .await;
        assert!(matches!(blank_subject, Err(VoteError::Validation(_))));

        let one_option = store
            .create_vote("Snack choice", &["Chips".to_string(), "  ".to_string()], 24.0, now)
            .await;
        assert!(matches!(one_option, Err(VoteError::Validation(_))));

        for bad_duration in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = store
                .create_vote("Snack choice", &snack_options(), bad_duration, now)
                .await;
            assert!(matches!(result, Err(VoteError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn one_hour_vote_expires_exactly_on_the_hour() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 1.0, now)
            .await
            .unwrap();
        assert_eq!(vote.expires_at, now + TimeDelta::hours(1));

        let at_59 = store
            .get_vote(vote.id, now + TimeDelta::minutes(59))
            .await
            .unwrap();
        assert!(at_59.is_active);

        let at_61 = store
            .get_vote(vote.id, now + TimeDelta::minutes(61))
            .await
            .unwrap();
        assert!(!at_61.is_active);
        // Expiry-driven closure never stamps the closure timestamp.
        assert_eq!(at_61.closed_at, None);
    }

    #[tokio::test]
    async fn second_ballot_from_same_participant_is_rejected() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let chips = vote.options[0].id;

        let updated = store
            .cast_ballot(vote.id, participant("A"), chips, now)
            .await
            .unwrap();
        assert_eq!(updated.total_votes, 1);
        assert_eq!(updated.options[0].count, 1);

        let rejected = store
            .cast_ballot(vote.id, participant("A"), chips, now)
            .await;
        match rejected {
            Err(VoteError::AlreadyVoted(snapshot)) => {
                assert_eq!(snapshot.total_votes, 1);
            }
            other => panic!("expected AlreadyVoted, got {other:?}"),
        }

        assert!(store.vote_status(vote.id, &participant("A")).await.unwrap());
        assert!(!store.vote_status(vote.id, &participant("B")).await.unwrap());
    }

    #[tokio::test]
    async fn tallies_stay_consistent_across_participants() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let chips = vote.options[0].id;
        let fruit = vote.options[1].id;

        store
            .cast_ballot(vote.id, participant("A"), chips, now)
            .await
            .unwrap();
        store
            .cast_ballot(vote.id, participant("B"), fruit, now)
            .await
            .unwrap();
        let latest = store
            .cast_ballot(vote.id, participant("C"), chips, now)
            .await
            .unwrap();

        assert_eq!(latest.total_votes, 3);
        assert_eq!(
            latest.total_votes,
            latest.options.iter().map(|option| option.count).sum::<u64>()
        );
        assert_eq!(latest.options[0].count, 2);
        assert_eq!(latest.options[1].count, 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_casts_accept_exactly_one() {
        let store = Arc::new(store());
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let vote_id = vote.id;
        let chips = vote.options[0].id;

        let casts = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .cast_ballot(vote_id, participant("10.0.0.1"), chips, now)
                    .await
            })
        });

        let outcomes = futures::future::join_all(casts).await;
        let accepted = outcomes
            .into_iter()
            .filter(|cast| cast.as_ref().unwrap().is_ok())
            .count();
        assert_eq!(accepted, 1);

        let latest = store.get_vote(vote_id, now).await.unwrap();
        assert_eq!(latest.total_votes, 1);
    }

    #[tokio::test]
    async fn unknown_vote_and_option_are_rejected() {
        let store = store();
        let now = Utc::now();

        let missing = store
            .cast_ballot(Uuid::new_v4(), participant("A"), Uuid::new_v4(), now)
            .await;
        assert!(matches!(missing, Err(VoteError::VoteNotFound)));

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let bad_option = store
            .cast_ballot(vote.id, participant("A"), Uuid::new_v4(), now)
            .await;
        assert!(matches!(bad_option, Err(VoteError::InvalidOption)));

        // A failed cast must not consume the participant's ballot.
        let latest = store.get_vote(vote.id, now).await.unwrap();
        assert_eq!(latest.total_votes, 0);
        assert!(!store.vote_status(vote.id, &participant("A")).await.unwrap());
    }

    #[tokio::test]
    async fn manual_close_blocks_new_ballots_and_is_idempotent() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let chips = vote.options[0].id;
        store
            .cast_ballot(vote.id, participant("A"), chips, now)
            .await
            .unwrap();

        let (closed, transitioned) = store.close_vote(vote.id, now).await.unwrap();
        assert!(transitioned);
        assert!(!closed.is_active);
        let stamped = closed.closed_at;
        assert!(stamped.is_some());

        // Still before expiry, but manual close is permanent.
        let rejected = store
            .cast_ballot(vote.id, participant("B"), chips, now)
            .await;
        match rejected {
            Err(VoteError::VoteClosed(snapshot)) => assert_eq!(snapshot.total_votes, 1),
            other => panic!("expected VoteClosed, got {other:?}"),
        }

        let (again, transitioned) = store.close_vote(vote.id, now).await.unwrap();
        assert!(!transitioned);
        assert_eq!(again.closed_at, stamped);

        let latest = store.get_vote(vote.id, now).await.unwrap();
        assert_eq!(latest.total_votes, 1);
    }

    #[tokio::test]
    async fn sweep_closes_only_due_votes() {
        let store = store();
        let now = Utc::now();

        let short = store
            .create_vote("Lunch spot", &snack_options(), 1.0, now)
            .await
            .unwrap();
        let long = store
            .create_vote("Team name", &snack_options(), 48.0, now)
            .await
            .unwrap();

        let expired = store.sweep(now + TimeDelta::hours(2)).await;
        assert_eq!(expired, 1);

        let later = now + TimeDelta::hours(2);
        assert!(!store.get_vote(short.id, later).await.unwrap().is_active);
        assert!(store.get_vote(long.id, later).await.unwrap().is_active);

        // Nothing left to do.
        assert_eq!(store.sweep(later).await, 0);
    }

    #[tokio::test]
    async fn listing_keeps_insertion_order_and_applies_expiry() {
        let store = store();
        let now = Utc::now();

        let first = store
            .create_vote("First", &snack_options(), 1.0, now)
            .await
            .unwrap();
        let second = store
            .create_vote("Second", &snack_options(), 48.0, now)
            .await
            .unwrap();

        let listed = store.list_votes(now + TimeDelta::hours(2)).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
        assert!(!listed[0].is_active);
        assert!(listed[1].is_active);
    }

    #[tokio::test]
    async fn delete_removes_the_vote_and_its_ballots() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let chips = vote.options[0].id;
        store
            .cast_ballot(vote.id, participant("A"), chips, now)
            .await
            .unwrap();

        store.delete_vote(vote.id).await.unwrap();

        assert!(matches!(
            store.get_vote(vote.id, now).await,
            Err(VoteError::VoteNotFound)
        ));
        assert!(matches!(
            store.vote_status(vote.id, &participant("A")).await,
            Err(VoteError::VoteNotFound)
        ));
        assert!(store.list_votes(now).await.is_empty());
        assert!(matches!(
            store.delete_vote(vote.id).await,
            Err(VoteError::VoteNotFound)
        ));
    }

    #[tokio::test]
    async fn subscribers_see_events_in_commit_order() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 24.0, now)
            .await
            .unwrap();
        let chips = vote.options[0].id;
        let fruit = vote.options[1].id;

        let mut rx = store.subscribe();

        store
            .cast_ballot(vote.id, participant("A"), chips, now)
            .await
            .unwrap();
        store
            .cast_ballot(vote.id, participant("B"), fruit, now)
            .await
            .unwrap();
        store.close_vote(vote.id, now).await.unwrap();
        store.delete_vote(vote.id).await.unwrap();

        match rx.recv().await.unwrap() {
            VoteEvent::Updated { vote, .. } => assert_eq!(vote.total_votes, 1),
            other => panic!("expected first update, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            VoteEvent::Updated { vote, .. } => assert_eq!(vote.total_votes, 2),
            other => panic!("expected second update, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            VoteEvent::Closed { vote, .. } => assert!(!vote.is_active),
            other => panic!("expected close event, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            VoteEvent::Deleted { vote_id } => assert_eq!(vote_id, vote.id),
            other => panic!("expected delete event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lazy_expiry_inside_cast_emits_close_before_rejecting() {
        let store = store();
        let now = Utc::now();

        let vote = store
            .create_vote("Snack choice", &snack_options(), 1.0, now)
            .await
            .unwrap();
        let chips = vote.options[0].id;

        let mut rx = store.subscribe();

        let late = now + TimeDelta::minutes(61);
        let rejected = store
            .cast_ballot(vote.id, participant("A"), chips, late)
            .await;
        assert!(matches!(rejected, Err(VoteError::VoteClosed(_))));

        match rx.recv().await.unwrap() {
            VoteEvent::Closed { vote_id, vote } => {
                assert_eq!(vote_id, vote.id);
                assert!(!vote.is_active);
                assert_eq!(vote.closed_at, None);
            }
            other => panic!("expected close event, got {other:?}"),
        }
    }
}
