//! Active → Closed transition rules.
//!
//! A vote leaves the active state exactly once, through one of two triggers:
//! an explicit administrative close, or expiry of its duration. Expiry is
//! detected lazily whenever the store touches the vote, and by a periodic
//! sweep so idle votes still close on time. All three paths funnel through
//! the two functions here, called under the store's write lock.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::info;

use crate::{models::vote::Vote, repositories::vote_store::VoteStore};

/// Applies the expiry transition if it is due. Returns whether the vote
/// transitioned; already-closed votes are left untouched, so a manual close
/// can never be overwritten. Expiry does not stamp `closed_at` — that field
/// marks manual closure only.
pub(crate) fn expiry_close(vote: &mut Vote, now: DateTime<Utc>) -> bool {
    if !vote.is_expiry_due(now) {
        return false;
    }
    vote.is_active = false;
    true
}

/// Applies the manual close transition. Idempotent: returns false when the
/// vote is already inactive, leaving `closed_at` as the first close set it.
pub(crate) fn manual_close(vote: &mut Vote, now: DateTime<Utc>) -> bool {
    if !vote.is_active {
        return false;
    }
    vote.is_active = false;
    vote.closed_at = Some(now);
    true
}

/// Periodic expiry sweep, independent of request traffic.
pub fn spawn_sweeper(store: Arc<VoteStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick fires immediately; skip it so startup stays quiet.
        interval.tick().await;
        loop {
            interval.tick().await;
            let expired = store.sweep(Utc::now()).await;
            if expired > 0 {
                info!(expired, "Auto-expired votes");
            }
        }
    })
}
