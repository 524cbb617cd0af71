use serde_json::{json, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::vote::Vote;

/// State-change notifications broadcast to every connected viewer.
///
/// Creation is deliberately silent: a viewer learns about new votes by
/// fetching the list, the stream only carries changes to votes it may
/// already be rendering.
#[derive(Debug, Clone)]
pub enum VoteEvent {
    Updated { vote_id: Uuid, vote: Vote },
    Closed { vote_id: Uuid, vote: Vote },
    Deleted { vote_id: Uuid },
}

impl VoteEvent {
    pub fn updated(vote: Vote) -> Self {
        Self::Updated { vote_id: vote.id, vote }
    }

    pub fn closed(vote: Vote) -> Self {
        Self::Closed { vote_id: vote.id, vote }
    }

    pub fn deleted(vote_id: Uuid) -> Self {
        Self::Deleted { vote_id }
    }

    /// Wire name of the event, as emitted to viewers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "vote_update",
            Self::Closed { .. } => "vote_closed",
            Self::Deleted { .. } => "vote_deleted",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::Updated { vote_id, vote } | Self::Closed { vote_id, vote } => {
                json!({ "voteId": vote_id, "vote": vote })
            }
            Self::Deleted { vote_id } => json!({ "voteId": vote_id }),
        }
    }
}

/// Fan-out channel between the store and the SSE endpoint.
///
/// Delivery is best-effort, at-most-once per subscriber: a slow or
/// disconnected subscriber misses events and is expected to re-fetch full
/// state on reconnect. There is no replay.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VoteEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Never blocks; a send with no subscribers is not an error.
    pub fn publish(&self, event: VoteEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.tx.subscribe()
    }
}
