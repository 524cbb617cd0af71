use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single voting subject with its ordered options and running tallies.
///
/// `total_votes` always equals the sum of the option counts; both are only
/// touched together inside the store's critical section. `is_active` flips to
/// false exactly once (manual close or expiry) and never back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub subject: String,
    pub options: Vec<VoteOption>,
    pub total_votes: u64,
    pub created_at: DateTime<Utc>,
    pub duration_hours: f64,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    /// Stamped on manual close only; an expired vote keeps `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOption {
    pub id: Uuid,
    pub text: String,
    pub count: u64,
}

impl Vote {
    pub fn is_expiry_due(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.expires_at
    }
}
