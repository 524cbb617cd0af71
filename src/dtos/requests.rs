use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoteDTO {
    pub subject: String,
    pub options: Vec<String>,
    #[serde(default = "default_duration_hours")]
    pub duration_hours: f64,
}

fn default_duration_hours() -> f64 {
    24.0
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CastBallotDTO {
    pub option_id: Uuid,
}
