use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::vote::Vote;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Something went really wrong, send help")]
    Unknown,

    // Vote Errors
    #[error("Vote error: {0}")]
    Vote(#[from] VoteError),
}

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Invalid vote definition: {0}")]
    Validation(String),

    #[error("Vote not found")]
    VoteNotFound,

    #[error("Invalid vote option")]
    InvalidOption,

    /// Carries the current tallies so the caller can render results instead.
    #[error("You have already voted on this subject")]
    AlreadyVoted(Box<Vote>),

    /// Raised for manual closure and expiry alike; carries the final tallies.
    #[error("This vote has expired and is no longer active")]
    VoteClosed(Box<Vote>),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_string = self.to_string();
        let (status, error_message, snapshot) = match self {
            AppError::Vote(vote_err) => match vote_err {
                VoteError::Validation(_) => (StatusCode::BAD_REQUEST, "Invalid Vote Definition", None),
                VoteError::VoteNotFound => (StatusCode::NOT_FOUND, "Vote Not Found", None),
                VoteError::InvalidOption => (StatusCode::BAD_REQUEST, "Invalid Vote Option", None),
                VoteError::AlreadyVoted(vote) => (
                    StatusCode::CONFLICT,
                    "Already Voted On This Subject",
                    Some(("hasVoted", vote)),
                ),
                VoteError::VoteClosed(vote) => (
                    StatusCode::GONE,
                    "Vote No Longer Active",
                    Some(("isExpired", vote)),
                ),
            },

            AppError::Unknown => (StatusCode::INTERNAL_SERVER_ERROR, "Unknown Error", None),
        };

        let mut body = json!({
            "status": status.as_u16(),
            "message": error_message,
            "error": error_string,
            "timestamp": chrono::Utc::now()
        });
        if let Some((flag, vote)) = snapshot {
            body[flag] = json!(true);
            body["vote"] = json!(vote);
        }

        (status, Json(body)).into_response()
    }
}
