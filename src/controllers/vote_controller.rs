use std::{convert::Infallible, time::Duration};

use axum::{
    extract::Path,
    http::{self, StatusCode},
    response::{sse::Event, sse::KeepAlive, Sse},
    Extension, Json,
};
use chrono::Utc;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::startup::AppState,
    dtos::{
        requests::{CastBallotDTO, CreateVoteDTO},
        responses::{ApiResponse, VoteStatusData},
    },
    error::AppError,
    middleware::participant::Participant,
    models::vote::Vote,
};

//*GET:: api/votes
pub async fn get_all_votes(
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<Vec<Vote>>>, AppError> {
    let votes = state.store.list_votes(Utc::now()).await;

    Ok(Json(ApiResponse {
        status: StatusCode::OK.as_u16() as i32,
        message: String::from("All votes fetched successfully"),
        data: Some(votes),
        timestamp: Utc::now(),
        error: None,
    }))
}

//?POST:: api/votes
pub async fn create_new_vote(
    Extension(state): Extension<AppState>,
    Json(payload): Json<CreateVoteDTO>,
) -> Result<Json<ApiResponse<Vote>>, AppError> {
    let vote = state
        .store
        .create_vote(
            &payload.subject,
            &payload.options,
            payload.duration_hours,
            Utc::now(),
        )
        .await?;

    Ok(Json(ApiResponse {
        status: http::StatusCode::CREATED.as_u16() as i32,
        message: String::from("Vote created successfully"),
        data: Some(vote),
        timestamp: Utc::now(),
        error: None,
    }))
}

//*GET:: api/votes/vote_id
pub async fn get_vote_by_id(
    Extension(state): Extension<AppState>,
    Path(vote_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vote>>, AppError> {
    let vote = state.store.get_vote(vote_id, Utc::now()).await?;

    Ok(Json(ApiResponse {
        status: http::StatusCode::OK.as_u16() as i32,
        message: String::from("Vote retrieved successfully"),
        data: Some(vote),
        timestamp: Utc::now(),
        error: None,
    }))
}

//*GET:: api/votes/vote_id/vote-status
pub async fn get_vote_status(
    Extension(state): Extension<AppState>,
    Path(vote_id): Path<Uuid>,
    Participant(participant): Participant,
) -> Result<Json<ApiResponse<VoteStatusData>>, AppError> {
    let has_voted = state.store.vote_status(vote_id, &participant).await?;

    Ok(Json(ApiResponse {
        status: http::StatusCode::OK.as_u16() as i32,
        message: String::from("Vote status retrieved successfully"),
        data: Some(VoteStatusData { has_voted }),
        timestamp: Utc::now(),
        error: None,
    }))
}

//?POST:: api/votes/vote_id/vote
pub async fn cast_ballot(
    Extension(state): Extension<AppState>,
    Path(vote_id): Path<Uuid>,
    Participant(participant): Participant,
    Json(payload): Json<CastBallotDTO>,
) -> Result<Json<ApiResponse<Vote>>, AppError> {
    let vote = state
        .store
        .cast_ballot(vote_id, participant, payload.option_id, Utc::now())
        .await?;

    Ok(Json(ApiResponse {
        status: http::StatusCode::OK.as_u16() as i32,
        message: String::from("Ballot cast successfully"),
        data: Some(vote),
        timestamp: Utc::now(),
        error: None,
    }))
}

//?POST:: api/votes/vote_id/close
pub async fn close_vote_by_id(
    Extension(state): Extension<AppState>,
    Path(vote_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vote>>, AppError> {
    let (vote, transitioned) = state.store.close_vote(vote_id, Utc::now()).await?;

    Ok(Json(ApiResponse {
        status: http::StatusCode::OK.as_u16() as i32,
        message: String::from(if transitioned {
            "Vote closed successfully"
        } else {
            "Vote was already closed"
        }),
        data: Some(vote),
        timestamp: Utc::now(),
        error: None,
    }))
}

//?DELETE:: api/votes/vote_id
pub async fn delete_vote_by_id(
    Extension(state): Extension<AppState>,
    Path(vote_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Uuid>>, AppError> {
    let deleted = state.store.delete_vote(vote_id).await?;

    Ok(Json(ApiResponse {
        status: http::StatusCode::OK.as_u16() as i32,
        message: String::from("Vote deleted successfully"),
        data: Some(deleted),
        timestamp: Utc::now(),
        error: None,
    }))
}

//*GET:: api/votes/events
pub async fn stream_vote_events(
    Extension(state): Extension<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.store.subscribe();

    // No backlog: a fresh subscriber only sees changes from here on and is
    // expected to fetch full state separately.
    let stream = BroadcastStream::new(rx).filter_map(|received| match received {
        Ok(event) => Some(Ok::<_, Infallible>(
            Event::default()
                .event(event.name())
                .data(event.payload().to_string()),
        )),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "SSE subscriber lagged; events dropped");
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive-text"),
    )
}
