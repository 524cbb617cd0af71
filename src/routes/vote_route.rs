use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::controllers::vote_controller::{
    cast_ballot, close_vote_by_id, create_new_vote, delete_vote_by_id, get_all_votes,
    get_vote_by_id, get_vote_status, stream_vote_events,
};

pub fn vote_router() -> Router {
    Router::new()
        .route("/", get(get_all_votes))
        .route("/", post(create_new_vote))
        .route("/events", get(stream_vote_events))
        .route("/{vote_id}", get(get_vote_by_id))
        .route("/{vote_id}", delete(delete_vote_by_id))
        .route("/{vote_id}/vote-status", get(get_vote_status))
        .route("/{vote_id}/vote", post(cast_ballot))
        .route("/{vote_id}/close", post(close_vote_by_id))
}
