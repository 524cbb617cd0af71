use std::net::SocketAddr;

use axum::{extract::ConnectInfo, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::participant::ParticipantId};

/// Extracts the participant token from the peer address.
///
/// The token is whatever the transport hands us; the core never treats it as
/// a verified identity, only as a ballot-dedup key.
pub struct Participant(pub ParticipantId);

impl<S> FromRequestParts<S> for Participant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let connect_info = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .ok_or(AppError::Unknown)?;

        Ok(Participant(ParticipantId::from(&connect_info.0)))
    }
}
