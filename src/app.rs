use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::{
    config::{cors::init_cors, settings::Settings, startup::AppState},
    routes::vote_route::vote_router,
};

pub fn create_app(state: AppState, settings: &Settings) -> anyhow::Result<Router> {
    let app = Router::new()
        .nest("/api/votes", vote_router())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
        .layer(init_cors(&settings.allowed_origin)?);

    Ok(app)
}
