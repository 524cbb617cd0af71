use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use tower_http::cors::CorsLayer;

pub fn init_cors(allowed_origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .context("ALLOWED_ORIGIN is not a valid origin")?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_origin([origin]);

    Ok(cors)
}
