pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod ingest;
pub mod models;
pub mod routes;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies/create/", post(routes::create_movie))
        .route("/movies/actor/{name}/", get(routes::movies_by_actor))
        .route("/movies/genre/{name}/", get(routes::movies_by_genre))
        .route("/movies/director/{name}/", get(routes::movies_by_director))
        .route("/movies/top-rated/{n}/", get(routes::top_rated))
        .route("/movies/best-roi/{n}/", get(routes::best_roi))
        .route("/movies/{id}/", get(routes::movie_detail))
        .route("/directors/create/", post(routes::create_director))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tmdb_catalog=debug,load_csv=debug,sqlx=warn".to_string()),
        )
        .init();
}
