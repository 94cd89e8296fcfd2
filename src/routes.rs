use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppResult,
    models::{DirectorDetail, MovieDetail, NewDirector, NewMovie, Page, page_number},
};

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.movie_by_external_id(&id).await?))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewMovie>,
) -> AppResult<(StatusCode, Json<MovieDetail>)> {
    let movie = state.catalog.create_movie(new).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn create_director(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewDirector>,
) -> AppResult<(StatusCode, Json<DirectorDetail>)> {
    let director = state.catalog.create_director(new).await?;
    Ok((StatusCode::CREATED, Json(director)))
}

pub async fn movies_by_actor(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<MovieDetail>>> {
    Ok(Json(state.catalog.movies_by_actor(&name).await?))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

pub async fn movies_by_genre(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<Page<MovieDetail>>> {
    let page = page_number(q.page.as_deref());
    Ok(Json(state.catalog.movies_by_genre(&name, page).await?))
}

pub async fn movies_by_director(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<MovieDetail>>> {
    Ok(Json(state.catalog.movies_by_director(&name).await?))
}

pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    Path(n): Path<u64>,
) -> AppResult<Json<Vec<MovieDetail>>> {
    Ok(Json(state.catalog.top_rated(n).await?))
}

pub async fn best_roi(
    State(state): State<Arc<AppState>>,
    Path(n): Path<u64>,
) -> AppResult<Json<Vec<MovieDetail>>> {
    Ok(Json(state.catalog.best_roi(n).await?))
}
