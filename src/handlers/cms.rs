use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::{models::error::Error, utils::state::AppState};

const MAX_POSTS: u32 = 50;

#[derive(Deserialize)]
pub struct PostsQuery {
    limit: Option<u32>,
}

pub async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, Error> {
    let page = state
        .cms
        .page(&slug)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "Page not found"))?;
    Ok((StatusCode::OK, Json(json!({"data": page}))))
}

pub async fn get_venues(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, Error> {
    let venues = state.cms.venues().await?;
    Ok((StatusCode::OK, Json(json!({"data": venues}))))
}

pub async fn get_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostsQuery>,
) -> Result<impl IntoResponse, Error> {
    let limit = params.limit.unwrap_or(10).clamp(1, MAX_POSTS);
    let posts = state.cms.posts(limit).await?;
    Ok((StatusCode::OK, Json(json!({"data": posts}))))
}
