use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{
        club::join_club,
        quiz::{get_quiz, score_quiz},
    },
    utils::state::AppState,
};

pub fn club_routes() -> Router<Arc<AppState>> {
    Router::new().route("/join", post(join_club))
}

pub fn quiz_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_quiz))
        .route("/score", post(score_quiz))
}
