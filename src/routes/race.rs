use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::race::{get_countdown, get_next_race, get_race_results, get_race_schedule},
    utils::state::AppState,
};

pub fn race_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/race-schedule", get(get_race_schedule))
        .route("/next-race", get(get_next_race))
        .route("/countdown", get(get_countdown))
        .route("/race-results", get(get_race_results))
}
