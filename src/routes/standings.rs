use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::standings::{constructor_standings, driver_standings},
    utils::state::AppState,
};

pub fn standings_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver-standings", get(driver_standings))
        .route("/constructor-standings", get(constructor_standings))
}
