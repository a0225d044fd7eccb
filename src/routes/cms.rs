use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::cms::{get_page, get_posts, get_venues},
    utils::state::AppState,
};

pub fn cms_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pages/{slug}", get(get_page))
        .route("/venues", get(get_venues))
        .route("/posts", get(get_posts))
}
