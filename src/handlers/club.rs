use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use http::StatusCode;
use serde_json::json;
use tracing::warn;
use validator::Validate;

use crate::{
    models::{
        club::{ClubMember, JoinOutcome},
        error::Error,
    },
    utils::state::AppState,
};

/// Submits a club sign-up. The response reflects what actually happened to
/// the write; a skipped or failed write is never reported as success.
pub async fn join_club(
    State(state): State<Arc<AppState>>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(payload): Json<ClubMember>,
) -> Result<impl IntoResponse, Error> {
    let member = payload.trimmed();
    member.validate()?;

    let token = bearer.as_ref().map(|TypedHeader(auth)| auth.token());
    let outcome = state
        .cms
        .create_club_member(&member, token, state.clock.now())
        .await;

    let response = match outcome {
        Ok(JoinOutcome::Created { id }) => (
            StatusCode::CREATED,
            Json(json!({"success": true, "message": "Welcome to the club!", "id": id})),
        ),
        Ok(JoinOutcome::Unconfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"success": false, "message": "Sign-ups are not available right now"})),
        ),
        Err(e) => {
            warn!("Club sign-up failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"success": false, "message": "Could not submit your sign-up"})),
            )
        }
    };
    Ok(response)
}
