use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    models::{
        error::Error,
        race::{Countdown, CountdownParts, RaceView},
    },
    services::countdown::CountdownTarget,
    utils::{race_utils::select_countdown, state::AppState},
};

#[derive(Deserialize)]
pub struct SeasonQuery {
    year: Option<i32>,
}

#[derive(Deserialize)]
pub struct ResultsQuery {
    year: Option<i32>,
    round: Option<u32>,
    #[serde(default)]
    latest: bool,
}

fn year_or_current(year: Option<i32>, state: &AppState) -> i32 {
    year.unwrap_or_else(|| state.clock.now().year())
}

pub async fn get_race_schedule(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeasonQuery>,
) -> impl IntoResponse {
    let year = year_or_current(params.year, &state);
    let schedule = state.schedule.acquire(year).await;
    let now = state.clock.now();

    let races: Vec<RaceView> = schedule.events.iter().map(|e| e.view_at(now)).collect();
    let count = races.len();
    let mut body = json!({
        "success": true,
        "year": year,
        "count": count,
        "races": races,
        "source": schedule.source,
    });
    if count == 0 {
        body["message"] = json!("No races found");
    }
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_next_race(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeasonQuery>,
) -> impl IntoResponse {
    let year = year_or_current(params.year, &state);
    let schedule = state.schedule.acquire(year).await;
    let now = state.clock.now();
    let countdown = select_countdown(&schedule.events, now);

    if year == now.year() {
        let target = match &countdown {
            Countdown::Next { event, .. } => CountdownTarget::Race(event.clone()),
            Countdown::SeasonEnded => CountdownTarget::SeasonEnded,
        };
        if state.ticker.retarget(target).await {
            info!(year, "Countdown target changed");
        }
    }

    let body = match countdown {
        Countdown::Next { event, remaining } => json!({
            "success": true,
            "season_ended": false,
            "race": event.view_at(now),
            "remaining_seconds": remaining.num_seconds(),
            "remaining": CountdownParts::from(remaining),
            "source": schedule.source,
        }),
        Countdown::SeasonEnded => {
            let mut body = json!({
                "success": true,
                "season_ended": true,
                "race": Value::Null,
                "source": schedule.source,
            });
            let next_season = state.schedule.acquire(year.saturating_add(1)).await;
            if let Countdown::Next { event, .. } = select_countdown(&next_season.events, now) {
                body["next_season_race"] = json!(event.view_at(now));
                body["message"] = json!("Next race is in next season");
            }
            body
        }
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn get_countdown(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.ticker.latest())).into_response()
}

/// Ergast path for a round's results; without a round, or when `latest` is
/// asked for, the last completed race.
fn results_path(year: i32, round: Option<u32>, latest: bool) -> String {
    match round {
        Some(round) if !latest => format!("{year}/{round}/results"),
        _ => format!("{year}/last/results"),
    }
}

pub async fn get_race_results(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResultsQuery>,
) -> Result<impl IntoResponse, Error> {
    let year = year_or_current(params.year, &state);
    let _guard = state
        .limiter
        .acquire()
        .await
        .map_err(|e| Error::new(StatusCode::SERVICE_UNAVAILABLE, &e.to_string()))?;

    let res: Value = state
        .http_client
        .get(format!(
            "{}/{}/?format=json",
            state.config.ergast_url,
            results_path(year, params.round, params.latest)
        ))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let race = res
        .pointer("/MRData/RaceTable/Races/0")
        .cloned()
        .ok_or((StatusCode::NOT_FOUND, "No results found"))?;
    Ok((StatusCode::OK, Json(json!({"success": true, "year": year, "results": race}))))
}
