use std::{collections::HashMap, sync::Arc};

use crate::{models::error::Error, utils::state::AppState};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use http::StatusCode;
use serde_json::{json, Value};
use tracing::warn;

#[derive(Clone, Copy)]
enum StandingsKind {
    Driver,
    Constructor,
}

impl StandingsKind {
    fn path(self) -> &'static str {
        match self {
            StandingsKind::Driver => "driverstandings",
            StandingsKind::Constructor => "constructorstandings",
        }
    }

    fn list_field(self) -> &'static str {
        match self {
            StandingsKind::Driver => "DriverStandings",
            StandingsKind::Constructor => "ConstructorStandings",
        }
    }
}

pub async fn driver_standings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, Error> {
    standings(&state, &params, StandingsKind::Driver).await
}

pub async fn constructor_standings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, Error> {
    standings(&state, &params, StandingsKind::Constructor).await
}

async fn standings(
    state: &AppState,
    params: &HashMap<String, String>,
    kind: StandingsKind,
) -> Result<impl IntoResponse, Error> {
    let year = params
        .get("year")
        .and_then(|y| y.parse::<i32>().ok())
        .unwrap_or_else(|| state.clock.now().year());
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<u32>().ok())
        .unwrap_or(30);
    let after_round = params
        .get("after_round")
        .and_then(|r| r.parse::<u32>().ok())
        .filter(|&r| r > 0);

    let _guard = state
        .limiter
        .acquire()
        .await
        .map_err(|e| Error::new(StatusCode::SERVICE_UNAVAILABLE, &e.to_string()))?;
    let res = state
        .http_client
        .get(format!(
            "{}/{}/?format=json&limit={limit}",
            state.config.ergast_url,
            standings_path(year, after_round, kind)
        ))
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|e| {
            warn!("{:?}", e);
            Error::new(StatusCode::BAD_GATEWAY, "No data found")
        })?;

    let body: Value = res.json().await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "year": year,
            "after_round": after_round,
            "standings": standings_list(&body, kind.list_field()),
        })),
    ))
}

fn standings_path(year: i32, after_round: Option<u32>, kind: StandingsKind) -> String {
    match after_round {
        Some(round) => format!("{year}/{round}/{}", kind.path()),
        None => format!("{year}/{}", kind.path()),
    }
}

/// First standings list of an Ergast payload, or an empty list.
fn standings_list(body: &Value, field: &str) -> Value {
    body.pointer("/MRData/StandingsTable/StandingsLists/0")
        .and_then(|list| list.get(field))
        .cloned()
        .unwrap_or_else(|| json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_standings_list() {
        let body = json!({"MRData": {"StandingsTable": {"StandingsLists": [
            {"DriverStandings": [{"position": "1", "Driver": {"code": "NOR"}}]}
        ]}}});
        let list = standings_list(&body, StandingsKind::Driver.list_field());
        assert_eq!(list[0]["Driver"]["code"], "NOR");
    }

    #[test]
    fn standings_after_a_round_use_the_round_path() {
        assert_eq!(
            standings_path(2024, Some(10), StandingsKind::Driver),
            "2024/10/driverstandings"
        );
        assert_eq!(
            standings_path(2024, None, StandingsKind::Constructor),
            "2024/constructorstandings"
        );
    }

    #[test]
    fn empty_season_yields_empty_list() {
        let body = json!({"MRData": {"StandingsTable": {"StandingsLists": []}}});
        assert_eq!(standings_list(&body, "ConstructorStandings"), json!([]));
    }
}
