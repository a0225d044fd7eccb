use std::sync::Arc;

use crate::{
    models::weather::{WeatherReport, WeatherSource},
    utils::state::AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use http::StatusCode;
use serde_json::Value;
use tracing::warn;

/// Nairobi.
const LATITUDE: f64 = -1.2921;
const LONGITUDE: f64 = 36.8219;

const FALLBACK_DISPLAY: &str = "Nairobi: 24°C, partly cloudy";

pub async fn get_weather(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = match fetch_temperature(&state).await {
        Ok(Some(temperature)) => WeatherReport {
            source: WeatherSource::Live,
            temperature_c: Some(temperature),
            display: format!("Nairobi: {temperature:.0}°C"),
        },
        Ok(None) => {
            warn!("Weather payload without current.temperature_2m");
            fallback_report()
        }
        Err(e) => {
            warn!("Weather request failed: {}", e);
            fallback_report()
        }
    };

    (StatusCode::OK, Json(report)).into_response()
}

async fn fetch_temperature(state: &AppState) -> Result<Option<f64>, String> {
    let _guard = state.limiter.acquire().await.map_err(|e| e.to_string())?;
    let res: Value = state
        .http_client
        .get(&state.config.weather_url)
        .query(&[
            ("latitude", LATITUDE.to_string()),
            ("longitude", LONGITUDE.to_string()),
            ("current", "temperature_2m".to_string()),
        ])
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|e| e.to_string())?
        .json()
        .await
        .map_err(|e| e.to_string())?;
    Ok(current_temperature(&res))
}

pub fn current_temperature(body: &Value) -> Option<f64> {
    body.pointer("/current/temperature_2m").and_then(Value::as_f64)
}

fn fallback_report() -> WeatherReport {
    WeatherReport {
        source: WeatherSource::Fallback,
        temperature_c: None,
        display: FALLBACK_DISPLAY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_current_temperature() {
        let body = json!({"current": {"time": "2025-03-01T09:00", "temperature_2m": 23.4}});
        assert_eq!(current_temperature(&body), Some(23.4));
        assert_eq!(current_temperature(&json!({"current": {}})), None);
        assert_eq!(current_temperature(&json!({"error": true})), None);
    }

    #[test]
    fn fallback_carries_no_temperature() {
        let value = serde_json::to_value(fallback_report()).unwrap();
        assert_eq!(value["source"], "fallback");
        assert!(value.get("temperature_c").is_none());
    }
}
