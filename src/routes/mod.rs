use axum::{response::IntoResponse, routing::get, Json, Router};
use chrono::Datelike;
use http::StatusCode;
use serde_json::json;
use std::{error::Error, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

pub mod club;
pub mod cms;
pub mod race;
pub mod standings;

use crate::{
    handlers::{news::get_news, weather::get_weather},
    models::race::Countdown,
    routes::{
        club::{club_routes, quiz_routes},
        cms::cms_routes,
        race::race_routes,
        standings::standings_routes,
    },
    services::{
        cms::CmsClient,
        countdown::CountdownTarget,
        schedule::{schedule_client, ScheduleAcquirer},
    },
    utils::{
        clock::{ArcClock, SystemClock},
        config::Config,
        race_utils::select_countdown,
        rate_limiter::RateLimiter,
        state::AppState,
    },
};

pub fn init_tracing(log_level: &str) {
    let level = match log_level {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let filter = filter::Targets::new()
        .with_target("tower_http::trace::on_response", Level::TRACE)
        .with_target("tower_http::trace::on_request", Level::TRACE)
        .with_target("tower_http::trace::make_span", Level::DEBUG)
        .with_target("axum::rejection", Level::TRACE)
        .with_target(env!("CARGO_PKG_NAME"), level)
        .with_default(Level::INFO);

    let tracing_layer = tracing_subscriber::fmt::layer();

    Registry::default().with(tracing_layer).with(filter).init();
}

pub async fn make_app(config: Config) -> Result<(Router, Arc<AppState>), Box<dyn Error>> {
    info!("Initializing application...");

    let http_client = schedule_client(config.http_timeout_secs)?;
    let limiter = RateLimiter::new(4, 100);
    let clock: ArcClock = Arc::new(SystemClock);
    info!("External clients initialized successfully");

    let schedule =
        ScheduleAcquirer::from_config(&config, http_client.clone(), limiter.clone(), clock.clone());
    let cms = CmsClient::from_config(&config, http_client.clone());
    if config.cms_token.is_none() {
        info!("CMS_TOKEN not set, club sign-ups will be refused");
    }

    let state = Arc::new(AppState::new(
        config,
        http_client,
        limiter,
        clock,
        schedule,
        cms,
    ));

    tokio::spawn(prime_countdown(state.clone()));

    let app = app_router(state.clone());
    info!("Application initialized successfully");

    Ok((app, state))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .nest("/api", race_routes().merge(standings_routes()))
        .nest("/club", club_routes())
        .nest("/quiz", quiz_routes())
        .nest("/cms", cms_routes())
        .route("/get_weather", get(get_weather))
        .route("/get_news", get(get_news))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the countdown for the current season without waiting for a
/// visitor to ask for the next race.
async fn prime_countdown(state: Arc<AppState>) {
    let now = state.clock.now();
    let schedule = state.schedule.acquire(now.year()).await;
    let target = match select_countdown(&schedule.events, now) {
        Countdown::Next { event, .. } => CountdownTarget::Race(event),
        Countdown::SeasonEnded => CountdownTarget::SeasonEnded,
    };
    state.ticker.restart(target).await;
    info!(source = ?schedule.source, "Countdown primed");
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "message": "NashfyPitStop API is running"})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use axum::body::Body;
    use chrono::{DateTime, TimeZone, Utc};
    use http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        services::schedule::{ArcScheduleTier, BundledFile},
        utils::clock::FixedClock,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 20, 12, 0, 0).unwrap()
    }

    /// State whose CMS and schedule sources point at nothing reachable.
    fn test_state(cms_token: Option<&str>, tiers: Vec<ArcScheduleTier>) -> Arc<AppState> {
        let config = Config::from_lookup(|_| None).unwrap();
        let client = schedule_client(2).unwrap();
        let clock: ArcClock = Arc::new(FixedClock(now()));
        let cms = CmsClient::new(
            client.clone(),
            "http://127.0.0.1:1",
            "test",
            cms_token.map(str::to_string),
        );
        Arc::new(AppState::new(
            config,
            client,
            RateLimiter::new(4, 0),
            clock.clone(),
            ScheduleAcquirer::new(tiers, clock, 300),
            cms,
        ))
    }

    async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_join(app: Router, member: Value, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/club/join")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app
            .oneshot(request.body(Body::from(member.to_string())).unwrap())
            .await
            .unwrap();
        read_json(response).await
    }

    fn member() -> Value {
        json!({"name": "Achieng Otieno", "email": "achieng@example.com", "city": "Nairobi"})
    }

    #[tokio::test]
    async fn join_without_cms_credential_is_refused() {
        let app = app_router(test_state(None, vec![]));
        let (status, body) = post_join(app, member(), None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn join_reports_a_failed_cms_write() {
        let app = app_router(test_state(Some("server-token"), vec![]));
        let (status, body) = post_join(app, member(), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);

        // a request credential is used even when none is configured
        let app = app_router(test_state(None, vec![]));
        let (status, body) = post_join(app, member(), Some("visitor-token")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn join_rejects_invalid_email() {
        let mut bad = member();
        bad["email"] = json!("not-an-email");
        let app = app_router(test_state(Some("server-token"), vec![]));
        let (status, body) = post_join(app, bad, None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_ne!(body["success"], true);
    }

    #[tokio::test]
    async fn next_race_after_season_end_looks_ahead() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({"races": [
                {"round": 24, "raceName": "Abu Dhabi Grand Prix", "country": "UAE", "date": "2025-12-07", "time": "13:00:00Z"},
                {"round": 1, "raceName": "Australian Grand Prix", "country": "Australia", "date": "2026-03-08", "time": "04:00:00Z"}
            ]})
        )
        .unwrap();
        let tiers: Vec<ArcScheduleTier> = vec![Arc::new(BundledFile::new(file.path()))];
        let app = app_router(test_state(None, tiers));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/next-race?year=2025")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["season_ended"], true);
        assert!(body["race"].is_null());
        assert_eq!(body["next_season_race"]["raceName"], "Australian Grand Prix");
        assert_eq!(body["next_season_race"]["status"], "upcoming");
        assert_eq!(body["message"], "Next race is in next season");
    }

    #[tokio::test]
    async fn health_check_answers() {
        let app = app_router(test_state(None, vec![]));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
