//! Season schedule acquisition across a fixed chain of sources.
//!
//! Sources are tried strictly in order: the structured backend, the
//! third-party schedule API, the bundled static file, and finally a
//! built-in list. The first source that answers wins; every failure is
//! logged and demoted to "try the next one", so acquisition never fails.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    models::{
        cache::CacheEntry,
        error::SourceError,
        race::{RaceEvent, ScheduleSource},
    },
    utils::{
        clock::ArcClock,
        config::Config,
        race_utils::{filter_by_year, has_plausible_names, normalize_events, probe_event_list},
        rate_limiter::RateLimiter,
    },
};

pub type ArcScheduleTier = Arc<dyn ScheduleTier + Send + Sync>;

#[async_trait]
pub trait ScheduleTier {
    fn source(&self) -> ScheduleSource;

    /// Raw race payloads for the season. Any error moves acquisition on to
    /// the next tier.
    async fn fetch(&self, year: i32) -> Result<Vec<Value>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct Schedule {
    pub events: Vec<RaceEvent>,
    pub source: ScheduleSource,
}

pub struct PrimaryBackend {
    client: Client,
    base_url: String,
}

impl PrimaryBackend {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ScheduleTier for PrimaryBackend {
    fn source(&self) -> ScheduleSource {
        ScheduleSource::Primary
    }

    async fn fetch(&self, year: i32) -> Result<Vec<Value>, SourceError> {
        let body: Value = self
            .client
            .get(format!(
                "{}/api/race-schedule",
                self.base_url.trim_end_matches('/')
            ))
            .query(&[("year", year.to_string()), ("include_sessions", "false".to_string())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_primary_body(&body)
    }
}

/// Accepts `{success: true, races: [...]}` with at least one race.
pub fn parse_primary_body(body: &Value) -> Result<Vec<Value>, SourceError> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(SourceError::Shape("success flag not set".to_string()));
    }
    let races = body
        .get("races")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Shape("missing races list".to_string()))?;
    if races.is_empty() {
        return Err(SourceError::Shape("empty races list".to_string()));
    }
    Ok(races.clone())
}

pub struct SecondaryApi {
    client: Client,
    url: String,
    api_key: Option<String>,
    api_host: Option<String>,
    limiter: RateLimiter,
}

impl SecondaryApi {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        api_key: Option<String>,
        api_host: Option<String>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
            api_host,
            limiter,
        }
    }
}

#[async_trait]
impl ScheduleTier for SecondaryApi {
    fn source(&self) -> ScheduleSource {
        ScheduleSource::Secondary
    }

    async fn fetch(&self, year: i32) -> Result<Vec<Value>, SourceError> {
        let _guard = self
            .limiter
            .acquire()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        let mut request = self
            .client
            .get(&self.url)
            .query(&[("season", year.to_string())]);
        if let Some(key) = &self.api_key {
            request = request.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.api_host {
            request = request.header("X-RapidAPI-Host", host);
        }

        let body: Value = request.send().await?.error_for_status()?.json().await?;
        extract_secondary_races(&body)
    }
}

/// Probes the known payload shapes and rejects lists without a single real
/// race name.
pub fn extract_secondary_races(body: &Value) -> Result<Vec<Value>, SourceError> {
    let races = probe_event_list(body)
        .ok_or_else(|| SourceError::Shape("no race list in payload".to_string()))?;
    if !has_plausible_names(&races) {
        return Err(SourceError::Plausibility(
            "no race carries a usable name".to_string(),
        ));
    }
    Ok(races)
}

pub struct BundledFile {
    path: PathBuf,
}

impl BundledFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
struct BundledSchedule {
    races: Vec<Value>,
}

#[async_trait]
impl ScheduleTier for BundledFile {
    fn source(&self) -> ScheduleSource {
        ScheduleSource::Tertiary
    }

    async fn fetch(&self, _year: i32) -> Result<Vec<Value>, SourceError> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        parse_bundled_body(&body)
    }
}

pub fn parse_bundled_body(body: &str) -> Result<Vec<Value>, SourceError> {
    let schedule: BundledSchedule = serde_json::from_str(body)?;
    if schedule.races.is_empty() {
        return Err(SourceError::Shape("bundled schedule is empty".to_string()));
    }
    Ok(schedule.races)
}

fn fallback_event(round: u32, name: &str, country: &str, locality: &str, start: DateTime<Utc>) -> RaceEvent {
    RaceEvent {
        round,
        name: name.to_string(),
        country: country.to_string(),
        locality: Some(locality.to_string()),
        start,
    }
}

/// Placeholder races served when every source is unavailable.
pub fn fallback_events() -> Vec<RaceEvent> {
    [
        (1, "Australian Grand Prix", "Australia", "Melbourne", (2025, 3, 16, 4)),
        (2, "Chinese Grand Prix", "China", "Shanghai", (2025, 3, 23, 7)),
        (3, "Japanese Grand Prix", "Japan", "Suzuka", (2025, 4, 6, 5)),
    ]
    .into_iter()
    .filter_map(|(round, name, country, locality, (y, m, d, h))| {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
            .single()
            .map(|start| fallback_event(round, name, country, locality, start))
    })
    .collect()
}

pub struct ScheduleAcquirer {
    tiers: Vec<ArcScheduleTier>,
    clock: ArcClock,
    /// Last schedule fetched, keyed by the year it was fetched for.
    cache: Mutex<Option<(i32, CacheEntry<Schedule>)>>,
    cache_ttl_secs: i64,
}

impl ScheduleAcquirer {
    /// `tiers` are consulted in the order given.
    pub fn new(tiers: Vec<ArcScheduleTier>, clock: ArcClock, cache_ttl_secs: i64) -> Self {
        Self {
            tiers,
            clock,
            cache: Mutex::new(None),
            cache_ttl_secs,
        }
    }

    pub fn from_config(
        config: &Config,
        client: Client,
        limiter: RateLimiter,
        clock: ArcClock,
    ) -> Self {
        let tiers: Vec<ArcScheduleTier> = vec![
            Arc::new(PrimaryBackend::new(
                client.clone(),
                config.primary_schedule_url.clone(),
            )),
            Arc::new(SecondaryApi::new(
                client,
                config.secondary_schedule_url.clone(),
                config.secondary_api_key.clone(),
                config.secondary_api_host.clone(),
                limiter,
            )),
            Arc::new(BundledFile::new(config.tertiary_schedule_path.clone())),
        ];
        Self::new(tiers, clock, config.schedule_cache_ttl_secs)
    }

    #[instrument(skip(self))]
    pub async fn acquire(&self, year: i32) -> Schedule {
        let now = self.clock.now();
        let cached = self
            .cache
            .lock()
            .await
            .as_ref()
            .filter(|(cached_year, entry)| *cached_year == year && !entry.is_expired(now))
            .map(|(_, entry)| entry.value.clone());
        if let Some(schedule) = cached {
            debug!(year, source = ?schedule.source, "Serving cached schedule");
            return schedule;
        }

        let schedule = self.acquire_uncached(year, now).await;
        if schedule.source != ScheduleSource::Fallback {
            *self.cache.lock().await = Some((
                year,
                CacheEntry::new(schedule.clone(), self.cache_ttl_secs, now),
            ));
        }
        schedule
    }

    async fn acquire_uncached(&self, year: i32, now: DateTime<Utc>) -> Schedule {
        for tier in &self.tiers {
            let source = tier.source();
            match tier.fetch(year).await {
                Ok(raw) => {
                    let raw = if source.needs_year_filter() {
                        filter_by_year(raw, year, now.year())
                    } else {
                        raw
                    };
                    let events = normalize_events(&raw);
                    info!(year, ?source, count = events.len(), "Schedule acquired");
                    return Schedule { events, source };
                }
                Err(err) => warn!(year, ?source, "Schedule source failed: {}", err),
            }
        }

        warn!(year, "All schedule sources failed, serving built-in races");
        Schedule {
            events: fallback_events(),
            source: ScheduleSource::Fallback,
        }
    }
}

/// Client used by the network tiers; a short timeout keeps a dead source
/// from holding up the chain.
pub fn schedule_client(timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent("NashfyPitStop/1.0")
        .build()
}
