use dashmap::DashMap;
use reqwest::Client;

use crate::{
    models::{cache::CacheEntry, news::NewsItem},
    services::{cms::CmsClient, countdown::CountdownTicker, schedule::ScheduleAcquirer},
    utils::{clock::ArcClock, config::Config, rate_limiter::RateLimiter},
};

pub struct AppState {
    pub config: Config,
    pub http_client: Client,
    pub limiter: RateLimiter,
    pub clock: ArcClock,
    pub schedule: ScheduleAcquirer,
    pub ticker: CountdownTicker,
    pub cms: CmsClient,
    pub news_cache: DashMap<&'static str, CacheEntry<Vec<NewsItem>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        http_client: Client,
        limiter: RateLimiter,
        clock: ArcClock,
        schedule: ScheduleAcquirer,
        cms: CmsClient,
    ) -> Self {
        Self {
            ticker: CountdownTicker::new(clock.clone()),
            config,
            http_client,
            limiter,
            clock,
            schedule,
            cms,
            news_cache: DashMap::new(),
        }
    }
}
