use std::sync::Arc;

use crate::{
    models::{
        cache::CacheEntry,
        news::{NewsItem, NewsSource, RawArticle},
    },
    utils::state::AppState,
};
use axum::{extract::State, response::IntoResponse, Json};
use http::StatusCode;
use serde_json::{json, Value};
use tracing::{info, warn};

pub const NEWS_CACHE_KEY: &str = "latest";

/// Source name fragment → (category, emoji).
const SOURCE_CATEGORIES: &[(&str, &str, &str)] = &[
    ("formula1", "Official", "🏁"),
    ("fia", "Official", "🏁"),
    ("autosport", "Analysis", "🔧"),
    ("therace", "Analysis", "🔧"),
    ("motorsport", "Paddock", "🏎️"),
    ("planetf1", "Paddock", "🏎️"),
    ("skysports", "Broadcast", "📺"),
    ("bbc", "Headlines", "🗞️"),
    ("espn", "Headlines", "🗞️"),
];

const DEFAULT_CATEGORY: (&str, &str) = ("General", "📰");

const ARTICLE_LIST_FIELDS: &[&str] = &["articles", "data", "news"];

pub async fn get_news(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = state.clock.now();

    let cached = state.news_cache.get(NEWS_CACHE_KEY).and_then(|entry| {
        (!entry.is_expired(now)).then(|| entry.value.clone())
    });
    if let Some(articles) = cached {
        return news_response(NewsSource::Cache, articles);
    }

    match fetch_live_news(&state).await {
        Ok(articles) if !articles.is_empty() => {
            info!(count = articles.len(), "Fetched live news");
            state.news_cache.insert(
                NEWS_CACHE_KEY,
                CacheEntry::new(articles.clone(), state.config.news_cache_ttl_secs, now),
            );
            news_response(NewsSource::Live, articles)
        }
        Ok(_) => {
            warn!("News provider returned no usable articles");
            news_response(NewsSource::Mock, mock_news())
        }
        Err(e) => {
            warn!("News request failed: {}", e);
            news_response(NewsSource::Mock, mock_news())
        }
    }
}

fn news_response(source: NewsSource, articles: Vec<NewsItem>) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(json!({ "source": source, "articles": articles })),
    )
        .into_response()
}

async fn fetch_live_news(state: &AppState) -> Result<Vec<NewsItem>, String> {
    let _guard = state.limiter.acquire().await.map_err(|e| e.to_string())?;

    let mut request = state
        .http_client
        .get(&state.config.news_api_url)
        .header("User-Agent", "NashfyPitStop/1.0");
    if let Some(key) = &state.config.news_api_key {
        request = request.header("X-RapidAPI-Key", key);
    }
    if let Some(host) = &state.config.news_api_host {
        request = request.header("X-RapidAPI-Host", host);
    }

    let body: Value = request
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|e| e.to_string())?
        .json()
        .await
        .map_err(|e| e.to_string())?;
    Ok(parse_articles(&body))
}

pub fn parse_articles(body: &Value) -> Vec<NewsItem> {
    let list = body.as_array().or_else(|| {
        ARTICLE_LIST_FIELDS
            .iter()
            .find_map(|field| body.get(field).and_then(Value::as_array))
    });

    list.into_iter()
        .flatten()
        .filter_map(|raw| serde_json::from_value::<RawArticle>(raw.clone()).ok())
        .filter_map(|raw| {
            let title = raw.title.filter(|t| !t.trim().is_empty())?;
            let url = raw.url.filter(|u| !u.trim().is_empty())?;
            let source = raw.source.unwrap_or_else(|| "Unknown".to_string());
            Some(news_item(&title, &url, &source))
        })
        .collect()
}

pub fn categorize(source: &str) -> (&'static str, &'static str) {
    let key: String = source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    SOURCE_CATEGORIES
        .iter()
        .find(|(fragment, _, _)| key.contains(fragment))
        .map(|&(_, category, emoji)| (category, emoji))
        .unwrap_or(DEFAULT_CATEGORY)
}

fn news_item(title: &str, url: &str, source: &str) -> NewsItem {
    let (category, emoji) = categorize(source);
    NewsItem {
        title: title.to_string(),
        url: url.to_string(),
        source: source.to_string(),
        category: category.to_string(),
        emoji: emoji.to_string(),
    }
}

pub fn mock_news() -> Vec<NewsItem> {
    vec![
        news_item(
            "Watch party line-up confirmed for the next Grand Prix",
            "https://nashfypitstop.com/news/watch-party",
            "NashfyPitStop",
        ),
        news_item(
            "Paddock notes: upgrades to watch this weekend",
            "https://www.formula1.com/en/latest",
            "Formula1.com",
        ),
        news_item(
            "Safari Rally stars eye a return to the circuit",
            "https://www.autosport.com/",
            "Autosport",
        ),
    ]
}
