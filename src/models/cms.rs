use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub body: Value,
}

/// A watch-party venue listed on the site.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Venue {
    pub name: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Post {
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(
        rename = "publishedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,
}

/// Envelope of the CMS query endpoint.
#[derive(Debug, Deserialize)]
pub struct QueryResponse<T> {
    pub result: T,
}
