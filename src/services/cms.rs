//! Client for the headless CMS that backs site pages, venues, posts and
//! club sign-ups.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    models::{
        club::{ClubMember, JoinOutcome},
        cms::{Page, Post, QueryResponse, Venue},
        error::SourceError,
    },
    utils::config::Config,
};

const PAGE_QUERY: &str =
    r#"*[_type == "page" && slug.current == $slug][0]{title, "slug": slug.current, body}"#;
const VENUES_QUERY: &str =
    r#"*[_type == "venue"] | order(city asc, name asc){name, city, address, screens}"#;
const POSTS_QUERY: &str = r#"*[_type == "post"] | order(publishedAt desc)[0...$limit]{title, "slug": slug.current, excerpt, publishedAt}"#;

#[derive(Clone)]
pub struct CmsClient {
    client: Client,
    base_url: String,
    dataset: String,
    token: Option<String>,
}

impl CmsClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        dataset: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            dataset: dataset.into(),
            token,
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(
            client,
            format!(
                "https://{}.api.sanity.io/{}",
                config.cms_project_id, config.cms_api_version
            ),
            config.cms_dataset.clone(),
            config.cms_token.clone(),
        )
    }

    fn query_url(&self) -> String {
        format!("{}/data/query/{}", self.base_url, self.dataset)
    }

    fn mutate_url(&self) -> String {
        format!("{}/data/mutate/{}", self.base_url, self.dataset)
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, Value)],
    ) -> Result<T, SourceError> {
        let mut pairs = vec![("query".to_string(), query.to_string())];
        // query parameters are passed JSON-encoded as `$name`
        pairs.extend(
            params
                .iter()
                .map(|(name, value)| (format!("${name}"), value.to_string())),
        );

        let response: QueryResponse<T> = self
            .client
            .get(self.query_url())
            .query(&pairs)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.result)
    }

    pub async fn page(&self, slug: &str) -> Result<Option<Page>, SourceError> {
        self.query(PAGE_QUERY, &[("slug", json!(slug))]).await
    }

    pub async fn venues(&self) -> Result<Vec<Venue>, SourceError> {
        self.query(VENUES_QUERY, &[]).await
    }

    pub async fn posts(&self, limit: u32) -> Result<Vec<Post>, SourceError> {
        self.query(POSTS_QUERY, &[("limit", json!(limit))]).await
    }

    /// Writes a pending club membership. Without a credential nothing is
    /// sent and `JoinOutcome::Unconfigured` is returned.
    pub async fn create_club_member(
        &self,
        member: &ClubMember,
        token_override: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, SourceError> {
        let Some(token) = token_override.or(self.token.as_deref()) else {
            warn!("CMS write credential missing, club sign-up not submitted");
            return Ok(JoinOutcome::Unconfigured);
        };

        let body: Value = self
            .client
            .post(self.mutate_url())
            .bearer_auth(token)
            .query(&[("returnIds", "true")])
            .json(&membership_mutation(member, now))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let id = created_document_id(&body)
            .ok_or_else(|| SourceError::Shape("mutation response without id".to_string()))?;
        info!(%id, "Club member submitted");
        Ok(JoinOutcome::Created { id })
    }
}

pub fn membership_mutation(member: &ClubMember, now: DateTime<Utc>) -> Value {
    json!({
        "mutations": [{
            "create": {
                "_type": "clubMember",
                "name": member.name,
                "email": member.email,
                "city": member.city,
                "submittedAt": now.to_rfc3339(),
                "status": "pending"
            }
        }]
    })
}

pub fn created_document_id(body: &Value) -> Option<String> {
    body.pointer("/results/0/id")
        .and_then(Value::as_str)
        .map(str::to_string)
}
