//! HTTP gateway for JSONPlaceholder-style post APIs.
//!
//! Posts map to quotes: the title (or the body when the title is blank) is the
//! quote text and the author id becomes a category.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayResult, RemoteGateway, RemoteItem};
use crate::config::SyncSettings;
use crate::models::RemoteId;
use crate::util::{compact_text, is_http_url, normalize_text_option};

const DEFAULT_AUTHOR_ID: i64 = 1;

#[derive(Clone)]
pub struct HttpRemoteGateway {
    base_url: String,
    fetch_limit: usize,
    category_prefix: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemoteGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRemoteGateway")
            .field("base_url", &self.base_url)
            .field("fetch_limit", &self.fetch_limit)
            .field("category_prefix", &self.category_prefix)
            .finish_non_exhaustive()
    }
}

impl HttpRemoteGateway {
    pub fn new(settings: &SyncSettings) -> GatewayResult<Self> {
        let base_url = normalize_base_url(settings.remote_base_url.clone())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            base_url,
            fetch_limit: settings.fetch_limit.max(1),
            category_prefix: settings.category_prefix.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }
}

#[async_trait]
impl RemoteGateway for HttpRemoteGateway {
    async fn fetch_all(&self) -> GatewayResult<Vec<RemoteItem>> {
        let response = self
            .client
            .get(self.posts_url())
            .query(&[("_limit", self.fetch_limit)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(parse_api_error(status, &body)));
        }

        let posts = response.json::<Vec<RemotePost>>().await?;
        tracing::debug!("Fetched {} remote posts", posts.len());
        Ok(posts
            .into_iter()
            .map(|post| post.into_item(&self.category_prefix))
            .collect())
    }

    async fn push_one(&self, text: &str, category: &str) -> GatewayResult<RemoteId> {
        let response = self
            .client
            .post(self.posts_url())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&NewPost {
                title: text,
                body: category,
                user_id: DEFAULT_AUTHOR_ID,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(parse_api_error(status, &body)));
        }

        let created = response.json::<CreatedPost>().await?;
        created.try_into()
    }
}

#[derive(Debug, Deserialize)]
struct RemotePost {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<i64>,
}

impl RemotePost {
    fn into_item(self, category_prefix: &str) -> RemoteItem {
        let text = normalize_text_option(self.title)
            .or_else(|| normalize_text_option(self.body))
            .unwrap_or_default();
        let author = self.user_id.unwrap_or(DEFAULT_AUTHOR_ID);
        RemoteItem::new(self.id, text, format!("{category_prefix}{author}"))
    }
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(rename = "userId")]
    user_id: i64,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: Option<serde_json::Value>,
}

impl TryFrom<CreatedPost> for RemoteId {
    type Error = GatewayError;

    fn try_from(value: CreatedPost) -> GatewayResult<Self> {
        match value.id {
            Some(serde_json::Value::Number(number)) => Ok(Self::new(number.to_string())),
            Some(serde_json::Value::String(id)) => normalize_text_option(Some(id))
                .map(Self::new)
                .ok_or_else(|| GatewayError::InvalidPayload("response id was empty".to_string())),
            _ => Err(GatewayError::InvalidPayload(
                "response did not include an id".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> GatewayResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        GatewayError::InvalidConfiguration("remote base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(GatewayError::InvalidConfiguration(
            "remote base URL must include http:// or https://".to_string(),
        ))
    }
}
