use crate::retry::{RetryConfig, RetryExecutor};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use trends_core::config::HnConfig;
use trends_core::{CoreError, HnApiError};
use url::Url;

/// Search endpoint response. Only the fields the classifier reads are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchIndex {
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl SearchHit {
    /// Algolia reports ids as strings; anything non-numeric is not an HN item.
    pub fn post_id(&self) -> Option<u64> {
        self.object_id.parse().ok()
    }
}

/// Item endpoint response, as stored in the post cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    pub created_at_i: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub children: Vec<RawChild>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawChild {
    /// HTML body; null for deleted or dead comments.
    #[serde(default)]
    pub text: Option<String>,
}

/// Where thread data comes from. `fetch_item` returns the response body
/// verbatim so callers can persist exactly what the API sent.
#[async_trait]
pub trait HnSource: Send + Sync {
    async fn search_index(&self) -> Result<SearchIndex, CoreError>;

    async fn fetch_item(&self, post_id: u64) -> Result<String, CoreError>;
}

#[derive(Debug)]
pub struct HnApiClient {
    http_client: Client,
    search_url: Url,
    item_url: String,
    retry: RetryExecutor,
}

impl HnApiClient {
    pub fn new(config: &HnConfig, retry_config: RetryConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let search_url = Url::parse(&config.search_url).map_err(|e| CoreError::InvalidInput {
            message: format!("invalid search url {}: {}", config.search_url, e),
        })?;

        Ok(Self {
            http_client,
            search_url,
            item_url: config.item_url.clone(),
            retry: RetryExecutor::new(retry_config),
        })
    }

    pub fn item_url(&self, post_id: u64) -> Result<Url, CoreError> {
        let raw = format!("{}{}", self.item_url, post_id);
        Url::parse(&raw).map_err(|e| CoreError::InvalidInput {
            message: format!("invalid item url {}: {}", raw, e),
        })
    }

    /// One GET, mapped onto the error taxonomy. No retries here.
    async fn get_text(&self, url: &Url, post_id: Option<u64>) -> Result<String, CoreError> {
        debug!("GET {}", url);
        let response = match self.http_client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {}: {}", url, e);
                if e.is_timeout() {
                    return Err(CoreError::HnApi(HnApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let Some(api_error) =
            status_error(response.status(), retry_after.as_deref(), url.path(), post_id)
        {
            error!("Request failed with status {} for {}", response.status(), url);
            return Err(CoreError::HnApi(api_error));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                CoreError::HnApi(HnApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })
    }
}

/// Maps a non-success status to the matching API error.
pub(crate) fn status_error(
    status: StatusCode,
    retry_after: Option<&str>,
    endpoint: &str,
    post_id: Option<u64>,
) -> Option<HnApiError> {
    if status.is_success() {
        return None;
    }

    let api_error = match (status, post_id) {
        (StatusCode::TOO_MANY_REQUESTS, _) => HnApiError::RateLimitExceeded {
            retry_after: retry_after
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(60),
        },
        (StatusCode::NOT_FOUND, Some(post_id)) => HnApiError::ItemNotFound { post_id },
        (status, _) if status.is_server_error() => HnApiError::ServerError {
            status_code: status.as_u16(),
        },
        (status, _) => HnApiError::UnexpectedStatus {
            status_code: status.as_u16(),
            endpoint: endpoint.to_string(),
        },
    };
    Some(api_error)
}

#[async_trait]
impl HnSource for HnApiClient {
    async fn search_index(&self) -> Result<SearchIndex, CoreError> {
        let body = self
            .retry
            .execute("search_index", || self.get_text(&self.search_url, None))
            .await?;

        let index: SearchIndex = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse search index: {}", e);
            CoreError::HnApi(HnApiError::InvalidResponse {
                details: format!("search index: {}", e),
            })
        })?;

        info!("Retrieved {} candidate threads", index.hits.len());
        Ok(index)
    }

    async fn fetch_item(&self, post_id: u64) -> Result<String, CoreError> {
        let url = self.item_url(post_id)?;
        let operation_name = format!("fetch_item {}", post_id);
        self.retry
            .execute(&operation_name, || self.get_text(&url, Some(post_id)))
            .await
    }
}
