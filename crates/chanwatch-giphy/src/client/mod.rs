//! HTTP client for the public GIPHY API.

mod listing;

use std::time::Duration;

use chanwatch_core::{ContentItem, ContentSource, SearchPage, SourceError, SourceSettings};
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::GiphyError;
use crate::normalize::normalize_gif;
use crate::rate_limit::retry_with_backoff;
use crate::types::{GiphyDetailResponse, GiphyGif, GiphyListResponse};

/// HTTP client for GIPHY's search, trending, and detail endpoints.
///
/// Built from an explicit [`SourceSettings`]; there is no process-wide key
/// or shared client. Transient failures (timeouts, 5xx, 429) are retried
/// with jittered exponential back-off up to `max_retries` extra attempts.
pub struct GiphyClient {
    client: Client,
    base_url: String,
    api_key: String,
    search_timeout: Duration,
    detail_timeout: Duration,
    listing_timeout: Duration,
    inter_request_delay: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GiphyClient {
    /// # Errors
    ///
    /// Returns [`GiphyError::Config`] if no API key is configured, or
    /// [`GiphyError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(settings: &SourceSettings) -> Result<Self, GiphyError> {
        let api_key = settings.require_api_key()?.to_owned();
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&settings.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            api_key,
            search_timeout: settings.search_timeout(),
            detail_timeout: settings.detail_timeout(),
            listing_timeout: settings.listing_timeout(),
            inter_request_delay: settings.inter_request_delay(),
            max_retries: settings.max_retries,
            backoff_base_ms: settings.retry_backoff_base_ms,
        })
    }

    /// Fetches one page of `/gifs/search` results.
    ///
    /// # Errors
    ///
    /// Any [`GiphyError`] left after retries are exhausted.
    pub async fn search_page(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<SearchPage, GiphyError> {
        let resp: GiphyListResponse = self
            .get_json(
                "gifs/search",
                &[
                    ("q", query.to_owned()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
                self.search_timeout,
            )
            .await?;

        let returned = i64::try_from(resp.data.len()).unwrap_or(i64::MAX);
        let total_count = resp
            .pagination
            .map_or(returned, |p| p.total_count.max(p.offset + p.count));
        Ok(SearchPage {
            items: resp.data.into_iter().map(normalize_gif).collect(),
            total_count,
        })
    }

    /// Fetches `/gifs/{id}`.
    ///
    /// # Errors
    ///
    /// [`GiphyError::NotFound`] on a 404 or an empty `data` payload.
    pub async fn gif_detail(&self, item_id: &str) -> Result<ContentItem, GiphyError> {
        let path = format!("gifs/{item_id}");
        let resp: GiphyDetailResponse = self.get_json(&path, &[], self.detail_timeout).await?;

        let empty = match &resp.data {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if empty {
            return Err(GiphyError::NotFound {
                url: self.display_url(&path),
            });
        }

        let gif: GiphyGif =
            serde_json::from_value(resp.data).map_err(|e| GiphyError::Deserialize {
                context: format!("detail for {item_id}"),
                source: e,
            })?;
        Ok(normalize_gif(gif))
    }

    /// Fetches the current `/gifs/trending` listing.
    ///
    /// # Errors
    ///
    /// Any [`GiphyError`] left after retries are exhausted.
    pub async fn trending_gifs(&self, limit: u32) -> Result<Vec<ContentItem>, GiphyError> {
        let resp: GiphyListResponse = self
            .get_json(
                "gifs/trending",
                &[("limit", limit.to_string())],
                self.search_timeout,
            )
            .await?;
        Ok(resp.data.into_iter().map(normalize_gif).collect())
    }

    /// URL used in errors and logs; never carries the API key.
    fn display_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request_url(&self, path: &str, params: &[(&str, String)]) -> Result<reqwest::Url, GiphyError> {
        let display = self.display_url(path);
        let mut url = reqwest::Url::parse(&display).map_err(|e| GiphyError::InvalidUrl {
            url: display.clone(),
            reason: e.to_string(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.api_key);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, GiphyError>
    where
        T: DeserializeOwned,
    {
        let url = self.request_url(path, params)?;
        let endpoint_url = self.display_url(path);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let endpoint_url = endpoint_url.clone();
            async move {
                tracing::debug!(endpoint = %endpoint_url, "GIPHY request");
                let response = self
                    .client
                    .get(url)
                    .timeout(timeout)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok());
                    return Err(GiphyError::RateLimited { retry_after_secs });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(GiphyError::NotFound { url: endpoint_url });
                }

                if !status.is_success() {
                    return Err(GiphyError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: endpoint_url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|e| GiphyError::Deserialize {
                    context: endpoint_url,
                    source: e,
                })
            }
        })
        .await
    }
}

impl ContentSource for GiphyClient {
    async fn list_channel_items(&self, channel_id: &str) -> Result<Vec<ContentItem>, SourceError> {
        self.list_channel_gifs(channel_id)
            .await
            .map_err(SourceError::from)
    }

    async fn get_item_detail(&self, item_id: &str) -> Result<ContentItem, SourceError> {
        self.gif_detail(item_id).await.map_err(SourceError::from)
    }

    async fn search(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<SearchPage, SourceError> {
        self.search_page(query, offset, limit)
            .await
            .map_err(SourceError::from)
    }

    async fn trending(&self, limit: u32) -> Result<Vec<ContentItem>, SourceError> {
        self.trending_gifs(limit).await.map_err(SourceError::from)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
