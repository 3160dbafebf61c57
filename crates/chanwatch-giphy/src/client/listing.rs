//! Channel listing with tiered fall-through.
//!
//! Tier 1 asks the search endpoint for uploads filtered by `username`, first
//! as given and then capitalized. Tier 2 searches for the channel name and
//! keeps results whose owner matches. Only an empty or not-found answer from
//! every tier means the channel has nothing; if any tier failed for another
//! reason, that failure is returned instead.

use std::collections::HashSet;

use chanwatch_core::tuning::FUZZY_LENGTH_TOLERANCE;
use chanwatch_core::{match_owner, ContentItem};

use super::GiphyClient;
use crate::error::GiphyError;
use crate::normalize::{normalize_gif, owner_of};
use crate::types::GiphyListResponse;

pub(super) const LISTING_PAGE_SIZE: u32 = 50;
pub(super) const LISTING_MAX_PAGES: u32 = 20;

impl GiphyClient {
    /// Lists every upload attributed to `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns the last non-`NotFound` failure when no tier produced items
    /// and at least one tier failed.
    pub async fn list_channel_gifs(&self, channel_id: &str) -> Result<Vec<ContentItem>, GiphyError> {
        let mut last_failure: Option<GiphyError> = None;

        for username in username_variants(channel_id) {
            match self.username_listing(&username, channel_id).await {
                Ok(items) if !items.is_empty() => return Ok(items),
                Ok(_) | Err(GiphyError::NotFound { .. }) => {}
                Err(err) => {
                    tracing::warn!(
                        channel = %channel_id,
                        username = %username,
                        error = %err,
                        "username listing failed, trying next tier"
                    );
                    last_failure = Some(err);
                }
            }
        }

        match self.name_search_listing(channel_id).await {
            Ok(items) if !items.is_empty() => return Ok(items),
            Ok(_) | Err(GiphyError::NotFound { .. }) => {}
            Err(err) => {
                tracing::warn!(
                    channel = %channel_id,
                    error = %err,
                    "channel-name search failed"
                );
                last_failure = Some(err);
            }
        }

        match last_failure {
            Some(err) => Err(err),
            None => Ok(Vec::new()),
        }
    }

    /// Pages through `/gifs/search?username=` at 50 per page.
    async fn username_listing(
        &self,
        username: &str,
        channel_id: &str,
    ) -> Result<Vec<ContentItem>, GiphyError> {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut offset: u32 = 0;

        for page in 0..LISTING_MAX_PAGES {
            if page > 0 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }

            let result: Result<GiphyListResponse, GiphyError> = self
                .get_json(
                    "gifs/search",
                    &[
                        ("q", String::new()),
                        ("username", username.to_owned()),
                        ("limit", LISTING_PAGE_SIZE.to_string()),
                        ("offset", offset.to_string()),
                    ],
                    self.listing_timeout,
                )
                .await;

            let resp = match result {
                Ok(resp) => resp,
                Err(err) if page == 0 => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        channel = %channel_id,
                        page,
                        error = %err,
                        "listing page failed, keeping earlier pages"
                    );
                    break;
                }
            };

            let returned = u32::try_from(resp.data.len()).unwrap_or(u32::MAX);
            let total = resp.pagination.map_or(0, |p| p.total_count);

            for gif in resp.data {
                if match_owner(owner_of(&gif), channel_id, FUZZY_LENGTH_TOLERANCE).is_none() {
                    continue;
                }
                if seen.insert(gif.id.clone()) {
                    items.push(normalize_gif(gif));
                }
            }

            offset = offset.saturating_add(returned);
            if returned < LISTING_PAGE_SIZE || (total > 0 && i64::from(offset) >= total) {
                break;
            }
        }

        Ok(items)
    }

    /// Single search for the channel name, filtered to the channel's uploads.
    async fn name_search_listing(&self, channel_id: &str) -> Result<Vec<ContentItem>, GiphyError> {
        let resp: GiphyListResponse = self
            .get_json(
                "gifs/search",
                &[
                    ("q", channel_id.to_owned()),
                    ("limit", LISTING_PAGE_SIZE.to_string()),
                ],
                self.listing_timeout,
            )
            .await?;

        let mut seen = HashSet::new();
        Ok(resp
            .data
            .into_iter()
            .filter(|gif| {
                match_owner(owner_of(gif), channel_id, FUZZY_LENGTH_TOLERANCE).is_some()
            })
            .filter(|gif| seen.insert(gif.id.clone()))
            .map(normalize_gif)
            .collect())
    }
}

/// The username as given, then with its first letter capitalized when that
/// differs.
pub(super) fn username_variants(channel_id: &str) -> Vec<String> {
    let mut variants = vec![channel_id.to_owned()];
    let mut chars = channel_id.chars();
    if let Some(first) = chars.next() {
        let capitalized: String = first.to_uppercase().chain(chars).collect();
        if capitalized != channel_id {
            variants.push(capitalized);
        }
    }
    variants
}
