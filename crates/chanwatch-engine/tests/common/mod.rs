//! Scripted in-process content source with call accounting.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chanwatch_core::{ContentItem, ContentSource, SearchPage, SourceError};
use chanwatch_engine::EngineSettings;

pub const OTHER_OWNER: &str = "someone_else";

/// What a search query returns.
#[derive(Debug, Clone)]
pub enum Script {
    /// `total` results with an item owned by `owner` at 1-based `position`.
    Hit {
        owner: String,
        item_id: String,
        position: u64,
        total: i64,
    },
    /// `total` results, none owned by the probed channel.
    Miss { total: i64 },
    Fail(SourceError),
}

impl Script {
    pub fn hit(owner: &str, item_id: &str, position: u64, total: i64) -> Self {
        Self::Hit {
            owner: owner.to_string(),
            item_id: item_id.to_string(),
            position,
            total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchCall {
    pub query: String,
    pub offset: u32,
    pub seq: usize,
}

pub struct FakeSource {
    listing: Result<Vec<ContentItem>, SourceError>,
    details: HashMap<String, ContentItem>,
    details_fail: bool,
    searches: HashMap<String, Script>,
    delays: HashMap<String, Duration>,
    default_search: Script,
    trending: Result<Vec<ContentItem>, SourceError>,
    seq: AtomicUsize,
    calls: Mutex<Vec<SearchCall>>,
    first_hit_seq: Mutex<Option<usize>>,
    detail_calls: AtomicUsize,
    trending_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            listing: Ok(Vec::new()),
            details: HashMap::new(),
            details_fail: false,
            searches: HashMap::new(),
            delays: HashMap::new(),
            default_search: Script::Miss { total: 0 },
            trending: Ok(Vec::new()),
            seq: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            first_hit_seq: Mutex::new(None),
            detail_calls: AtomicUsize::new(0),
            trending_calls: AtomicUsize::new(0),
        }
    }

    /// Listing returns `items`; item detail returns each item unchanged.
    pub fn with_items(mut self, items: Vec<ContentItem>) -> Self {
        for item in &items {
            self.details.insert(item.id.clone(), item.clone());
        }
        self.listing = Ok(items);
        self
    }

    /// Item detail reports `views` for `item_id`.
    pub fn with_detail_views(mut self, item_id: &str, views: i64) -> Self {
        if let Some(item) = self.details.get_mut(item_id) {
            item.latest_view_count = views;
        }
        self
    }

    pub fn with_failing_details(mut self) -> Self {
        self.details_fail = true;
        self
    }

    pub fn with_listing_error(mut self, err: SourceError) -> Self {
        self.listing = Err(err);
        self
    }

    pub fn with_search(mut self, query: &str, script: Script) -> Self {
        self.searches.insert(query.to_string(), script);
        self
    }

    pub fn with_default_search(mut self, script: Script) -> Self {
        self.default_search = script;
        self
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn with_trending(mut self, trending: Result<Vec<ContentItem>, SourceError>) -> Self {
        self.trending = trending;
        self
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, query: &str) -> usize {
        self.search_calls()
            .iter()
            .filter(|c| c.query == query)
            .count()
    }

    pub fn first_hit_seq(&self) -> Option<usize> {
        *self.first_hit_seq.lock().unwrap()
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn trending_calls(&self) -> usize {
        self.trending_calls.load(Ordering::SeqCst)
    }
}

fn filler_page(offset: u32, limit: u32, total: i64) -> SearchPage {
    let remaining = (total - i64::from(offset)).clamp(0, i64::from(limit));
    let items = (0..remaining)
        .map(|i| ContentItem::new(format!("other-{}", i64::from(offset) + i), OTHER_OWNER))
        .collect();
    SearchPage {
        items,
        total_count: total,
    }
}

impl ContentSource for FakeSource {
    async fn list_channel_items(&self, _channel_id: &str) -> Result<Vec<ContentItem>, SourceError> {
        self.listing.clone()
    }

    async fn get_item_detail(&self, item_id: &str) -> Result<ContentItem, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.details_fail {
            return Err(SourceError::Transient("detail endpoint down".into()));
        }
        self.details
            .get(item_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(item_id.to_string()))
    }

    async fn search(&self, query: &str, offset: u32, limit: u32) -> Result<SearchPage, SourceError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(SearchCall {
            query: query.to_string(),
            offset,
            seq,
        });

        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }

        let script = self
            .searches
            .get(query)
            .unwrap_or(&self.default_search)
            .clone();
        match script {
            Script::Fail(err) => Err(err),
            Script::Miss { total } => Ok(filler_page(offset, limit, total)),
            Script::Hit {
                owner,
                item_id,
                position,
                total,
            } => {
                let mut page = filler_page(offset, limit, total);
                let index = position - 1;
                let start = u64::from(offset);
                if index >= start && index < start + page.items.len() as u64 {
                    page.items[(index - start) as usize] = ContentItem::new(item_id, owner);
                    self.first_hit_seq.lock().unwrap().get_or_insert(seq);
                }
                Ok(page)
            }
        }
    }

    async fn trending(&self, _limit: u32) -> Result<Vec<ContentItem>, SourceError> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        self.trending.clone()
    }
}

/// Fast settings: no pacing gap, short timeouts.
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        search_timeout: Duration::from_secs(2),
        detail_timeout: Duration::from_secs(2),
        inter_request_delay: Duration::ZERO,
        ..EngineSettings::default()
    }
}
