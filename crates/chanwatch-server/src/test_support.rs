use std::sync::Arc;

use chanwatch_core::SourceSettings;
use chanwatch_db::SqliteStore;
use chanwatch_engine::{EngineSettings, Evaluator};
use chanwatch_giphy::GiphyClient;
use sqlx::SqlitePool;

use crate::api::{AppState, ServerEvaluator};

pub(crate) fn source_settings(base_url: &str) -> SourceSettings {
    SourceSettings {
        api_key: Some("test-key".to_owned()),
        base_url: base_url.to_owned(),
        user_agent: "chanwatch-test/0.1".to_owned(),
        search_timeout_secs: 2,
        detail_timeout_secs: 2,
        listing_timeout_secs: 2,
        inter_request_delay_ms: 0,
        max_retries: 0,
        retry_backoff_base_ms: 0,
    }
}

pub(crate) fn test_evaluator(pool: SqlitePool, base_url: &str) -> Arc<ServerEvaluator> {
    let client = GiphyClient::new(&source_settings(base_url)).expect("client");
    let settings = EngineSettings {
        inter_request_delay: std::time::Duration::ZERO,
        ..EngineSettings::default()
    };
    Arc::new(Evaluator::new(client, SqliteStore::new(pool), settings))
}

pub(crate) async fn test_state(base_url: &str) -> AppState {
    let pool = chanwatch_db::connect_in_memory().await.expect("in-memory pool");
    let evaluator = test_evaluator(pool.clone(), base_url);
    AppState { pool, evaluator }
}
