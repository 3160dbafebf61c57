use chanwatch_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GiphyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by GIPHY (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Config(#[from] chanwatch_core::ConfigError),
}

impl From<GiphyError> for SourceError {
    fn from(err: GiphyError) -> Self {
        match err {
            GiphyError::RateLimited { retry_after_secs } => {
                SourceError::RateLimited { retry_after_secs }
            }
            GiphyError::NotFound { url } => SourceError::NotFound(url),
            GiphyError::Deserialize { .. }
            | GiphyError::InvalidUrl { .. }
            | GiphyError::Config(_) => {
                SourceError::Malformed(err.to_string())
            }
            GiphyError::Http(_) | GiphyError::UnexpectedStatus { .. } => {
                SourceError::Transient(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_into_source_taxonomy() {
        let not_found: SourceError = GiphyError::NotFound {
            url: "https://api.giphy.com/v1/gifs/x".into(),
        }
        .into();
        assert!(not_found.is_not_found());

        let server: SourceError = GiphyError::UnexpectedStatus {
            status: 503,
            url: "u".into(),
        }
        .into();
        assert!(matches!(server, SourceError::Transient(_)));

        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let malformed: SourceError = GiphyError::Deserialize {
            context: "search".into(),
            source: bad_json,
        }
        .into();
        assert!(matches!(malformed, SourceError::Malformed(_)));

        let limited: SourceError = GiphyError::RateLimited {
            retry_after_secs: Some(7),
        }
        .into();
        assert_eq!(
            limited,
            SourceError::RateLimited {
                retry_after_secs: Some(7)
            }
        );
    }
}
