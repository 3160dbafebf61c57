//! GIPHY-backed [`chanwatch_core::ContentSource`].

pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod rate_limit;
pub mod types;

pub use client::GiphyClient;
pub use error::GiphyError;
pub use normalize::normalize_gif;
pub use types::{GiphyGif, GiphyListResponse};
