use std::fmt::Display;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Every way an `extract` call can fail. Each stage short-circuits with one of these.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Network failure, timeout or non-2xx status. Never retried.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The provider's player script no longer has the shape the key recipe is read from.
    #[error("key script pattern not found: {0}")]
    ScriptPatternNotFound(String),

    /// AES, unpadding, UTF-8 or plaintext JSON failure. Usually a stale key recipe.
    #[error("cannot decrypt sources, perhaps the key is invalid: {0}")]
    Decrypt(String),

    #[error("no source found, try a different server")]
    NoSourceFound,

    #[error("unsupported server: {0}")]
    UnsupportedServer(String),

    #[error("invalid embed: {0}")]
    InvalidEmbed(String),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn decrypt(err: impl Display) -> Self {
        Self::Decrypt(err.to_string())
    }

    pub fn invalid_embed(err: impl Display) -> Self {
        Self::InvalidEmbed(err.to_string())
    }
}
