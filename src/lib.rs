pub mod error;
pub mod extractors;
pub mod models;
pub mod utils;

pub use error::{ExtractError, Result};
pub use extractors::{
    AllExtractors, EmbedExtractor, StreamingServer, avalaible_extractors, get_extractor,
    get_server_extractor,
};
pub use models::{EmbedReference, ExtractResult, SubtitleTrack, TimeRange, VideoSource};

/// Resolves an embed with the production config of the server's extractor.
pub async fn extract(server: &str, embed: &EmbedReference) -> Result<ExtractResult> {
    let extractor = get_extractor(server)?;
    extractor.extract(embed).await
}
