use std::collections::HashMap;

use log::{debug, warn};
use url::Url;

use super::EmbedExtractor;
use crate::{
    error::{ExtractError, Result},
    models::{EmbedReference, ExtractResult, VideoSource},
    utils::{HttpConfig, fetch_text, hls, text, with_headers},
};

const STREAMWISH_URL: &str = "https://streamwish.to";
const SUBSTITUTE_URL: &str = "https://yuguaab.com";

#[derive(Debug, Clone)]
pub struct StreamWishConfig {
    /// `(from, to)` host prefixes rewritten before the embed page is fetched.
    pub host_substitutions: Vec<(String, String)>,
    pub http: HttpConfig,
}

impl Default for StreamWishConfig {
    fn default() -> Self {
        Self {
            host_substitutions: vec![(STREAMWISH_URL.into(), SUBSTITUTE_URL.into())],
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamWishExtractor {
    config: StreamWishConfig,
}

impl StreamWishExtractor {
    pub fn new(config: StreamWishConfig) -> Self {
        Self { config }
    }

    fn embed_url(&self, url: &str) -> String {
        self.config
            .host_substitutions
            .iter()
            .find(|(from, _)| url.starts_with(from.as_str()))
            .map(|(from, to)| url.replacen(from.as_str(), to, 1))
            .unwrap_or_else(|| url.to_owned())
    }
}

impl EmbedExtractor for StreamWishExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult> {
        let http = &self.config.http;
        let final_url = self.embed_url(&embed.url);
        let host = Url::parse(&final_url)
            .map_err(ExtractError::invalid_embed)?
            .origin()
            .ascii_serialization();

        let html = fetch_text(with_headers(http.get(&final_url), &embed.headers)).await?;

        let Some(file) = text::extract_file_property(&html) else {
            warn!("[streamwish] no file property in {final_url}");
            return Err(ExtractError::NoSourceFound);
        };

        let link = if file.starts_with('/') && !file.starts_with("//") {
            format!("{host}{file}")
        } else {
            text::to_full_url(file)
        };
        debug!("[streamwish] found {link}");

        let headers = HashMap::from([("Referer".to_string(), format!("{host}/"))]);

        let sources = if link.contains(".m3u8") {
            hls::expand_variants(&link, http, &headers).await?
        } else {
            vec![VideoSource::new(link)]
        };

        Ok(ExtractResult {
            sources,
            headers: Some(headers),
            ..Default::default()
        })
    }
}
