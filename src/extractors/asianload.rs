use std::{collections::HashMap, sync::OnceLock};

use scraper::Selector;

use super::{EmbedExtractor, encrypt_ajax::EncryptAjax};
use crate::{
    error::Result,
    models::{EmbedReference, ExtractResult},
    utils::{
        HttpConfig,
        jwp_player::{JWPConfig, TrackLabelPolicy},
    },
};

#[derive(Debug, Clone)]
pub struct AsianLoadConfig {
    pub key: String,
    pub iv: String,
    pub http: HttpConfig,
}

impl Default for AsianLoadConfig {
    fn default() -> Self {
        Self {
            key: "93422192433952489752342908585752".into(),
            iv: "9262859232435825".into(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AsianLoadExtractor {
    config: AsianLoadConfig,
}

impl AsianLoadExtractor {
    pub fn new(config: AsianLoadConfig) -> Self {
        Self { config }
    }
}

impl EmbedExtractor for AsianLoadExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult> {
        static CRYPTO_SELECTOR: OnceLock<Selector> = OnceLock::new();

        let config = &self.config;
        let links = EncryptAjax {
            provider: "asianload",
            token_selector: CRYPTO_SELECTOR
                .get_or_init(|| Selector::parse("script[data-name='crypto']").unwrap()),
            key: &config.key,
            response_key: &config.key,
            iv: &config.iv,
            http: &config.http,
        }
        .load_links(embed)
        .await?;

        let mut sources = links.source;
        sources.extend(links.source_bk);

        let (sources, subtitles) = JWPConfig {
            sources,
            tracks: links.track.into_vec(),
        }
        .normalize(TrackLabelPolicy::Kind)?;

        Ok(ExtractResult {
            sources,
            subtitles,
            headers: Some(HashMap::from([("Referer".into(), embed.url.clone())])),
            ..Default::default()
        })
    }
}
