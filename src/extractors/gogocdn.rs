use std::{collections::HashMap, sync::OnceLock};

use log::debug;
use scraper::Selector;
use url::Url;

use super::{
    EmbedExtractor,
    encrypt_ajax::{EncryptAjax, LinksConfig},
};
use crate::{
    error::{ExtractError, Result},
    models::{EmbedReference, ExtractResult, VideoSource},
    utils::{
        HttpConfig, hls,
        jwp_player::{self, TrackLabelPolicy},
    },
};

#[derive(Debug, Clone)]
pub struct GogoCDNConfig {
    pub key: String,
    /// Decrypts the `encrypt-ajax.php` answer.
    pub second_key: String,
    pub iv: String,
    pub http: HttpConfig,
}

impl Default for GogoCDNConfig {
    fn default() -> Self {
        Self {
            key: "37911490979715163134003223491201".into(),
            second_key: "54674138327930866480207815084989".into(),
            iv: "3134003223491201".into(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GogoCDNExtractor {
    config: GogoCDNConfig,
}

impl GogoCDNExtractor {
    pub fn new(config: GogoCDNConfig) -> Self {
        Self { config }
    }
}

impl EmbedExtractor for GogoCDNExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult> {
        static EPISODE_SELECTOR: OnceLock<Selector> = OnceLock::new();

        let config = &self.config;
        let links = EncryptAjax {
            provider: "gogocdn",
            token_selector: EPISODE_SELECTOR
                .get_or_init(|| Selector::parse("script[data-name='episode']").unwrap()),
            key: &config.key,
            response_key: &config.second_key,
            iv: &config.iv,
            http: &config.http,
        }
        .load_links(embed)
        .await?;

        let headers = HashMap::from([("Referer".to_string(), embed.url.clone())]);
        let LinksConfig {
            source,
            source_bk,
            track,
        } = links;

        let mut sources = vec![];

        match source.first() {
            Some(first) if first.file.contains(".m3u8") => {
                let variants = hls::fetch_variants(&first.file, &config.http, &headers).await?;
                debug!("[gogocdn] {} variants", variants.len());

                sources.extend(variants.iter().map(hls::VariantStream::to_video_source));
                sources.extend(
                    source
                        .iter()
                        .map(|s| s.to_video_source().with_quality("default")),
                );
            }
            _ => sources.extend(source.iter().map(|s| {
                let video = s.to_video_source();
                match s.label.as_deref().and_then(|l| l.split(' ').next()) {
                    Some(quality) if !quality.is_empty() => video.with_quality(format!("{quality}p")),
                    _ => video,
                }
            })),
        }

        sources.extend(
            source_bk
                .iter()
                .map(|s| s.to_video_source().with_quality("backup")),
        );

        let sources: Vec<VideoSource> = sources.into_iter().filter(|s| !s.url.is_empty()).collect();
        if sources.is_empty() {
            return Err(ExtractError::NoSourceFound);
        }

        Ok(ExtractResult {
            sources,
            subtitles: jwp_player::normalize_tracks(&track.into_vec(), TrackLabelPolicy::Label),
            download: download_link(&embed.url),
            headers: Some(headers),
            ..Default::default()
        })
    }
}

/// `https://host/streaming.php?id=..` -> `https://host/download?id=..`
fn download_link(embed_url: &str) -> Option<String> {
    let url = Url::parse(embed_url).ok()?;
    let query = url.query()?;
    Some(format!("{}/download?{query}", url.origin().ascii_serialization()))
}
