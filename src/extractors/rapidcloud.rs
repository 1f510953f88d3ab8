use std::collections::HashMap;

use log::debug;
use url::Url;

use super::{EmbedExtractor, SourcesResponse, extract_video_id};
use crate::{
    error::{ExtractError, Result},
    models::{EmbedReference, ExtractResult},
    utils::{
        HttpConfig, fetch_json, fetch_text, hls, jwp_player::TrackLabelPolicy,
        key_recipe::KeyRecipe,
    },
};

#[derive(Debug, Clone)]
pub struct RapidCloudConfig {
    /// `[[start, inc], ..]` pairs, raw or as a GitHub blob page.
    pub key_document_url: String,
    /// Used when the embed comes without a referer. Embeds served from this
    /// host get their HLS masters expanded.
    pub referer: String,
    pub http: HttpConfig,
}

impl Default for RapidCloudConfig {
    fn default() -> Self {
        Self {
            key_document_url: "https://raw.githubusercontent.com/cinemaxhq/keys/e1/key".into(),
            referer: "https://rapid-cloud.co/".into(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RapidCloudExtractor {
    config: RapidCloudConfig,
}

impl RapidCloudExtractor {
    pub fn new(config: RapidCloudConfig) -> Self {
        Self { config }
    }
}

impl EmbedExtractor for RapidCloudExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult> {
        let http = &self.config.http;
        let embed_url = Url::parse(&embed.url).map_err(ExtractError::invalid_embed)?;
        let id = extract_video_id(&embed.url)?;
        let origin = embed_url.origin().ascii_serialization();

        let response: SourcesResponse = fetch_json(
            http.ajax(format!("{origin}/embed-2/ajax/e-1/getSources"), &embed.url)
                .query(&[("id", id)]),
        )
        .await?;

        let recipe = if response.is_encrypted() {
            let document = fetch_text(http.get(&self.config.key_document_url)).await?;
            Some(KeyRecipe::from_key_document(&document)?)
        } else {
            None
        };

        let mut result = response.into_recipe_result(recipe.as_ref(), TrackLabelPolicy::Label)?;

        let referer = embed.referer().unwrap_or(self.config.referer.as_str());
        let headers = HashMap::from([("Referer".to_string(), referer.to_string())]);

        if served_from(&embed_url, referer) {
            debug!("[rapidcloud] expanding {} masters", result.sources.len());
            result.sources = hls::expand_masters(&result.sources, http, &headers).await?;
        }

        result.headers = Some(headers);
        Ok(result)
    }
}

fn served_from(embed_url: &Url, referer: &str) -> bool {
    let Some(referer_host) = Url::parse(referer).ok().and_then(|u| u.host_str().map(str::to_owned))
    else {
        return false;
    };

    embed_url.as_str().contains(&referer_host)
}
