use std::collections::HashMap;

use log::debug;

use super::{EmbedExtractor, SourcesResponse, extract_video_id};
use crate::{
    error::Result,
    models::{EmbedReference, ExtractResult},
    utils::{
        HttpConfig, fetch_json, fetch_text, hls,
        jwp_player::TrackLabelPolicy,
        script_vars::{self, ScriptPattern},
    },
};

#[derive(Debug, Clone)]
pub struct VidCloudConfig {
    pub host: String,
    /// Picked when the embed asks for the alternative server.
    pub alternative_host: String,
    /// Player script path, relative to the selected host.
    pub script_path: String,
    pub script_pattern: ScriptPattern,
    pub http: HttpConfig,
}

impl Default for VidCloudConfig {
    fn default() -> Self {
        Self {
            host: "https://dokicloud.one".into(),
            alternative_host: "https://rabbitstream.net".into(),
            script_path: "/js/player/prod/e4-player.min.js".into(),
            script_pattern: ScriptPattern::AfterUrlSearchParams,
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VidCloudExtractor {
    config: VidCloudConfig,
}

impl VidCloudExtractor {
    pub fn new(config: VidCloudConfig) -> Self {
        Self { config }
    }
}

impl EmbedExtractor for VidCloudExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult> {
        let config = &self.config;
        let host = if embed.alternative {
            &config.alternative_host
        } else {
            &config.host
        };
        let id = extract_video_id(&embed.url)?;
        debug!("[vidcloud] extracting {id} from {host}");

        let response: SourcesResponse = fetch_json(
            config
                .http
                .ajax(format!("{host}/ajax/embed-4/getSources"), &embed.url)
                .query(&[("id", id)]),
        )
        .await?;

        let recipe = if response.is_encrypted() {
            let script =
                fetch_text(config.http.get(format!("{host}{}", config.script_path))).await?;
            Some(script_vars::extract_key_recipe(&script, config.script_pattern)?)
        } else {
            None
        };

        let mut result = response.into_recipe_result(recipe.as_ref(), TrackLabelPolicy::Label)?;

        let headers = HashMap::from([("Referer".to_string(), embed.url.clone())]);
        result.sources = hls::expand_masters(&result.sources, &config.http, &headers).await?;
        result.headers = Some(headers);

        Ok(result)
    }
}
