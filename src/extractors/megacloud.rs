use std::{
    collections::HashMap,
    sync::OnceLock,
    time::{SystemTime, UNIX_EPOCH},
};

use log::debug;
use regex::Regex;
use reqwest::header;
use strum_macros::Display;

use super::{EmbedExtractor, SourcesResponse, extract_video_id, probe_by_priority};
use crate::{
    error::{ExtractError, Result},
    models::{EmbedReference, ExtractResult},
    utils::{
        HttpConfig, fetch_json, fetch_text,
        jwp_player::TrackLabelPolicy,
        script_vars::{self, ScriptPattern},
        with_headers,
    },
};

const URL: &str = "https://megacloud.blog";
const KEYS_URL: &str =
    "https://raw.githubusercontent.com/itzzzme/megacloud-keys/refs/heads/main/key.txt";

/// The generations of the MegaCloud player, probed concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EmbedKind {
    /// `v3` endpoint, plain sources unlocked by a key hidden in the embed page.
    ClientKey,
    /// `v2` endpoint, passphrase published in a key document.
    KeyDocument,
    /// `e-1` endpoint, passphrase carved out of the payload with operands from the player script.
    ScriptRecipe,
}

/// Third party service that resolves MegaCloud ids into plain sources.
#[derive(Debug, Clone)]
pub struct ExternalResolver {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ExternalResolver {
    fn from_build_env() -> Option<Self> {
        option_env!("MEGACLOUD_EXTRACTOR").map(|base_url| Self {
            base_url: base_url.into(),
            api_key: option_env!("MEGACLOUD_EXTRACTOR_KEY").map(Into::into),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MegaCloudConfig {
    pub host: String,
    pub script_url: String,
    pub script_pattern: ScriptPattern,
    pub key_document_url: String,
    /// Highest priority first.
    pub embed_kinds: Vec<EmbedKind>,
    /// When set, replaces the embed kinds entirely.
    pub external_resolver: Option<ExternalResolver>,
    pub http: HttpConfig,
}

impl Default for MegaCloudConfig {
    fn default() -> Self {
        Self {
            host: URL.into(),
            script_url: format!("{URL}/js/player/a/prod/e1-player.min.js"),
            script_pattern: ScriptPattern::Last,
            key_document_url: KEYS_URL.into(),
            embed_kinds: vec![
                EmbedKind::ClientKey,
                EmbedKind::KeyDocument,
                EmbedKind::ScriptRecipe,
            ],
            external_resolver: ExternalResolver::from_build_env(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MegaCloudExtractor {
    config: MegaCloudConfig,
}

impl MegaCloudExtractor {
    pub fn new(config: MegaCloudConfig) -> Self {
        Self { config }
    }
}

impl EmbedExtractor for MegaCloudExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult> {
        let id = extract_video_id(&embed.url)?;
        debug!("[megacloud] extracting {id}");

        let mut result = match &self.config.external_resolver {
            Some(resolver) => self.extract_with_resolver(resolver, id, embed).await?,
            None => {
                let branches = self
                    .config
                    .embed_kinds
                    .iter()
                    .map(|&kind| (kind.to_string(), self.extract_kind(kind, id, embed)))
                    .collect();

                probe_by_priority(branches).await?
            }
        };

        result.headers = Some(HashMap::from([(
            "Referer".into(),
            format!("{}/", self.config.host),
        )]));

        Ok(result)
    }
}

impl MegaCloudExtractor {
    async fn extract_kind(
        &self,
        kind: EmbedKind,
        id: &str,
        embed: &EmbedReference,
    ) -> Result<ExtractResult> {
        match kind {
            EmbedKind::ClientKey => self.extract_with_client_key(id, embed).await,
            EmbedKind::KeyDocument => self.extract_with_key_document(id, embed).await,
            EmbedKind::ScriptRecipe => self.extract_with_script(id, embed).await,
        }
    }

    async fn extract_with_script(&self, id: &str, embed: &EmbedReference) -> Result<ExtractResult> {
        let host = &self.config.host;
        let http = &self.config.http;

        let response: SourcesResponse = fetch_json(
            http.ajax(format!("{host}/embed-2/ajax/e-1/getSources"), &embed.url)
                .query(&[("id", id)]),
        )
        .await?;

        let recipe = if response.is_encrypted() {
            let script = fetch_text(
                http.get(&self.config.script_url)
                    .query(&[("v", cache_buster())]),
            )
            .await?;

            Some(script_vars::extract_key_recipe(
                &script,
                self.config.script_pattern,
            )?)
        } else {
            None
        };

        response.into_recipe_result(recipe.as_ref(), TrackLabelPolicy::Label)
    }

    async fn extract_with_key_document(
        &self,
        id: &str,
        embed: &EmbedReference,
    ) -> Result<ExtractResult> {
        let host = &self.config.host;

        let response: SourcesResponse = fetch_json(
            self.config
                .http
                .ajax(format!("{host}/embed-2/v2/e-1/getSources"), &embed.url)
                .query(&[("id", id)]),
        )
        .await?;

        let key = if response.is_encrypted() {
            Some(self.load_key().await?)
        } else {
            None
        };

        response.into_password_result(key.as_deref(), TrackLabelPolicy::Label)
    }

    async fn extract_with_client_key(
        &self,
        id: &str,
        embed: &EmbedReference,
    ) -> Result<ExtractResult> {
        let host = &self.config.host;
        let http = &self.config.http;

        let html = fetch_text(with_headers(http.get(&embed.url), &embed.headers)).await?;

        let client_key = try_extract_client_key(&html).ok_or_else(|| {
            ExtractError::ScriptPatternNotFound("client key not found in embed page".into())
        })?;

        let response: SourcesResponse = fetch_json(
            http.ajax(format!("{host}/embed-2/v3/e-1/getSources"), &embed.url)
                .query(&[("id", id), ("_k", client_key.as_str())]),
        )
        .await?;

        let key = if response.is_encrypted() {
            Some(self.load_key().await?)
        } else {
            None
        };

        response.into_password_result(key.as_deref(), TrackLabelPolicy::Label)
    }

    async fn extract_with_resolver(
        &self,
        resolver: &ExternalResolver,
        id: &str,
        embed: &EmbedReference,
    ) -> Result<ExtractResult> {
        let mut request = self
            .config
            .http
            .get(&resolver.base_url)
            .header(header::ACCEPT, "application/json")
            .query(&[("xrax", id)]);

        if let Some(referer) = embed.referer() {
            request = request.header(header::REFERER, referer);
        }

        if let Some(api_key) = &resolver.api_key {
            request = request.header("X-Api-Key", api_key);
        }

        let response: SourcesResponse = fetch_json(request).await?;

        response.into_password_result(None, TrackLabelPolicy::Label)
    }

    async fn load_key(&self) -> Result<String> {
        let key = fetch_text(self.config.http.get(&self.config.key_document_url)).await?;
        Ok(key.trim().to_owned())
    }
}

fn cache_buster() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string()
}

// Places the v3 embed page hides its client key in:
// <meta name="_gg_fb" content="KEY">
// <!-- _is_th:KEY -->
// <script>window._lk_db = {x: "P1", y: "P2", z: "P3"};</script>
// <div data-dpi="KEY"></div>
// <script nonce="KEY">
// <script>window._xy_ws = "KEY";</script>
fn try_extract_client_key(html: &str) -> Option<String> {
    static SINGLE_KEY_RES: OnceLock<Vec<Regex>> = OnceLock::new();
    let single_key_res = SINGLE_KEY_RES.get_or_init(|| {
        [
            r#"<meta name="_gg_fb" content="([a-zA-Z0-9]+)">"#,
            r#"<!--\s+_is_th:([0-9a-zA-Z]+)\s+-->"#,
            r#"<div\s+data-dpi="([0-9a-zA-Z]+)".*></div>"#,
            r#"<script nonce="([0-9a-zA-Z]+)">"#,
            r#"<script>window._xy_ws\s*=\s*['"`]([0-9a-zA-Z]+)['"`];</script>"#,
        ]
        .into_iter()
        .map(|re| Regex::new(re).unwrap())
        .collect()
    });

    let (meta_and_comment, rest) = single_key_res.split_at(2);

    meta_and_comment
        .iter()
        .find_map(|re| capture_first(re, html))
        .or_else(|| try_extract_split_client_key(html))
        .or_else(|| rest.iter().find_map(|re| capture_first(re, html)))
}

fn capture_first(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// `window._lk_db` holds the key in three parts, keyed x, y, z in any order.
fn try_extract_split_client_key(html: &str) -> Option<String> {
    static LK_DB_RE: OnceLock<Regex> = OnceLock::new();
    let part = r#"([xyzXYZ]):\s+["']([a-zA-Z0-9]+)["']"#;

    let captures = LK_DB_RE
        .get_or_init(|| {
            Regex::new(&format!(
                r#"<script>window\._lk_db\s+=\s+\{{{part},\s+{part},\s+{part}\}};</script>"#
            ))
            .unwrap()
        })
        .captures(html)?;

    let mut parts: [&str; 3] = Default::default();
    for idx in 0..3 {
        let slot = match captures.get(1 + idx * 2)?.as_str() {
            "x" | "X" => 0,
            "y" | "Y" => 1,
            _ => 2,
        };
        parts[slot] = captures.get(2 + idx * 2)?.as_str();
    }

    Some(parts.join(""))
}
