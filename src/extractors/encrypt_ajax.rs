//! `encrypt-ajax.php` handshake shared by the GogoCDN and AsianLoad players.
//!
//! The embed page ships an AES token in a `<script data-value>` attribute. Its
//! plaintext carries the query the ajax endpoint expects; the video id goes
//! along encrypted with the same key, and the answer comes back encrypted
//! under the response key.

use log::debug;
use scraper::Selector;
use serde::Deserialize;
use url::{Url, form_urlencoded};

use crate::{
    error::{ExtractError, Result},
    models::EmbedReference,
    utils::{
        HttpConfig,
        cipher_mode::CipherMode,
        crypto, fetch_json, fetch_text,
        jwp_player::{Source, TrackList},
        with_headers,
    },
};

pub(crate) struct EncryptAjax<'a> {
    pub provider: &'a str,
    pub token_selector: &'a Selector,
    pub key: &'a str,
    pub response_key: &'a str,
    pub iv: &'a str,
    pub http: &'a HttpConfig,
}

/// Decrypted answer of `encrypt-ajax.php`.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct LinksConfig {
    #[serde(default)]
    pub source: Vec<Source>,
    #[serde(default)]
    pub source_bk: Vec<Source>,
    #[serde(default)]
    pub track: TrackList,
}

#[derive(Deserialize)]
struct EncryptedLinks {
    data: String,
}

impl EncryptAjax<'_> {
    pub async fn load_links(&self, embed: &EmbedReference) -> Result<LinksConfig> {
        let provider = self.provider;
        let embed_url = Url::parse(&embed.url).map_err(ExtractError::invalid_embed)?;

        let id = embed_url
            .query_pairs()
            .find(|(name, _)| name == "id")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| ExtractError::invalid_embed(format!("no id in {embed_url}")))?;

        let html = fetch_text(with_headers(self.http.get(embed_url.as_str()), &embed.headers)).await?;

        let token = find_token(&html, self.token_selector).ok_or_else(|| {
            ExtractError::invalid_embed(format!("[{provider}] no encrypted token in embed page"))
        })?;

        let token = CipherMode::ExplicitKeyIv {
            key: self.key.as_bytes(),
            iv: self.iv.as_bytes(),
        }
        .decrypt(&token)?;

        let ajax_params = token
            .split_once('&')
            .map(|(_, params)| params)
            .ok_or_else(|| ExtractError::decrypt(format!("[{provider}] no ajax params in token")))?;

        let encrypted_id =
            crypto::encrypt_base64_aes(self.key.as_bytes(), self.iv.as_bytes(), id.as_bytes())?;
        let encrypted_id: String = form_urlencoded::byte_serialize(encrypted_id.as_bytes()).collect();

        let origin = embed_url.origin().ascii_serialization();
        let ajax_url =
            format!("{origin}/encrypt-ajax.php?id={encrypted_id}&{ajax_params}&alias={id}");
        debug!("[{provider}] loading links for {id}");

        let encrypted_links: EncryptedLinks =
            fetch_json(self.http.ajax(ajax_url, &embed.url)).await?;

        let links = CipherMode::ExplicitKeyIv {
            key: self.response_key.as_bytes(),
            iv: self.iv.as_bytes(),
        }
        .decrypt(&encrypted_links.data)?;

        let links: LinksConfig = serde_json::from_str(&links).map_err(|err| {
            ExtractError::decrypt(format!("[{provider}] decrypted links are not JSON: {err}"))
        })?;

        if links.source.is_empty() && links.source_bk.is_empty() {
            return Err(ExtractError::NoSourceFound);
        }

        Ok(links)
    }
}

fn find_token(html: &str, selector: &Selector) -> Option<String> {
    scraper::Html::parse_document(html)
        .select(selector)
        .filter_map(|el| el.attr("data-value"))
        .map(str::to_owned)
        .next()
}
