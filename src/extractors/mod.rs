mod asianload;
mod encrypt_ajax;
mod gogocdn;
mod megacloud;
mod rapidcloud;
mod streamwish;
mod vidcloud;

pub use asianload::{AsianLoadConfig, AsianLoadExtractor};
pub use gogocdn::{GogoCDNConfig, GogoCDNExtractor};
pub use megacloud::{EmbedKind, ExternalResolver, MegaCloudConfig, MegaCloudExtractor};
pub use rapidcloud::{RapidCloudConfig, RapidCloudExtractor};
pub use streamwish::{StreamWishConfig, StreamWishExtractor};
pub use vidcloud::{VidCloudConfig, VidCloudExtractor};

use std::{future::Future, str::FromStr};

use enum_dispatch::enum_dispatch;
use log::{debug, warn};
use serde::Deserialize;
use strum::VariantNames;
use strum_macros::{Display, EnumString, VariantNames};

use crate::{
    error::{ExtractError, Result},
    models::{EmbedReference, ExtractResult, TimeRange},
    utils::{
        cipher_mode::CipherMode,
        jwp_player::{self, JWPConfig, TrackLabelPolicy},
        key_recipe::{self, KeyRecipe},
    },
};

/// Resolves one provider's embed page into playable sources.
#[enum_dispatch]
pub trait EmbedExtractor {
    async fn extract(&self, embed: &EmbedReference) -> Result<ExtractResult>;
}

#[enum_dispatch(EmbedExtractor)]
#[derive(EnumString, VariantNames)]
#[strum(ascii_case_insensitive)]
pub enum AllExtractors {
    #[strum(serialize = "MegaCloud")]
    MegaCloudExtractor,
    #[strum(serialize = "RapidCloud")]
    RapidCloudExtractor,
    #[strum(serialize = "VidCloud")]
    VidCloudExtractor,
    #[strum(serialize = "GogoCDN")]
    GogoCDNExtractor,
    #[strum(serialize = "AsianLoad")]
    AsianLoadExtractor,
    #[strum(serialize = "StreamWish")]
    StreamWishExtractor,
}

/// Server names as the catalog layer reports them. Not all of them have an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum StreamingServer {
    #[strum(serialize = "megacloud")]
    MegaCloud,
    #[strum(serialize = "rapidcloud")]
    RapidCloud,
    #[strum(serialize = "vidcloud")]
    VidCloud,
    #[strum(serialize = "upcloud")]
    UpCloud,
    #[strum(serialize = "gogocdn")]
    GogoCDN,
    #[strum(serialize = "vidstreaming")]
    VidStreaming,
    #[strum(serialize = "asianload")]
    AsianLoad,
    #[strum(serialize = "streamwish")]
    StreamWish,
    #[strum(serialize = "streamsb")]
    StreamSB,
    #[strum(serialize = "streamtape")]
    StreamTape,
    #[strum(serialize = "mixdrop")]
    MixDrop,
    #[strum(serialize = "filemoon")]
    Filemoon,
}

pub fn avalaible_extractors() -> Vec<String> {
    AllExtractors::VARIANTS
        .iter()
        .map(|&s| s.to_owned())
        .collect()
}

/// Looks up the extractor for a server name with production config. Never does I/O.
pub fn get_extractor(name: &str) -> Result<AllExtractors> {
    let server = StreamingServer::from_str(name)
        .map_err(|_| ExtractError::UnsupportedServer(name.to_owned()))?;

    get_server_extractor(server)
}

pub fn get_server_extractor(server: StreamingServer) -> Result<AllExtractors> {
    let extractor: AllExtractors = match server {
        StreamingServer::MegaCloud => MegaCloudExtractor::default().into(),
        StreamingServer::RapidCloud => RapidCloudExtractor::default().into(),
        StreamingServer::VidCloud | StreamingServer::UpCloud => {
            VidCloudExtractor::default().into()
        }
        StreamingServer::GogoCDN | StreamingServer::VidStreaming => {
            GogoCDNExtractor::default().into()
        }
        StreamingServer::AsianLoad => AsianLoadExtractor::default().into(),
        StreamingServer::StreamWish => StreamWishExtractor::default().into(),
        StreamingServer::StreamSB
        | StreamingServer::StreamTape
        | StreamingServer::MixDrop
        | StreamingServer::Filemoon => {
            return Err(ExtractError::UnsupportedServer(server.to_string()));
        }
    };

    Ok(extractor)
}

/// Runs every branch to completion and keeps the first success in priority order.
///
/// Branches are listed highest priority first. All failures are logged; when no
/// branch succeeds the highest priority error is returned.
pub(crate) async fn probe_by_priority<T, F>(branches: Vec<(String, F)>) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let (names, pending): (Vec<_>, Vec<_>) = branches.into_iter().unzip();

    let results = futures::future::join_all(pending).await;

    let mut selected: Option<T> = None;
    let mut first_error: Option<ExtractError> = None;

    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(value) if selected.is_none() => {
                debug!("[probe] selected branch '{name}'");
                selected = Some(value);
            }
            Ok(_) => debug!("[probe] branch '{name}' succeeded, lower priority"),
            Err(err) => {
                warn!("[probe] branch '{name}' failed: {err}");
                first_error.get_or_insert(err);
            }
        }
    }

    match (selected, first_error) {
        (Some(value), _) => Ok(value),
        (None, Some(err)) => Err(err),
        (None, None) => Err(ExtractError::NoSourceFound),
    }
}

/// `https://host/embed-2/e-1/{id}?k=1` -> `{id}`
pub(crate) fn extract_video_id(url: &str) -> Result<&str> {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.trim_end_matches('/').rsplit_once('/'))
        .map(|(_, id)| id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ExtractError::InvalidEmbed(format!("no video id in {url}")))
}

/// Body of the providers' `getSources` endpoints.
#[derive(Deserialize, Debug)]
pub(crate) struct SourcesResponse {
    #[serde(default)]
    pub sources: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tracks: Vec<jwp_player::Source>,
    #[serde(default)]
    pub encrypted: bool,
    pub intro: Option<TimeRange>,
    pub outro: Option<TimeRange>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `sources` as sent: already a manifest, or a ciphertext string.
#[derive(Debug)]
pub(crate) enum SourcesPayload {
    Plain(Vec<jwp_player::Source>),
    Encrypted(String),
}

impl SourcesResponse {
    pub fn is_encrypted(&self) -> bool {
        self.sources.is_string()
    }

    pub fn payload(&self) -> Result<SourcesPayload> {
        match &self.sources {
            serde_json::Value::String(ciphertext) => {
                if !self.encrypted {
                    debug!("[sources] string sources without encrypted flag, decrypting anyway");
                }
                Ok(SourcesPayload::Encrypted(ciphertext.clone()))
            }
            serde_json::Value::Array(_) => Ok(SourcesPayload::Plain(serde_json::from_value(
                self.sources.clone(),
            )?)),
            _ => Err(ExtractError::NoSourceFound),
        }
    }

    /// Decrypts with a recipe-carved passphrase when needed and normalizes.
    pub fn into_recipe_result(
        self,
        recipe: Option<&KeyRecipe>,
        policy: TrackLabelPolicy,
    ) -> Result<ExtractResult> {
        let entries = match self.payload()? {
            SourcesPayload::Plain(entries) => entries,
            SourcesPayload::Encrypted(ciphertext) => {
                let recipe = recipe.ok_or_else(|| {
                    ExtractError::Decrypt("encrypted sources without key recipe".into())
                })?;
                let recovered = key_recipe::recover_secret(&ciphertext, recipe)?;
                let plaintext = CipherMode::PasswordDerived {
                    password: recovered.secret.as_bytes(),
                }
                .decrypt(&recovered.cleaned)?;

                jwp_player::parse_decrypted_manifest(&plaintext)?
            }
        };

        self.into_result(entries, policy)
    }

    /// Same as [`Self::into_recipe_result`] for providers that publish the whole passphrase.
    pub fn into_password_result(
        self,
        password: Option<&str>,
        policy: TrackLabelPolicy,
    ) -> Result<ExtractResult> {
        let entries = match self.payload()? {
            SourcesPayload::Plain(entries) => entries,
            SourcesPayload::Encrypted(ciphertext) => {
                let password = password.ok_or_else(|| {
                    ExtractError::Decrypt("encrypted sources without passphrase".into())
                })?;
                let plaintext = CipherMode::PasswordDerived {
                    password: password.trim().as_bytes(),
                }
                .decrypt(&ciphertext)?;

                jwp_player::parse_decrypted_manifest(&plaintext)?
            }
        };

        self.into_result(entries, policy)
    }

    fn into_result(
        self,
        entries: Vec<jwp_player::Source>,
        policy: TrackLabelPolicy,
    ) -> Result<ExtractResult> {
        let (sources, subtitles) = JWPConfig::from_manifest(entries)
            .with_tracks(self.tracks)
            .normalize(policy)?;

        Ok(ExtractResult {
            sources,
            subtitles,
            intro: self.intro,
            outro: self.outro,
            ..Default::default()
        })
    }
}
