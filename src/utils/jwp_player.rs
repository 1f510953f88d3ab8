//! Source list normalizer for JW Player style manifests (`{file, type?, kind?, label?}`).

use serde::Deserialize;

use crate::{
    error::{ExtractError, Result},
    models::{SubtitleTrack, VideoSource},
};

/// One manifest entry. Entries with a `kind` are tracks, everything else is a video source.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Source {
    #[serde(alias = "url", default)]
    pub file: String,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub kind: Option<String>,
    pub label: Option<String>,
}

impl Source {
    pub fn is_track(&self) -> bool {
        self.kind.is_some()
    }

    pub fn to_video_source(&self) -> VideoSource {
        let mut source = VideoSource::new(&self.file);
        if self.source_type.as_deref() == Some("hls") {
            source.is_m3u8 = true;
        }
        source
    }
}

/// How a track without a usable label gets its `lang`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackLabelPolicy {
    /// `label`, else `"Thumbnails"` for thumbnail tracks, else the kind.
    #[default]
    Label,
    /// Kind only, thumbnail tracks become `"Default (maybe)"`.
    Kind,
}

impl TrackLabelPolicy {
    fn lang(&self, track: &Source) -> String {
        let kind = track.kind.as_deref().unwrap_or_default();

        match self {
            TrackLabelPolicy::Label => match &track.label {
                Some(label) if !label.is_empty() => label.clone(),
                _ if kind == "thumbnails" => "Thumbnails".into(),
                _ => kind.into(),
            },
            TrackLabelPolicy::Kind if kind == "thumbnails" => "Default (maybe)".into(),
            TrackLabelPolicy::Kind => kind.into(),
        }
    }
}

/// `track` is either a plain list or wrapped as `{"tracks": [..]}`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum TrackList {
    List(Vec<Source>),
    Wrapped {
        #[serde(default)]
        tracks: Vec<Source>,
    },
}

impl Default for TrackList {
    fn default() -> Self {
        TrackList::List(vec![])
    }
}

impl TrackList {
    pub fn into_vec(self) -> Vec<Source> {
        match self {
            TrackList::List(tracks) | TrackList::Wrapped { tracks } => tracks,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct JWPConfig {
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub tracks: Vec<Source>,
}

impl JWPConfig {
    /// Splits one mixed manifest array into sources and tracks.
    pub fn from_manifest(entries: Vec<Source>) -> Self {
        let (tracks, sources) = entries.into_iter().partition(Source::is_track);
        Self { sources, tracks }
    }

    pub fn with_tracks(mut self, tracks: Vec<Source>) -> Self {
        self.tracks.extend(tracks);
        self
    }

    pub fn normalize(
        &self,
        policy: TrackLabelPolicy,
    ) -> Result<(Vec<VideoSource>, Vec<SubtitleTrack>)> {
        let sources: Vec<_> = self
            .sources
            .iter()
            .filter(|source| !source.file.is_empty())
            .map(Source::to_video_source)
            .collect();

        if sources.is_empty() {
            return Err(ExtractError::NoSourceFound);
        }

        Ok((sources, normalize_tracks(&self.tracks, policy)))
    }
}

pub fn normalize_tracks(tracks: &[Source], policy: TrackLabelPolicy) -> Vec<SubtitleTrack> {
    tracks
        .iter()
        .filter(|track| !track.file.is_empty())
        .map(|track| SubtitleTrack {
            url: track.file.clone(),
            lang: policy.lang(track),
        })
        .collect()
}

/// Parses a manifest that came out of a decryption. Bad JSON here means a bad key.
pub fn parse_decrypted_manifest(plaintext: &str) -> Result<Vec<Source>> {
    serde_json::from_str(plaintext)
        .map_err(|err| ExtractError::Decrypt(format!("decrypted sources are not JSON: {err}")))
}

pub fn normalize_manifest(
    text: &str,
    policy: TrackLabelPolicy,
) -> Result<(Vec<VideoSource>, Vec<SubtitleTrack>)> {
    let entries: Vec<Source> = serde_json::from_str(text)?;
    JWPConfig::from_manifest(entries).normalize(policy)
}
