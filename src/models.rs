use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Embed page to resolve, plus the headers the caller saw it with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedReference {
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Use the provider's alternate host when it has one.
    pub alternative: bool,
}

impl EmbedReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.headers.insert("Referer".into(), referer.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn alternative(mut self, alternative: bool) -> Self {
        self.alternative = alternative;
        self
    }

    pub fn referer(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("referer"))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSource {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(rename = "isM3U8")]
    pub is_m3u8: bool,
    #[serde(rename = "isDASH", skip_serializing_if = "Option::is_none")]
    pub is_dash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl VideoSource {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            is_m3u8: url.contains(".m3u8"),
            is_dash: url.contains(".mpd").then_some(true),
            quality: None,
            size: None,
            url,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
}

/// Intro/outro skip markers in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    pub sources: Vec<VideoSource>,
    pub subtitles: Vec<SubtitleTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outro: Option<TimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    /// Headers a player has to send when fetching `sources`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}
