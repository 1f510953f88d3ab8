use std::{collections::HashMap, sync::OnceLock};

use log::debug;
use regex::Regex;

use super::{HttpConfig, fetch_text, with_headers};
use crate::{error::Result, models::VideoSource};

const STREAM_INF: &str = "#EXT-X-STREAM-INF:";

/// One playable variant of an HLS master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantStream {
    pub resolution_height: Option<u32>,
    pub bandwidth: Option<u64>,
    pub uri: String,
}

impl VariantStream {
    pub fn quality(&self) -> String {
        match (self.resolution_height, self.bandwidth) {
            (Some(height), _) => format!("{height}p"),
            (None, Some(bandwidth)) => format!("{bandwidth}bps"),
            (None, None) => "auto".into(),
        }
    }

    pub fn to_video_source(&self) -> VideoSource {
        VideoSource::new(&self.uri).with_quality(self.quality())
    }
}

/// Fetches a master playlist and lists its variants followed by the master itself as `auto`.
pub async fn expand_variants(
    url: &str,
    http: &HttpConfig,
    headers: &HashMap<String, String>,
) -> Result<Vec<VideoSource>> {
    let variants = fetch_variants(url, http, headers).await?;
    Ok(to_video_sources(&variants, url))
}

/// Variants of every HLS master in order, then the first master as `auto`.
/// Progressive sources are not fetched and follow unchanged.
pub async fn expand_masters(
    sources: &[VideoSource],
    http: &HttpConfig,
    headers: &HashMap<String, String>,
) -> Result<Vec<VideoSource>> {
    let (masters, progressive): (Vec<_>, Vec<_>) = sources.iter().partition(|s| s.is_m3u8);
    let mut expanded = vec![];

    for master in &masters {
        let variants = fetch_variants(&master.url, http, headers).await?;
        expanded.extend(variants.iter().map(VariantStream::to_video_source));
    }

    if let Some(first) = masters.first() {
        expanded.push(VideoSource::new(&first.url).with_quality("auto"));
    }

    expanded.extend(progressive.into_iter().cloned());

    Ok(expanded)
}

pub async fn fetch_variants(
    url: &str,
    http: &HttpConfig,
    headers: &HashMap<String, String>,
) -> Result<Vec<VariantStream>> {
    let content = fetch_text(with_headers(http.get(url), headers)).await?;

    let variants = parse_variants(&content, url);
    debug!("[hls] {} variants in {url}", variants.len());

    Ok(variants)
}

/// Variants in manifest order, then `master_url` as `auto`. No sorting, no dedup.
pub fn to_video_sources(variants: &[VariantStream], master_url: &str) -> Vec<VideoSource> {
    variants
        .iter()
        .map(VariantStream::to_video_source)
        .chain(std::iter::once(
            VideoSource::new(master_url).with_quality("auto"),
        ))
        .collect()
}

/// Reads `#EXT-X-STREAM-INF` blocks. I-frame playlists are not playable and are skipped.
/// Anything that is not an `EXTM3U` playlist has no variants.
pub fn parse_variants(content: &str, master_url: &str) -> Vec<VariantStream> {
    static RESOLUTION_RE: OnceLock<Regex> = OnceLock::new();
    let resolution_re =
        RESOLUTION_RE.get_or_init(|| Regex::new(r"RESOLUTION=(\d+)x(?<height>\d+)").unwrap());

    static BANDWIDTH_RE: OnceLock<Regex> = OnceLock::new();
    let bandwidth_re = BANDWIDTH_RE
        .get_or_init(|| Regex::new(r"(?:^|,)BANDWIDTH=(?<bandwidth>\d+)").unwrap());

    if !content.contains("EXTM3U") {
        return vec![];
    }

    let mut variants = vec![];
    let mut lines = content.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        let Some(attributes) = line.strip_prefix(STREAM_INF) else {
            continue;
        };

        // the URI must come before the next variant header
        let mut uri = None;
        while let Some(next) = lines.next_if(|l| !l.starts_with(STREAM_INF)) {
            if !next.is_empty() && !next.starts_with('#') {
                uri = Some(next);
                break;
            }
        }

        let Some(uri) = uri else {
            continue;
        };

        variants.push(VariantStream {
            resolution_height: resolution_re
                .captures(attributes)
                .and_then(|c| c.name("height")?.as_str().parse().ok()),
            bandwidth: bandwidth_re
                .captures(attributes)
                .and_then(|c| c.name("bandwidth")?.as_str().parse().ok()),
            uri: resolve_uri(master_url, uri),
        });
    }

    variants
}

/// Resolves a variant URI against the master playlist's directory.
fn resolve_uri(base_url: &str, relative_path: &str) -> String {
    if relative_path.starts_with("http://") || relative_path.starts_with("https://") {
        return relative_path.to_owned();
    }

    if relative_path.starts_with('/')
        && let Ok(base) = url::Url::parse(base_url)
        && let Ok(resolved) = base.join(relative_path)
    {
        return resolved.to_string();
    }

    match base_url.rfind('/') {
        Some(pos) => format!("{}/{}", &base_url[..pos], relative_path),
        None => format!("{}/{}", base_url, relative_path),
    }
}
