mod common;

use common::*;
use serde_json::json;
use strumok_extractors::{
    EmbedExtractor, EmbedReference, ExtractError,
    extractors::{RapidCloudConfig, RapidCloudExtractor, VidCloudConfig, VidCloudExtractor},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const VIDEO_ID: &str = "yFqIrMcvbbGb";

fn rapidcloud(server: &MockServer) -> RapidCloudExtractor {
    RapidCloudExtractor::new(RapidCloudConfig {
        key_document_url: format!("{}/keys/e1/key", server.uri()),
        referer: format!("{}/", server.uri()),
        ..Default::default()
    })
}

async fn mount_rapid_sources(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/embed-2/ajax/e-1/getSources"))
        .and(query_param("id", VIDEO_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_key_document(server: &MockServer, document: &str) {
    Mock::given(method("GET"))
        .and(path("/keys/e1/key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(document))
        .mount(server)
        .await;
}

#[test_log::test(tokio::test)]
async fn should_decrypt_with_key_document() {
    let server = MockServer::start().await;

    mount_rapid_sources(
        &server,
        json!({
            "sources": MC_PAYLOAD,
            "tracks": [{"file": "https://rc.example/en.vtt", "label": "English", "kind": "captions"}],
            "encrypted": true,
            "intro": {"start": 0, "end": 0}
        }),
    )
    .await;
    mount_key_document(&server, KEY_DOCUMENT).await;

    // found on another site, no variant expansion
    let embed = EmbedReference::new(format!("{}/embed-2/e-1/{VIDEO_ID}?k=1", server.uri()))
        .with_referer("https://hianime.to/");

    let result = rapidcloud(&server).extract(&embed).await.unwrap();

    assert_eq!(1, result.sources.len());
    assert_eq!(MC_SOURCE, result.sources[0].url);
    assert_eq!("English", result.subtitles[0].lang);
    assert_eq!(
        Some(&"https://hianime.to/".to_string()),
        result.headers.as_ref().and_then(|h| h.get("Referer"))
    );
}

#[test_log::test(tokio::test)]
async fn should_read_key_document_from_blob_page() {
    let server = MockServer::start().await;

    mount_rapid_sources(
        &server,
        json!({"sources": MC_PAYLOAD, "tracks": [], "encrypted": true}),
    )
    .await;
    mount_key_document(
        &server,
        &format!(
            r#"<table><tr><td id="LC1" class="blob-code blob-code-inner js-file-line">{KEY_DOCUMENT}</td></tr></table>"#
        ),
    )
    .await;

    let embed = EmbedReference::new(format!("{}/embed-2/e-1/{VIDEO_ID}", server.uri()))
        .with_referer("https://hianime.to/");

    let result = rapidcloud(&server).extract(&embed).await.unwrap();

    assert_eq!(MC_SOURCE, result.sources[0].url);
}

#[test_log::test(tokio::test)]
async fn should_expand_own_host_masters() {
    let server = MockServer::start().await;
    let master = format!("{}/hls/master.m3u8", server.uri());

    mount_rapid_sources(
        &server,
        json!({"sources": [{"file": master, "type": "hls"}], "tracks": [], "encrypted": false}),
    )
    .await;
    mount_master(&server, "/hls/master.m3u8").await;

    let embed = EmbedReference::new(format!("{}/embed-2/e-1/{VIDEO_ID}", server.uri()));

    let result = rapidcloud(&server).extract(&embed).await.unwrap();

    let uri = server.uri();
    assert_eq!(
        vec![
            (format!("{uri}/hls/chunk720.m3u8"), "720p".to_string()),
            (format!("{uri}/hls/chunk360.m3u8"), "360p".to_string()),
            (master, "auto".to_string()),
        ],
        qualities(&result)
    );
}

#[test_log::test(tokio::test)]
async fn should_reject_malformed_key_document() {
    let server = MockServer::start().await;

    mount_rapid_sources(
        &server,
        json!({"sources": MC_PAYLOAD, "tracks": [], "encrypted": true}),
    )
    .await;
    mount_key_document(&server, "404: Not Found").await;

    let embed = EmbedReference::new(format!("{}/embed-2/e-1/{VIDEO_ID}", server.uri()));
    let res = rapidcloud(&server).extract(&embed).await;

    assert!(
        matches!(res, Err(ExtractError::ScriptPatternNotFound(_))),
        "{res:?}"
    );
}

fn vidcloud(host: String, alternative_host: String) -> VidCloudExtractor {
    VidCloudExtractor::new(VidCloudConfig {
        host,
        alternative_host,
        ..Default::default()
    })
}

#[test_log::test(tokio::test)]
async fn should_decrypt_and_expand_vidcloud_sources() {
    let server = MockServer::start().await;
    let master = format!("{}/hls/master.m3u8", server.uri());
    let manifest = json!([{"file": master, "type": "hls"}]).to_string();

    Mock::given(method("GET"))
        .and(path("/ajax/embed-4/getSources"))
        .and(query_param("id", VIDEO_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sources": recipe_payload(&manifest),
            "tracks": [],
            "encrypted": true
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/js/player/prod/e4-player.min.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "var a='q',b='r',c=1,d=2,e=3,f=4,g=h(0),k=7;const p=new URLSearchParams(location.search);{PLAYER_SCRIPT}"
        )))
        .mount(&server)
        .await;

    mount_master(&server, "/hls/master.m3u8").await;

    let embed = EmbedReference::new(format!("https://dokicloud.one/embed-4/{VIDEO_ID}?z="));
    let result = vidcloud(server.uri(), "http://127.0.0.1:9".into())
        .extract(&embed)
        .await
        .unwrap();

    let qualities: Vec<_> = result
        .sources
        .iter()
        .map(|s| s.quality.clone().unwrap_or_default())
        .collect();
    assert_eq!(vec!["720p", "360p", "auto"], qualities);
    assert_eq!(master, result.sources[2].url);
}

#[test_log::test(tokio::test)]
async fn should_use_alternative_vidcloud_host() {
    let server = MockServer::start().await;
    let master = format!("{}/hls/master.m3u8", server.uri());

    Mock::given(method("GET"))
        .and(path("/ajax/embed-4/getSources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sources": [{"file": master, "type": "hls"}],
            "tracks": [{"file": "https://vc.example/en.vtt", "label": "English", "kind": "captions"}]
        })))
        .mount(&server)
        .await;
    mount_master(&server, "/hls/master.m3u8").await;

    let embed = EmbedReference::new(format!("https://rabbitstream.net/embed-4/{VIDEO_ID}"))
        .alternative(true);
    let result = vidcloud("http://127.0.0.1:9".into(), server.uri())
        .extract(&embed)
        .await
        .unwrap();

    assert_eq!(3, result.sources.len());
    assert_eq!("English", result.subtitles[0].lang);
}
