#![allow(dead_code)]

use strumok_extractors::utils::crypto_js;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const SECRET_HEAD: &str = "k3yPart1Zq";
pub const SECRET_TAIL: &str = "Xw9Lm";
pub const SALT: [u8; 8] = [0x81, 0xb7, 0xeb, 0x2d, 0xfc, 0x27, 0xce, 0xae];

/// Operands `[2, 10, 20, 5, 40]`: 10 chars at 20, then 5 chars at 40 (+10).
pub const PLAYER_SCRIPT: &str = r#"var u=j(1),t='a';function x(){return 1};var Q='x',W=2,E=10,R=20,T=5,Y=40,U=j(5),I='abc';jwplayer().setup({});"#;

/// Same shape, second offset moved by one.
pub const STALE_PLAYER_SCRIPT: &str = r#"var u=j(1),t='a';function x(){return 1};var Q='x',W=2,E=10,R=21,T=5,Y=40,U=j(5),I='abc';jwplayer().setup({});"#;

pub const KEY_DOCUMENT: &str = "[[20,10],[40,5]]";

/// `[{"file":"https://mc.example.com/hls/ep1/master.m3u8","type":"hls"}]` with the
/// passphrase spliced in at the offsets of `PLAYER_SCRIPT`.
pub const MC_PAYLOAD: &str = "U2FsdGVkX1+Bt+st/CfOk3yPart1ZqrnDTRGFXxwl1UoU1P1fbXw9LmAR9efGnubLCna7y4RZ6emo9HDqOtdKcXeinqC+MGCfOnydJzEWYseOWc2oiFXsd9eGaRooqVGmG29mB16s+xGpM1";

/// `MC_PAYLOAD` without the passphrase.
pub const MC_CIPHERTEXT: &str = "U2FsdGVkX1+Bt+st/CfOrnDTRGFXxwl1UoU1P1fbAR9efGnubLCna7y4RZ6emo9HDqOtdKcXeinqC+MGCfOnydJzEWYseOWc2oiFXsd9eGaRooqVGmG29mB16s+xGpM1";

pub const MC_SOURCE: &str = "https://mc.example.com/hls/ep1/master.m3u8";

pub const MASTER_PLAYLIST: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
chunk720.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
chunk360.m3u8
";

pub fn passphrase() -> String {
    format!("{SECRET_HEAD}{SECRET_TAIL}")
}

/// Salted ciphertext of `plaintext` under the full passphrase.
pub fn password_ciphertext(plaintext: &str) -> String {
    crypto_js::encrypt_base64_aes(passphrase().as_bytes(), &SALT, plaintext.as_bytes()).unwrap()
}

/// Ciphertext with the passphrase spliced in the way `PLAYER_SCRIPT` describes.
pub fn recipe_payload(plaintext: &str) -> String {
    let ct = password_ciphertext(plaintext);
    format!(
        "{}{SECRET_HEAD}{}{SECRET_TAIL}{}",
        &ct[..20],
        &ct[20..40],
        &ct[40..]
    )
}

pub async fn mount_master(server: &MockServer, master_path: &str) {
    Mock::given(method("GET"))
        .and(path(master_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(MASTER_PLAYLIST))
        .mount(server)
        .await;
}

pub fn qualities(result: &strumok_extractors::ExtractResult) -> Vec<(String, String)> {
    result
        .sources
        .iter()
        .map(|s| (s.url.clone(), s.quality.clone().unwrap_or_default()))
        .collect()
}
