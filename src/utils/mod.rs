pub mod cipher_mode;
pub mod crypto;
pub mod crypto_js;
pub mod hls;
pub mod jwp_player;
pub mod key_recipe;
pub mod script_vars;
pub mod text;

use std::{collections::HashMap, sync::OnceLock, time::Duration};

use reqwest::{
    ClientBuilder, IntoUrl, RequestBuilder,
    header::{self, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;

use crate::error::Result;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0"
}

/// Process-wide client, so every extractor shares one connection pool.
pub fn create_client() -> &'static reqwest::Client {
    static LAZZY_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    LAZZY_CLIENT.get_or_init(|| {
        create_client_builder()
            .default_headers(get_default_headers())
            .build()
            .unwrap_or_default()
    })
}

pub fn create_client_builder() -> reqwest::ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(5))
        .user_agent(get_user_agent())
        .cookie_store(true)
}

pub fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::default();

    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers
}

/// Per-extractor request settings. Requests are never retried.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Sent with every request of the provider.
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: get_user_agent().into(),
            headers: HashMap::new(),
        }
    }
}

impl HttpConfig {
    pub fn get(&self, url: impl IntoUrl) -> RequestBuilder {
        let request_builder = create_client()
            .get(url)
            .timeout(self.timeout)
            .header(header::USER_AGENT, &self.user_agent);

        with_headers(request_builder, &self.headers)
    }

    /// GET for the providers' `getSources`/`encrypt-ajax` endpoints.
    pub fn ajax(&self, url: impl IntoUrl, referer: &str) -> RequestBuilder {
        self.get(url)
            .header(header::ACCEPT, "*/*")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::REFERER, referer)
    }
}

pub fn with_headers(
    mut request_builder: RequestBuilder,
    headers: &HashMap<String, String>,
) -> RequestBuilder {
    for (name, value) in headers {
        request_builder = request_builder.header(name.as_str(), value.as_str());
    }
    request_builder
}

pub async fn fetch_text(request_builder: RequestBuilder) -> Result<String> {
    let text = request_builder
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    Ok(text)
}

pub async fn fetch_json<T: DeserializeOwned>(request_builder: RequestBuilder) -> Result<T> {
    let text = fetch_text(request_builder).await?;
    Ok(serde_json::from_str(&text)?)
}
