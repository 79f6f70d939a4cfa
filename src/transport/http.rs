use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{accept_language, parse_json_body, ACCEPT_JSON, USER_AGENT};
use crate::api;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, TransportError};
use crate::traits::Transport;

/// クッキー保持付きの直接HTTP経路
pub struct HttpTransport {
    client: Client,
    landing_url: String,
}

impl HttpTransport {
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let landing_url = api::landing_url(&config.base_url, &config.lang);

        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| HarvestError::InvalidConfig(format!("ヘッダー値 {:?}: {}", value, e)))
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(ACCEPT_LANGUAGE, header(&accept_language(&config.lang))?);
        headers.insert(REFERER, header(&landing_url)?);
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .gzip(true)
            .build()
            .map_err(|e| HarvestError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            landing_url,
        })
    }

    /// ページを1回GETしてクッキーを受け取る。結果は問わない
    pub async fn warm_up(&self, url: &str) {
        match self.client.get(url).send().await {
            Ok(resp) => debug!("Warm-up {} -> {}", url, resp.status()),
            Err(e) => warn!("Warm-up request failed (ignored): {}", e),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open(&mut self) -> Result<(), HarvestError> {
        info!("Opening HTTP session via {}", self.landing_url);
        self.warm_up(&self.landing_url).await;
        Ok(())
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let text = resp.text().await?;
        parse_json_body(status.as_u16(), &text)
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        debug!("HTTP session closed");
        Ok(())
    }
}
