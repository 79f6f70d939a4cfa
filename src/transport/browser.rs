use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{parse_json_body, USER_AGENT};
use crate::api;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, TransportError};
use crate::traits::Transport;

/// ページ内 fetch の戻り値
#[derive(Debug, Deserialize)]
struct FetchPayload {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    text: String,
}

impl FetchPayload {
    /// 200以外・空本文は失敗
    fn into_json(self) -> Result<Value, TransportError> {
        if self.status != 200 {
            return Err(TransportError::Status {
                status: self.status,
            });
        }
        parse_json_body(self.status, &self.text)
    }
}

/// ページ内で実行する fetch。HTTPエラーでも例外にならないので status を返す
fn fetch_script(url: &str) -> Result<String, TransportError> {
    let url = serde_json::to_string(url).map_err(|e| TransportError::JavaScript(e.to_string()))?;
    Ok(format!(
        r#"
        (async () => {{
            const res = await fetch({url}, {{
                method: 'GET',
                credentials: 'include',
                headers: {{
                    'accept': 'application/json, text/plain, */*',
                    'x-requested-with': 'XMLHttpRequest'
                }}
            }});
            const status = res.status;
            const text = await res.text();
            return {{ status, text }};
        }})()
        "#
    ))
}

/// ブラウザのページコンテキストから取得する経路
pub struct BrowserTransport {
    config: HarvestConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserTransport {
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler: None,
        }
    }

    fn get_page(&self) -> Result<&Page, TransportError> {
        self.page.as_ref().ok_or(TransportError::NotOpen)
    }

    async fn launch(&mut self) -> Result<(), HarvestError> {
        info!("Launching browser...");

        let mut builder = BrowserConfig::builder()
            .window_size(1280, 800)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg(format!("--user-agent={}", USER_AGENT))
            .arg(format!("--lang={}", self.config.lang))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if let Ok(path) = std::env::var("CHROME_PATH").or_else(|_| std::env::var("CHROMIUM_PATH")) {
            builder = builder.chrome_executable(path);
        }

        if !self.config.headless {
            builder = builder.with_head();
        }

        if self.config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder.build().map_err(HarvestError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| HarvestError::BrowserInit(e.to_string()))?;

        // ハンドラータスクを起動
        self.handler = Some(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        }));
        self.browser = Some(browser);
        Ok(())
    }

    async fn navigate_to_landing(&mut self) -> Result<(), HarvestError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| HarvestError::BrowserInit("Browser not initialized".to_string()))?;
        let landing_url = api::landing_url(&self.config.base_url, &self.config.lang);

        info!("Navigating to {}", landing_url);
        let page = browser
            .new_page(landing_url.as_str())
            .await
            .map_err(|e| HarvestError::Navigation(e.to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| HarvestError::Navigation(e.to_string()))?;

        // デバッグスクリーンショット
        if self.config.debug {
            if let Ok(screenshot) = page
                .screenshot(ScreenshotParams::builder().full_page(true).build())
                .await
            {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
                debug!("Landing screenshot: data:image/png;base64,{}", encoded);
            }
        }

        self.page = Some(page);
        Ok(())
    }
}

#[async_trait]
impl Transport for BrowserTransport {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn open(&mut self) -> Result<(), HarvestError> {
        if self.page.is_some() {
            return Ok(());
        }
        if self.browser.is_none() {
            self.launch().await?;
        }
        self.navigate_to_landing().await?;
        info!("Browser session ready");
        Ok(())
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        let page = self.get_page()?;
        let script = fetch_script(url)?;
        debug!("page fetch {}", url);

        let result = tokio::time::timeout(self.config.request_timeout, page.evaluate(script.as_str()))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!(
                    "{}s以内に応答がありません",
                    self.config.request_timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| TransportError::JavaScript(e.to_string()))?;

        let payload: FetchPayload = result
            .into_value()
            .map_err(|e| TransportError::JavaScript(e.to_string()))?;

        payload.into_json()
    }

    async fn close(&mut self) -> Result<(), HarvestError> {
        info!("Closing browser...");

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("Failed to close browser: {}", e);
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        info!("Browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_transport_new() {
        let transport = BrowserTransport::new(HarvestConfig::default());
        assert!(transport.browser.is_none());
        assert!(transport.page.is_none());
        assert_eq!(transport.name(), "browser");
    }

    #[test]
    fn test_fetch_script_escapes_url() {
        let script = fetch_script("https://x/api?a=1&t=it's \"q\"").unwrap();
        assert!(script.contains(r#"fetch("https://x/api?a=1&t=it's \"q\"", {"#));
        assert!(script.contains("credentials: 'include'"));
    }

    #[test]
    fn test_payload_rejects_non_200_even_with_body() {
        let payload: FetchPayload =
            serde_json::from_value(serde_json::json!({"status": 404, "text": "{\"games\":[]}"}))
                .unwrap();
        assert_eq!(payload.into_json(), Err(TransportError::Status { status: 404 }));
    }

    #[test]
    fn test_payload_rejects_empty_body() {
        let payload = FetchPayload {
            status: 200,
            text: String::new(),
        };
        assert_eq!(
            payload.into_json(),
            Err(TransportError::EmptyBody { status: 200 })
        );
    }

    #[test]
    fn test_payload_missing_fields_defaults_to_failure() {
        let payload: FetchPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(payload.into_json(), Err(TransportError::Status { status: 0 }));
    }

    #[test]
    fn test_payload_parses_json_on_200() {
        let payload = FetchPayload {
            status: 200,
            text: r#"{"games":[{"id":1}]}"#.to_string(),
        };
        assert_eq!(
            payload.into_json().unwrap(),
            serde_json::json!({"games": [{"id": 1}]})
        );
    }

    #[tokio::test]
    async fn test_fetch_before_open_fails() {
        let transport = BrowserTransport::new(HarvestConfig::default());
        assert_eq!(
            transport.fetch_json("https://x/api").await,
            Err(TransportError::NotOpen)
        );
    }

    #[tokio::test]
    #[ignore] // 実環境テスト用: ブラウザが必要
    async fn test_live_browser_fetch() {
        let config = HarvestConfig::default();
        let mut transport = BrowserTransport::new(config.clone());
        transport.open().await.unwrap();
        let payload = transport
            .fetch_json(&api::options_url(&config.base_url))
            .await
            .unwrap();
        assert!(payload.get("subcategories").is_some());
        transport.close().await.unwrap();
    }
}
