//! 取得経路の実装
//!
//! - `HttpTransport`: reqwest によるクッキー保持付きの直接HTTP
//! - `BrowserTransport`: ブラウザのページ内で `fetch()` を実行

mod browser;
mod http;

pub use browser::BrowserTransport;
pub use http::HttpTransport;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::{HarvestConfig, TransportMode};
use crate::error::{HarvestError, TransportError};
use crate::traits::Transport;

/// ブラウザと同じ User-Agent
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";

pub fn accept_language(lang: &str) -> String {
    format!("{lang},{lang};q=0.9,en;q=0.8")
}

/// レスポンス本文をJSONとして解釈する。空文字は失敗扱い
pub(crate) fn parse_json_body(status: u16, text: &str) -> Result<Value, TransportError> {
    if text.is_empty() {
        return Err(TransportError::EmptyBody { status });
    }
    serde_json::from_str(text).map_err(|e| TransportError::InvalidJson(e.to_string()))
}

/// 設定に応じた取得経路を作成し、セッションを確立する
pub async fn connect(config: &HarvestConfig) -> Result<Box<dyn Transport>, HarvestError> {
    let mut transport: Box<dyn Transport> = match config.mode {
        TransportMode::Http => Box::new(HttpTransport::new(config)?),
        TransportMode::Browser => Box::new(BrowserTransport::new(config.clone())),
        TransportMode::Auto => {
            let mut browser = BrowserTransport::new(config.clone());
            match browser.open().await {
                Ok(()) => {
                    info!("Auto mode: using browser transport");
                    return Ok(Box::new(browser));
                }
                Err(e) => {
                    warn!("Auto mode: browser unavailable ({}), falling back to HTTP", e);
                    browser.close().await?;
                    Box::new(HttpTransport::new(config)?)
                }
            }
        }
    };

    transport.open().await?;
    info!("Transport ready: {}", transport.name());
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_body() {
        assert_eq!(
            parse_json_body(200, ""),
            Err(TransportError::EmptyBody { status: 200 })
        );
        assert!(matches!(
            parse_json_body(200, "<html>"),
            Err(TransportError::InvalidJson(_))
        ));
        assert_eq!(
            parse_json_body(200, r#"{"games":[]}"#).unwrap(),
            serde_json::json!({"games": []})
        );
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(accept_language("fr"), "fr,fr;q=0.9,en;q=0.8");
    }
}
