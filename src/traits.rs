use async_trait::async_trait;
use serde_json::Value;

use crate::error::{HarvestError, TransportError};

/// 「URLのJSONを取得する」1操作を提供する取得経路
#[async_trait]
pub trait Transport: Send + Sync {
    /// 経路名（ログ用）
    fn name(&self) -> &'static str;

    /// セッション確立（ウォームアップ / ページ遷移）。実行ごとに1回
    async fn open(&mut self) -> Result<(), HarvestError>;

    /// 1回分の取得。リトライは呼び出し側
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), HarvestError>;
}
