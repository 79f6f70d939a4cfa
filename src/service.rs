use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{info, warn};

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::harvest::{harvest, HarvestReport};
use crate::interrupt::{until_interrupted, InterruptSignal};
use crate::transport;

/// 収集リクエスト
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub config: HarvestConfig,
    pub interrupt: Option<InterruptSignal>,
}

impl HarvestRequest {
    pub fn new(config: HarvestConfig) -> Self {
        Self {
            config,
            interrupt: None,
        }
    }

    pub fn with_interrupt(mut self, interrupt: InterruptSignal) -> Self {
        self.interrupt = Some(interrupt);
        self
    }
}

impl From<HarvestConfig> for HarvestRequest {
    fn from(config: HarvestConfig) -> Self {
        Self::new(config)
    }
}

/// tower::Serviceを実装した収集サービス。
/// 取得経路の作成 → 収集 → 解放 を1リクエストで行う
#[derive(Debug, Clone, Default)]
pub struct HarvestService {}

impl HarvestService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<HarvestRequest> for HarvestService {
    type Response = HarvestReport;
    type Error = HarvestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HarvestRequest) -> Self::Future {
        info!(
            "収集リクエスト受信: base_url={}, mode={:?}",
            req.config.base_url, req.config.mode
        );

        Box::pin(async move {
            let HarvestRequest { config, interrupt } = req;

            // セッション確立中の中断も受け付ける
            let mut transport = until_interrupted(interrupt.as_ref(), transport::connect(&config))
                .await
                .ok_or(HarvestError::Interrupted)??;

            let result = harvest(transport.as_ref(), &config, interrupt).await;

            if let Err(e) = transport.close().await {
                warn!("取得経路の解放に失敗: {}", e);
            }

            if let Ok(report) = &result {
                info!(
                    "収集完了: items={}, pages={}, stop={:?}",
                    report.items.len(),
                    report.pages_fetched,
                    report.stop_reason
                );
            }
            result
        })
    }
}
