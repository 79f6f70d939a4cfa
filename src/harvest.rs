//! 収集実行（カテゴリ解決 → ページング走査）

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use crate::api;
use crate::category::resolve_categories;
use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::interrupt::{until_interrupted, InterruptSignal};
use crate::retry::{with_retries, RetryPolicy};
use crate::traits::Transport;
use crate::types::Item;
use crate::walker::{PaginationWalker, StopReason};

/// 1回の収集実行の結果
#[derive(Debug)]
pub struct HarvestReport {
    pub items: Vec<Item>,
    /// 走査したカテゴリ（`None` はカテゴリ指定なし）
    pub categories: Vec<Option<i64>>,
    pub pages_fetched: usize,
    pub skipped_categories: Vec<Option<i64>>,
    pub stop_reason: StopReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl HarvestReport {
    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// セッション確立済みの取得経路で収集を実行する。
///
/// 1ページも取得しないうちに中断された場合は `HarvestError::Interrupted`
pub async fn harvest(
    transport: &dyn Transport,
    config: &HarvestConfig,
    interrupt: Option<InterruptSignal>,
) -> Result<HarvestReport, HarvestError> {
    let started_at = Utc::now();
    let policy = RetryPolicy::from_config(config);

    let categories = until_interrupted(
        interrupt.as_ref(),
        resolve_categories(transport, config, &policy),
    )
    .await
    .ok_or(HarvestError::Interrupted)??;
    info!(
        "Harvesting via {} over {} category slot(s)",
        transport.name(),
        categories.len()
    );

    let outcome = PaginationWalker::new(transport, config)
        .with_interrupt(interrupt)
        .walk(&categories)
        .await?;

    if outcome.stop_reason == StopReason::Interrupted && outcome.pages_fetched == 0 {
        return Err(HarvestError::Interrupted);
    }

    let report = HarvestReport {
        items: outcome.items,
        categories,
        pages_fetched: outcome.pages_fetched,
        skipped_categories: outcome.skipped_categories,
        stop_reason: outcome.stop_reason,
        started_at,
        finished_at: Utc::now(),
    };

    info!(
        "Harvest finished: {} items, {} pages, stop={:?}",
        report.items.len(),
        report.pages_fetched,
        report.stop_reason
    );
    Ok(report)
}

/// デモ起動リンクを取得する
pub async fn demo_link(
    transport: &dyn Transport,
    config: &HarvestConfig,
    game_id: i64,
) -> Result<String, HarvestError> {
    let url = api::demo_link_url(&config.base_url, game_id);
    let policy = RetryPolicy::from_config(config);
    let payload = with_retries(&policy, &url, || transport.fetch_json(&url)).await?;

    match payload.get("link") {
        Some(Value::String(link)) if !link.is_empty() => Ok(link.clone()),
        _ => Err(HarvestError::InvalidResponse(format!(
            "デモリンクが見つかりません: game_id={}",
            game_id
        ))),
    }
}
