//! ページング走査
//!
//! カテゴリごとに offset を `limit` ずつ進めて一覧APIを取得する。
//! 空ページでそのカテゴリを終了し、収集上限は各ページ取得の前に判定する。
//! 途中で上限を超えた分は最後に切り詰める。

use tracing::{debug, info, warn};

use crate::accumulator::DedupAccumulator;
use crate::api;
use crate::cap::{apply_cap, cap_reached};
use crate::config::{HarvestConfig, PageFailurePolicy};
use crate::error::HarvestError;
use crate::interrupt::{until_interrupted, InterruptSignal};
use crate::retry::{with_retries, RetryPolicy};
use crate::traits::Transport;
use crate::types::{parse_items, Item};

/// 走査の終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 全カテゴリを最後まで走査した
    Completed,
    CapReached,
    Interrupted,
}

#[derive(Debug)]
pub struct WalkOutcome {
    pub items: Vec<Item>,
    /// 取得に成功したページ数（空ページ含む）
    pub pages_fetched: usize,
    /// 取得失敗で打ち切ったカテゴリ
    pub skipped_categories: Vec<Option<i64>>,
    pub stop_reason: StopReason,
}

enum PageStep {
    Continue,
    EndOfCategory,
}

pub struct PaginationWalker<'a> {
    transport: &'a dyn Transport,
    config: &'a HarvestConfig,
    retry: RetryPolicy,
    interrupt: Option<InterruptSignal>,
}

impl<'a> PaginationWalker<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a HarvestConfig) -> Self {
        Self {
            transport,
            config,
            retry: RetryPolicy::from_config(config),
            interrupt: None,
        }
    }

    pub fn with_interrupt(mut self, interrupt: Option<InterruptSignal>) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(InterruptSignal::is_triggered)
            .unwrap_or(false)
    }

    async fn fetch_page(
        &self,
        category: Option<i64>,
        offset: u64,
    ) -> Option<Result<Vec<Item>, HarvestError>> {
        let url = api::listing_url(self.config, category, offset);
        debug!("Fetching page: {}", url);

        let fetched = until_interrupted(
            self.interrupt.as_ref(),
            with_retries(&self.retry, &url, || self.transport.fetch_json(&url)),
        )
        .await?;

        Some(fetched.map(|payload| parse_items(&payload, &self.config.base_url, &self.config.lang)))
    }

    /// カテゴリ列を順に走査する
    pub async fn walk(&self, categories: &[Option<i64>]) -> Result<WalkOutcome, HarvestError> {
        if self.config.page_size == 0 {
            return Err(HarvestError::InvalidConfig(
                "page_size は1以上が必要です".to_string(),
            ));
        }

        let cap = self.config.max_items;
        let limit = u64::from(self.config.page_size);

        let mut accumulator = DedupAccumulator::new();
        let mut pages_fetched = 0usize;
        let mut skipped_categories = Vec::new();
        let mut stop_reason = StopReason::Completed;

        'categories: for &category in categories {
            info!("Walking category {:?}", category);
            let mut offset = 0u64;

            loop {
                if cap_reached(accumulator.len(), cap) {
                    info!("Cap of {} items reached", cap);
                    stop_reason = StopReason::CapReached;
                    break 'categories;
                }
                if self.is_interrupted() {
                    stop_reason = StopReason::Interrupted;
                    break 'categories;
                }

                let page = match self.fetch_page(category, offset).await {
                    None => {
                        stop_reason = StopReason::Interrupted;
                        break 'categories;
                    }
                    Some(Ok(page)) => page,
                    Some(Err(e)) => match self.config.failure_policy {
                        PageFailurePolicy::Abort => return Err(e),
                        PageFailurePolicy::SkipCategory => {
                            warn!(
                                "Skipping rest of category {:?} at offset {}: {}",
                                category, offset, e
                            );
                            skipped_categories.push(category);
                            continue 'categories;
                        }
                    },
                };
                pages_fetched += 1;

                match self.absorb(&mut accumulator, category, offset, page) {
                    PageStep::EndOfCategory => break,
                    PageStep::Continue => {}
                }
                offset += limit;

                if !self.config.page_delay.is_zero() && !cap_reached(accumulator.len(), cap) {
                    let slept = until_interrupted(
                        self.interrupt.as_ref(),
                        tokio::time::sleep(self.config.page_delay),
                    )
                    .await;
                    if slept.is_none() {
                        stop_reason = StopReason::Interrupted;
                        break 'categories;
                    }
                }
            }
        }

        if stop_reason == StopReason::Interrupted {
            warn!(
                "Walk interrupted, returning {} items collected so far",
                accumulator.len()
            );
        }

        let mut items = accumulator.into_items();
        apply_cap(&mut items, cap);

        Ok(WalkOutcome {
            items,
            pages_fetched,
            skipped_categories,
            stop_reason,
        })
    }

    fn absorb(
        &self,
        accumulator: &mut DedupAccumulator,
        category: Option<i64>,
        offset: u64,
        page: Vec<Item>,
    ) -> PageStep {
        if page.is_empty() {
            info!("Category {:?}: empty page at offset {}, done", category, offset);
            return PageStep::EndOfCategory;
        }

        let received = page.len();
        let added = accumulator.add_page(page);
        info!(
            "Category {:?} offset {}: {} items ({} new, total {})",
            category,
            offset,
            received,
            added,
            accumulator.len()
        );
        PageStep::Continue
    }
}
