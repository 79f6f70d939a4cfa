//! ゲームカタログ収集ライブラリ
//!
//! - 一覧APIをカテゴリごとにページング取得
//! - 直接HTTP / ブラウザ内fetch の2経路（`Transport` トレイト）
//! - リトライ・重複排除・収集上限
//!
//! # 使用例
//!
//! ```rust,ignore
//! use game_harvester::{CategorySelection, HarvestConfig, HarvestRequest, HarvestService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = HarvestConfig::new("https://melbet-tn.com", "en")
//!         .with_categories(CategorySelection::All)
//!         .with_max_items(500);
//!
//!     let mut service = HarvestService::new();
//!     let report = service.call(HarvestRequest::new(config)).await.unwrap();
//!     println!("games: {}", report.items.len());
//! }
//! ```

pub mod accumulator;
pub mod api;
pub mod cap;
pub mod category;
pub mod config;
pub mod error;
pub mod harvest;
pub mod interrupt;
pub mod output;
pub mod retry;
pub mod service;
pub mod traits;
pub mod transport;
pub mod types;
pub mod walker;

#[cfg(test)]
pub(crate) mod testing;

// 主要な型をリエクスポート
pub use accumulator::DedupAccumulator;
pub use config::{CategorySelection, HarvestConfig, PageFailurePolicy, TransportMode};
pub use error::{HarvestError, TransportError};
pub use harvest::{demo_link, harvest, HarvestReport};
pub use interrupt::InterruptSignal;
pub use output::{write_items, OutputFormat};
pub use retry::{with_retries, RetryPolicy};
pub use service::{HarvestRequest, HarvestService};
pub use traits::Transport;
pub use transport::{BrowserTransport, HttpTransport};
pub use types::{Category, Item};
pub use walker::{PaginationWalker, StopReason, WalkOutcome};
