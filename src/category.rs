//! カテゴリの解決
//!
//! 「全カテゴリ」はオプションAPIの `subcategories` から求める。
//! 0以下のIDと疑似カテゴリ（未分類・すべて）は除外し、昇順・重複なしで返す。

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, info};

use crate::api;
use crate::config::{CategorySelection, HarvestConfig};
use crate::error::HarvestError;
use crate::retry::{with_retries, RetryPolicy};
use crate::traits::Transport;
use crate::types::{parse_categories, Category};

/// 疑似カテゴリのID
pub const SENTINEL_CATEGORY_IDS: [i64; 2] = [998, 999];

/// オプションAPIを取得する。オブジェクト以外は空扱い
async fn fetch_options(
    transport: &dyn Transport,
    config: &HarvestConfig,
    policy: &RetryPolicy,
) -> Result<Value, HarvestError> {
    let url = api::options_url(&config.base_url);
    debug!("Fetching options: {}", url);
    let payload = with_retries(policy, &url, || transport.fetch_json(&url)).await?;
    Ok(if payload.is_object() {
        payload
    } else {
        Value::Object(Default::default())
    })
}

/// 走査対象として有効なカテゴリIDを昇順・重複なしで返す
pub fn filter_category_ids(categories: &[Category]) -> Vec<i64> {
    categories
        .iter()
        .filter_map(|c| c.id)
        .filter(|id| *id > 0 && !SENTINEL_CATEGORY_IDS.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 走査するカテゴリ列。`None` はカテゴリ指定なしを表す
pub async fn resolve_categories(
    transport: &dyn Transport,
    config: &HarvestConfig,
    policy: &RetryPolicy,
) -> Result<Vec<Option<i64>>, HarvestError> {
    let resolved = match &config.categories {
        CategorySelection::All => {
            let options = fetch_options(transport, config, policy).await?;
            let ids = filter_category_ids(&parse_categories(&options));
            info!("Resolved {} categories from options", ids.len());
            ids.into_iter().map(Some).collect()
        }
        CategorySelection::Explicit(ids) if !ids.is_empty() => {
            ids.iter().copied().map(Some).collect()
        }
        _ => vec![None],
    };
    Ok(resolved)
}

/// オプションAPIのサブカテゴリ一覧（フィルタなし）
pub async fn list_categories(
    transport: &dyn Transport,
    config: &HarvestConfig,
) -> Result<Vec<Category>, HarvestError> {
    let options = fetch_options(transport, config, &RetryPolicy::from_config(config)).await?;
    Ok(parse_categories(&options))
}
