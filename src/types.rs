//! カタログ関連の型定義と、上流JSONからの変換

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api;

/// カタログの1エントリ（ゲーム）。`id` が同一性のキー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub brand_id: Option<i64>,
    pub brand_name: Option<String>,
    pub provider_id: Option<i64>,
    pub product_id: Option<i64>,
    pub categories: Vec<i64>,
    pub has_demo: Option<bool>,
    pub is_new: Option<bool>,
    pub is_promo: Option<bool>,
    pub is_hot: Option<bool>,
    /// 上流の `img`
    pub image_path: Option<String>,
    pub image_url: Option<String>,
    pub canonical_url: Option<String>,
}

/// サブカテゴリ（実行中のみ使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "parentId")]
    pub parent_id: Option<i64>,
}

/// 整数への寛容な変換。変換できなければ None
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// 真偽値フラグ。null/欠落は None、それ以外は値の真偽で判定
pub fn coerce_flag(value: Option<&Value>) -> Option<bool> {
    let value = value?;
    Some(match value {
        Value::Null => return None,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    matches!(coerce_flag(Some(value)), None | Some(false))
}

fn parse_item(obj: &serde_json::Map<String, Value>, base_url: &str, lang: &str) -> Option<Item> {
    let id = obj.get("id").and_then(coerce_int)?;

    let name = obj
        .get("name")
        .filter(|v| !is_falsy(v))
        .map(value_to_string)
        .unwrap_or_default();

    let image_path = obj
        .get("img")
        .filter(|v| !v.is_null())
        .map(value_to_string);
    let image_url = match obj.get("img") {
        Some(Value::String(img)) if img.starts_with('/') => Some(format!("{}{}", base_url, img)),
        _ => None,
    };

    let categories = obj
        .get("categories")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(coerce_int).collect())
        .unwrap_or_default();

    Some(Item {
        id,
        name,
        brand_id: obj.get("brandId").and_then(coerce_int),
        brand_name: obj
            .get("brandName")
            .filter(|v| !v.is_null())
            .map(value_to_string),
        provider_id: obj.get("provider_id").and_then(coerce_int),
        product_id: obj.get("product_id").and_then(coerce_int),
        categories,
        has_demo: coerce_flag(obj.get("has_demo")),
        is_new: coerce_flag(obj.get("is_new")),
        is_promo: coerce_flag(obj.get("is_promo")),
        is_hot: coerce_flag(obj.get("is_hot")),
        image_path,
        image_url,
        canonical_url: Some(api::game_page_url(base_url, lang, id)),
    })
}

/// 一覧APIのレスポンスから `games` を取り出して変換する。
/// 有効な `id` を持たない要素は黙って捨てる
pub fn parse_items(payload: &Value, base_url: &str, lang: &str) -> Vec<Item> {
    let base_url = base_url.trim_end_matches('/');
    payload
        .get("games")
        .and_then(Value::as_array)
        .map(|games| {
            games
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|obj| parse_item(obj, base_url, lang))
                .collect()
        })
        .unwrap_or_default()
}

/// オプションAPIのレスポンスから `subcategories` を取り出す（フィルタなし）
pub fn parse_categories(payload: &Value) -> Vec<Category> {
    payload
        .get("subcategories")
        .and_then(Value::as_array)
        .map(|subs| {
            subs.iter()
                .filter_map(Value::as_object)
                .map(|obj| Category {
                    id: obj.get("id").and_then(coerce_int),
                    name: ["name", "title", "caption"]
                        .iter()
                        .filter_map(|key| obj.get(*key))
                        .find(|v| !is_falsy(v))
                        .map(value_to_string),
                    parent_id: obj.get("parentId").and_then(coerce_int),
                })
                .collect()
        })
        .unwrap_or_default()
}
