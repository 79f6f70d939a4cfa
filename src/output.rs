//! 収集結果のファイル出力 (JSON / CSV)

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::HarvestError;
use crate::types::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

const CSV_HEADERS: [&str; 14] = [
    "id",
    "name",
    "brand_id",
    "brand_name",
    "provider_id",
    "product_id",
    "categories",
    "has_demo",
    "is_new",
    "is_promo",
    "is_hot",
    "image_path",
    "image_url",
    "canonical_url",
];

/// CSVの1行。categories はJSON文字列に平坦化する
#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    name: &'a str,
    brand_id: Option<i64>,
    brand_name: Option<&'a str>,
    provider_id: Option<i64>,
    product_id: Option<i64>,
    categories: String,
    has_demo: Option<bool>,
    is_new: Option<bool>,
    is_promo: Option<bool>,
    is_hot: Option<bool>,
    image_path: Option<&'a str>,
    image_url: Option<&'a str>,
    canonical_url: Option<&'a str>,
}

impl<'a> CsvRow<'a> {
    fn from_item(item: &'a Item) -> Result<Self, HarvestError> {
        Ok(Self {
            id: item.id,
            name: &item.name,
            brand_id: item.brand_id,
            brand_name: item.brand_name.as_deref(),
            provider_id: item.provider_id,
            product_id: item.product_id,
            categories: serde_json::to_string(&item.categories)?,
            has_demo: item.has_demo,
            is_new: item.is_new,
            is_promo: item.is_promo,
            is_hot: item.is_hot,
            image_path: item.image_path.as_deref(),
            image_url: item.image_url.as_deref(),
            canonical_url: item.canonical_url.as_deref(),
        })
    }
}

fn ensure_parent(path: &Path) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn write_json(path: &Path, items: &[Item]) -> Result<(), HarvestError> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Saved {} items to {}", items.len(), path.display());
    Ok(())
}

pub fn write_csv(path: &Path, items: &[Item]) -> Result<(), HarvestError> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(CSV_HEADERS)?;
    for item in items {
        writer.serialize(CsvRow::from_item(item)?)?;
    }
    writer.flush()?;
    info!("Saved {} items to {}", items.len(), path.display());
    Ok(())
}

pub fn write_items(path: &Path, format: OutputFormat, items: &[Item]) -> Result<(), HarvestError> {
    match format {
        OutputFormat::Json => write_json(path, items),
        OutputFormat::Csv => write_csv(path, items),
    }
}
