use std::collections::HashSet;

use crate::types::Item;

/// `id` で重複排除しつつ初出順を保つ収集バッファ。先勝ち
#[derive(Debug, Default)]
pub struct DedupAccumulator {
    items: Vec<Item>,
    seen: HashSet<i64>,
}

impl DedupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1ページ分を追加し、新規に加わった件数を返す
    pub fn add_page(&mut self, page: impl IntoIterator<Item = Item>) -> usize {
        let before = self.items.len();
        for item in page {
            if self.seen.insert(item.id) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.seen.contains(&id)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }
}
