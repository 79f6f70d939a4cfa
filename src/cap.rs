//! 収集上限の判定

/// 上限に達したか。`cap == 0` は無制限
pub fn cap_reached(current: usize, cap: usize) -> bool {
    cap > 0 && current >= cap
}

/// 最終結果を上限件数に切り詰める（順序は維持）
pub fn apply_cap<T>(items: &mut Vec<T>, cap: usize) {
    if cap > 0 {
        items.truncate(cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_reached() {
        assert!(!cap_reached(0, 0));
        assert!(!cap_reached(10_000, 0));
        assert!(!cap_reached(4, 5));
        assert!(cap_reached(5, 5));
        assert!(cap_reached(7, 5));
    }

    #[test]
    fn test_apply_cap() {
        let mut items = vec![1, 2, 3, 4];
        apply_cap(&mut items, 0);
        assert_eq!(items, vec![1, 2, 3, 4]);

        apply_cap(&mut items, 10);
        assert_eq!(items.len(), 4);

        apply_cap(&mut items, 2);
        assert_eq!(items, vec![1, 2]);
    }
}
