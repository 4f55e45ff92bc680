//! 地区热门榜排序（纯函数）

use crate::entities::movie_purchase_entity as purchases;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingEntry {
    pub movie_id: i64,
    pub purchase_count: i64,
    pub total_quantity: i64,
    pub trending_score: f64,
}

/// 按电影聚合购买记录并排序
/// - 分组顺序为首次出现的顺序
/// - score = purchase_count * total_quantity
/// - 稳定排序（分数相同保持首次出现顺序），截取前 `limit` 个
pub fn rank_trending(purchases: &[purchases::Model], limit: usize) -> Vec<TrendingEntry> {
    let mut entries: Vec<TrendingEntry> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for p in purchases {
        let idx = *index.entry(p.movie_id).or_insert_with(|| {
            entries.push(TrendingEntry {
                movie_id: p.movie_id,
                purchase_count: 0,
                total_quantity: 0,
                trending_score: 0.0,
            });
            entries.len() - 1
        });
        let entry = &mut entries[idx];
        entry.purchase_count += 1;
        entry.total_quantity += i64::from(p.quantity);
    }

    for e in entries.iter_mut() {
        e.trending_score = (e.purchase_count * e.total_quantity) as f64;
    }

    entries.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn purchase(id: i64, movie_id: i64, quantity: i32) -> purchases::Model {
        purchases::Model {
            id,
            movie_id,
            user_id: 1,
            region_id: 1,
            purchase_date: Utc::now(),
            quantity,
        }
    }

    #[test]
    fn test_score_is_count_times_quantity() {
        let list = vec![
            purchase(1, 10, 2),
            purchase(2, 20, 1),
            purchase(3, 10, 3),
        ];
        let ranked = rank_trending(&list, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].movie_id, 10);
        assert_eq!(ranked[0].purchase_count, 2);
        assert_eq!(ranked[0].total_quantity, 5);
        assert_eq!(ranked[0].trending_score, 10.0);
        assert_eq!(ranked[1].trending_score, 1.0);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let list = vec![
            purchase(1, 30, 2),
            purchase(2, 10, 2),
            purchase(3, 20, 2),
        ];
        let ranked: Vec<i64> = rank_trending(&list, 10).iter().map(|e| e.movie_id).collect();
        assert_eq!(ranked, vec![30, 10, 20]);
    }

    #[test]
    fn test_limit_truncates() {
        let list: Vec<_> = (1..=5).map(|i| purchase(i, i, i as i32)).collect();
        let ranked = rank_trending(&list, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].movie_id, 5);
        assert_eq!(ranked[1].movie_id, 4);
        assert!(rank_trending(&[], 10).is_empty());
    }
}
