//! 评分计算（纯函数，不访问数据库）

use crate::entities::movie_rating_entity as ratings;
use crate::models::{RatingStats, RatingTrendPoint};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// 保留 `places` 位小数：按浮点数的精确十进制值舍入，恰好在中点时取偶
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// 一部电影全部评分的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: i64,
    /// 下标 0 对应 1 星
    pub distribution: [i64; 5],
}

impl RatingSummary {
    pub fn empty() -> Self {
        Self {
            average_rating: 0.0,
            total_ratings: 0,
            distribution: [0; 5],
        }
    }

    /// 由原始评分值计算；超出 1..=5 的值不计入分布，但计入均值
    pub fn from_ratings(values: &[i32]) -> Self {
        if values.is_empty() {
            return Self::empty();
        }

        let mut distribution = [0i64; 5];
        for &v in values {
            if (MIN_RATING..=MAX_RATING).contains(&v) {
                distribution[(v - 1) as usize] += 1;
            }
        }

        let total = values.len() as i64;
        let sum: i64 = values.iter().map(|&v| i64::from(v)).sum();

        Self {
            average_rating: round_to(sum as f64 / total as f64, 1),
            total_ratings: total,
            distribution,
        }
    }

    pub fn from_counts(average_rating: f64, total_ratings: i64, distribution: [i64; 5]) -> Self {
        Self {
            average_rating,
            total_ratings,
            distribution,
        }
    }

    pub fn into_stats(self, last_updated: Option<DateTime<Utc>>) -> RatingStats {
        let mut distribution = BTreeMap::new();
        let mut percentages = BTreeMap::new();
        for (idx, &count) in self.distribution.iter().enumerate() {
            let star = (idx + 1) as u8;
            distribution.insert(star, count);
            let pct = if self.total_ratings > 0 {
                round_to(count as f64 * 100.0 / self.total_ratings as f64, 1)
            } else {
                0.0
            };
            percentages.insert(star, pct);
        }

        RatingStats {
            average_rating: self.average_rating,
            total_ratings: self.total_ratings,
            distribution,
            percentages,
            last_updated,
        }
    }
}

/// 时间加权平均分：越新的评分权重越高，一年内线性衰减，最低 0.1
pub fn weighted_average(ratings: &[ratings::Model], now: DateTime<Utc>) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for r in ratings {
        let days_old = (now - r.created_at).num_days() as f64;
        let weight = (1.0 - days_old / 365.0).max(0.1);
        weighted_sum += f64::from(r.rating) * weight;
        total_weight += weight;
    }

    if total_weight > 0.0 {
        round_to(weighted_sum / total_weight, 1)
    } else {
        0.0
    }
}

/// 按自然日（UTC）统计最近 `days` 天的日均分，按日期升序
pub fn rating_trends(ratings: &[ratings::Model], now: DateTime<Utc>, days: i64) -> Vec<RatingTrendPoint> {
    let start = now - Duration::days(days);

    let mut daily: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for r in ratings
        .iter()
        .filter(|r| r.created_at >= start && r.created_at <= now)
    {
        let entry = daily.entry(r.created_at.date_naive()).or_insert((0, 0));
        entry.0 += i64::from(r.rating);
        entry.1 += 1;
    }

    daily
        .into_iter()
        .map(|(date, (sum, count))| RatingTrendPoint {
            date,
            average_rating: round_to(sum as f64 / count as f64, 1),
            count,
        })
        .collect()
}

/// 评分数 / 购买数，购买数至少按 1 计
pub fn rating_purchase_ratio(total_ratings: i64, purchase_count: i64) -> f64 {
    round_to(total_ratings as f64 / purchase_count.max(1) as f64, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(value: i32, created_at: DateTime<Utc>) -> ratings::Model {
        ratings::Model {
            id: 0,
            user_id: 1,
            movie_id: 1,
            rating: value,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_summary_of_no_ratings_is_zero() {
        let s = RatingSummary::from_ratings(&[]);
        assert_eq!(s, RatingSummary::empty());
        let stats = s.into_stats(None);
        assert_eq!(stats.distribution.values().sum::<i64>(), 0);
        assert_eq!(stats.percentages[&5], 0.0);
    }

    #[test]
    fn test_summary_average_and_distribution() {
        let s = RatingSummary::from_ratings(&[5, 4, 4, 1]);
        assert_eq!(s.total_ratings, 4);
        assert_eq!(s.average_rating, 3.5);
        assert_eq!(s.distribution, [1, 0, 0, 2, 1]);
    }

    #[test]
    fn test_summary_rounds_half_to_even() {
        // 3.25 -> 3.2, 3.75 -> 3.8
        assert_eq!(RatingSummary::from_ratings(&[3, 3, 3, 4]).average_rating, 3.2);
        assert_eq!(RatingSummary::from_ratings(&[3, 4, 4, 4]).average_rating, 3.8);
        // 10/3 = 3.333..
        assert_eq!(RatingSummary::from_ratings(&[3, 3, 4]).average_rating, 3.3);
    }

    #[test]
    fn test_summary_rounds_exact_float_value() {
        // 69 / 20 存为 3.4500000000000001776...
        let mut values = vec![3; 11];
        values.extend([4; 9]);
        assert_eq!(RatingSummary::from_ratings(&values).average_rating, 3.5);

        // 23 / 20 存为 1.1499999999999999112...
        let mut values = vec![1; 17];
        values.extend([2; 3]);
        assert_eq!(RatingSummary::from_ratings(&values).average_rating, 1.1);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(-1.05, 1), -1.1);
        assert_eq!(round_to(7.0, 1), 7.0);
    }

    #[test]
    fn test_percentages() {
        let stats = RatingSummary::from_ratings(&[5, 5, 4]).into_stats(None);
        assert_eq!(stats.percentages[&5], 66.7);
        assert_eq!(stats.percentages[&4], 33.3);
        assert_eq!(stats.percentages[&1], 0.0);
    }

    #[test]
    fn test_weighted_average_prefers_recent() {
        let now = Utc::now();
        let list = vec![rating(5, now), rating(1, now - Duration::days(300))];
        let w = weighted_average(&list, now);
        assert!(w > 3.0, "recent rating should dominate, got {w}");
        assert_eq!(weighted_average(&[], now), 0.0);
    }

    #[test]
    fn test_weighted_average_floor_weight() {
        let now = Utc::now();
        // 超过一年的评分权重为 0.1
        let list = vec![rating(5, now), rating(1, now - Duration::days(800))];
        assert_eq!(weighted_average(&list, now), round_to((5.0 + 0.1) / 1.1, 1));
    }

    #[test]
    fn test_rating_trends_groups_by_day() {
        let now = Utc::now();
        let yesterday = now - Duration::days(1);
        let list = vec![
            rating(4, now),
            rating(5, yesterday),
            rating(2, yesterday),
            rating(1, now - Duration::days(40)),
        ];
        let trends = rating_trends(&list, now, 30);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].date, yesterday.date_naive());
        assert_eq!(trends[0].count, 2);
        assert_eq!(trends[0].average_rating, 3.5);
        assert_eq!(trends[1].date, now.date_naive());
        assert_eq!(trends[1].average_rating, 4.0);
    }

    #[test]
    fn test_rating_purchase_ratio() {
        assert_eq!(rating_purchase_ratio(3, 0), 3.0);
        assert_eq!(rating_purchase_ratio(1, 3), 0.33);
        assert_eq!(rating_purchase_ratio(2, 3), 0.67);
    }
}
