use crate::entities::movie_rating_entity;
use crate::models::MovieResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitRatingRequest {
    #[schema(example = 4, minimum = 1, maximum = 5)]
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingResponse {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<movie_rating_entity::Model> for RatingResponse {
    fn from(m: movie_rating_entity::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            movie_id: m.movie_id,
            rating: m.rating,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// 单部电影的评分统计
/// - distribution / percentages 的 key 为星级 1..=5
/// - 尚无汇总行时 last_updated 为 null
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingStats {
    pub average_rating: f64,
    pub total_ratings: i64,
    #[schema(value_type = Object)]
    pub distribution: BTreeMap<u8, i64>,
    #[schema(value_type = Object)]
    pub percentages: BTreeMap<u8, f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieRatingView {
    pub movie_id: i64,
    pub stats: RatingStats,
    /// 当前登录用户的评分（未登录或未评分时为 null）
    pub user_rating: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitRatingResponse {
    pub rating: RatingResponse,
    pub created: bool,
    pub stats: RatingStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatedMovie {
    pub movie_id: i64,
    pub name: String,
    pub image: String,
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingHistoryItem {
    pub movie_id: i64,
    pub movie_name: String,
    pub movie_image: String,
    pub rating: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentRating {
    pub id: i64,
    pub username: String,
    pub movie_id: i64,
    pub movie_name: String,
    pub rating: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RatingTrendPoint {
    pub date: NaiveDate,
    pub average_rating: f64,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingCorrelation {
    pub movie: MovieResponse,
    pub average_rating: f64,
    pub total_ratings: i64,
    /// 订单明细中的购买次数
    pub purchase_count: i64,
    /// 带地区的购买事件数
    pub geographic_purchases: i64,
    pub rating_purchase_ratio: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingAnalyticsResponse {
    pub correlation: RatingCorrelation,
    pub weighted_average: f64,
    pub trends: Vec<RatingTrendPoint>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct RatingTrendsQuery {
    /// 趋势窗口天数，默认 30
    pub days: Option<i64>,
}
