use crate::entities::region_entity;
use crate::models::MovieResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegionResponse {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub population: i64,
}

impl From<region_entity::Model> for RegionResponse {
    fn from(m: region_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            code: m.code,
            latitude: m.latitude,
            longitude: m.longitude,
            population: m.population,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserRegionResponse {
    pub region: Option<RegionResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetUserRegionRequest {
    pub region_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingMovieResponse {
    pub movie: MovieResponse,
    pub purchase_count: i64,
    pub total_quantity: i64,
    pub trending_score: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegionTrendingResponse {
    pub region: RegionResponse,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub movies: Vec<TrendingMovieResponse>,
}

/// 已持久化的热门榜快照行
#[derive(Debug, Serialize, ToSchema)]
pub struct TrendingSnapshotItem {
    pub movie_id: i64,
    pub movie_name: String,
    pub purchase_count: i64,
    pub view_count: i64,
    pub trending_score: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}
