use crate::entities::{movie_entity, review_entity};
use crate::models::RatingStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MovieResponse {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub description: String,
    pub image: String,
}

impl From<movie_entity::Model> for MovieResponse {
    fn from(m: movie_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            price: m.price,
            description: m.description,
            image: m.image,
        }
    }
}

/// 列表项：电影 + 评分摘要
#[derive(Debug, Serialize, ToSchema)]
pub struct MovieListItem {
    #[serde(flatten)]
    pub movie: MovieResponse,
    pub average_rating: f64,
    pub total_ratings: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovieDetailResponse {
    pub movie: MovieResponse,
    pub rating_stats: RatingStats,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct MovieQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMovieRequest {
    #[schema(example = "Sunset Boulevard")]
    pub name: String,
    #[schema(example = 12)]
    pub price: i64,
    pub description: String,
    #[schema(example = "movie_images/sunset.jpg")]
    pub image: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMovieRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewRequest {
    #[schema(example = "A masterpiece of noir.")]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub username: String,
    pub comment: String,
    pub date: DateTime<Utc>,
}

impl ReviewResponse {
    pub fn from_model(m: review_entity::Model, username: String) -> Self {
        Self {
            id: m.id,
            movie_id: m.movie_id,
            user_id: m.user_id,
            username,
            comment: m.comment,
            date: m.date,
        }
    }
}
