use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 地区热门榜快照，(movie_id, region_id, period_start) 唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "trending_movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub movie_id: i64,
    pub region_id: i64,
    pub purchase_count: i64,
    pub view_count: i64,
    pub trending_score: f64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
