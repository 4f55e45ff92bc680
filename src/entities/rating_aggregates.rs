use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 评分汇总表实体
/// 说明:
/// - 纯派生数据，任何时候都可以由 movie_ratings 全量重算
/// - 每次评分新增/修改/删除后整体重算，不做增量更新
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rating_aggregates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub movie_id: i64,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub rating_1_count: i64,
    pub rating_2_count: i64,
    pub rating_3_count: i64,
    pub rating_4_count: i64,
    pub rating_5_count: i64,
    pub last_updated: DateTime<Utc>,
}

impl Model {
    /// 各星级数量，下标 0 对应 1 星
    pub fn counts(&self) -> [i64; 5] {
        [
            self.rating_1_count,
            self.rating_2_count,
            self.rating_3_count,
            self.rating_4_count,
            self.rating_5_count,
        ]
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
