use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 购买事件，热门榜的源数据
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "movie_purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub movie_id: i64,
    pub user_id: i64,
    pub region_id: i64,
    pub purchase_date: DateTime<Utc>,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
