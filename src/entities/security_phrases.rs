use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 密保问题，与用户一对一
/// 说明:
/// - answer 以明文保存，比较时忽略大小写
/// - 从不通过接口返回 answer
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "security_phrases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// 校验找回密码时提交的答案（去除首尾空白，忽略大小写）
    pub fn answer_matches(&self, submitted: &str) -> bool {
        submitted.trim().to_lowercase() == self.answer.to_lowercase()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
