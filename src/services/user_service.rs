use crate::entities::{security_phrase_entity as phrases, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::region_service::find_user_region;
use crate::utils::validate_text_length;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, Set,
};

pub const QUESTION_MIN_LENGTH: usize = 10;
pub const QUESTION_MAX_LENGTH: usize = 200;
pub const ANSWER_MIN_LENGTH: usize = 3;
pub const ANSWER_MAX_LENGTH: usize = 100;

/// 校验用户为管理员（staff），否则返回 PermissionDenied
pub(crate) async fn require_staff<C: ConnectionTrait>(db: &C, user_id: i64) -> AppResult<users::Model> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::AuthError("User not found".to_string()))?;
    if !user.is_staff {
        return Err(AppError::PermissionDenied);
    }
    Ok(user)
}

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn ensure_staff(&self, user_id: i64) -> AppResult<users::Model> {
        require_staff(&self.pool, user_id).await
    }

    /// 个人资料：用户信息 + 是否设置密保 + 所属地区
    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let user = self.get_user(user_id).await?;
        let has_security_phrase = self.find_phrase(user_id).await?.is_some();
        let region = find_user_region(&self.pool, user_id).await?.map(Into::into);

        Ok(ProfileResponse {
            user: user.into(),
            has_security_phrase,
            region,
        })
    }

    /// 读取密保问题；未设置时返回 None（不会自动创建空记录）
    pub async fn get_security_phrase(&self, user_id: i64) -> AppResult<Option<SecurityPhraseResponse>> {
        Ok(self.find_phrase(user_id).await?.map(Into::into))
    }

    /// 设置或更新密保（一对一）
    pub async fn set_security_phrase(
        &self,
        user_id: i64,
        request: SecurityPhraseRequest,
    ) -> AppResult<SecurityPhraseResponse> {
        let question = validate_text_length(
            &request.question,
            "Security question",
            QUESTION_MIN_LENGTH,
            QUESTION_MAX_LENGTH,
        )?;
        let answer = validate_text_length(
            &request.answer,
            "Security answer",
            ANSWER_MIN_LENGTH,
            ANSWER_MAX_LENGTH,
        )?;

        let now = Utc::now();
        let saved = match self.find_phrase(user_id).await? {
            Some(existing) => {
                let mut am = existing.into_active_model();
                am.question = Set(question);
                am.answer = Set(answer);
                am.updated_at = Set(now);
                am.update(&self.pool).await?
            }
            None => {
                phrases::ActiveModel {
                    user_id: Set(user_id),
                    question: Set(question),
                    answer: Set(answer),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?
            }
        };

        Ok(saved.into())
    }

    async fn find_phrase(&self, user_id: i64) -> AppResult<Option<phrases::Model>> {
        Ok(phrases::Entity::find()
            .filter(phrases::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, insert_user};

    fn phrase(question: &str, answer: &str) -> SecurityPhraseRequest {
        SecurityPhraseRequest {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    #[tokio::test]
    async fn test_security_phrase_upsert() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = UserService::new(db.clone());

        assert!(svc.get_security_phrase(user.id).await.unwrap().is_none());
        // 读取不会创建记录
        assert_eq!(phrases::Entity::find().all(&db).await.unwrap().len(), 0);

        svc.set_security_phrase(user.id, phrase("  Name of my first cat?  ", "Tom"))
            .await
            .unwrap();
        let updated = svc
            .set_security_phrase(user.id, phrase("City where I was born?", "Boston"))
            .await
            .unwrap();
        assert_eq!(updated.question, "City where I was born?");

        let rows = phrases::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].answer, "Boston");
    }

    #[tokio::test]
    async fn test_security_phrase_length_rules() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = UserService::new(db);

        assert!(svc.set_security_phrase(user.id, phrase("Short?", "Tom")).await.is_err());
        assert!(
            svc.set_security_phrase(user.id, phrase("Name of my first cat?", " ab "))
                .await
                .is_err()
        );
        let long_question = "q".repeat(QUESTION_MAX_LENGTH + 1);
        assert!(svc.set_security_phrase(user.id, phrase(&long_question, "Tom")).await.is_err());
    }

    #[tokio::test]
    async fn test_profile_and_staff_check() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let admin = insert_user(&db, "admin", true).await;
        let svc = UserService::new(db);

        let profile = svc.get_profile(user.id).await.unwrap();
        assert_eq!(profile.user.username, "norma");
        assert!(!profile.has_security_phrase);
        assert!(profile.region.is_none());

        assert!(matches!(
            svc.ensure_staff(user.id).await.unwrap_err(),
            AppError::PermissionDenied
        ));
        assert!(svc.ensure_staff(admin.id).await.is_ok());
    }
}
