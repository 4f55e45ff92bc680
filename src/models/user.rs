use crate::entities::{security_phrase_entity, user_entity};
use crate::models::RegionResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[schema(example = "moviefan")]
    pub username: String,
    #[schema(example = "sunset-boulevard")]
    pub password1: String,
    #[schema(example = "sunset-boulevard")]
    pub password2: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "moviefan")]
    pub username: String,
    #[schema(example = "sunset-boulevard")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            is_staff: m.is_staff,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub has_security_phrase: bool,
    pub region: Option<RegionResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityPhraseRequest {
    #[schema(example = "What was the first film you saw in a cinema?")]
    pub question: String,
    #[schema(example = "Jaws")]
    pub answer: String,
}

/// 密保问题（不包含答案）
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityPhraseResponse {
    pub question: String,
    pub updated_at: DateTime<Utc>,
}

impl From<security_phrase_entity::Model> for SecurityPhraseResponse {
    fn from(m: security_phrase_entity::Model) -> Self {
        Self {
            question: m.question,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[schema(example = "moviefan")]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordResponse {
    pub reset_token: Uuid,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct SecurityQuestionQuery {
    pub reset_token: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityQuestionResponse {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityAnswerRequest {
    pub reset_token: Uuid,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecurityAnswerResponse {
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub reset_token: Uuid,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}
