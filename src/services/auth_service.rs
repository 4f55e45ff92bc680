use crate::entities::{security_phrase_entity as phrases, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, Set};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 找回密码凭证：forgot_password 时创建，答对密保后标记 verified，重置成功后删除
#[derive(Debug, Clone)]
struct RecoveryTicket {
    user_id: i64,
    username: String,
    security_verified: bool,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    ticket_ttl_secs: i64,
    recovery_tickets: Arc<RwLock<HashMap<Uuid, RecoveryTicket>>>,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService, ticket_ttl_secs: i64) -> Self {
        Self {
            pool,
            jwt_service,
            ticket_ttl_secs,
            recovery_tickets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<AuthResponse> {
        let username = request.username.trim().to_string();
        validate_username(&username)?;
        ensure_passwords_match(
            &request.password1,
            &request.password2,
            "The two password fields didn't match.",
        )?;
        validate_password(&request.password1, &username)?;

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username.as_str()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password1)?;
        let now = Utc::now();
        let user = users::ActiveModel {
            username: Set(username),
            password_hash: Set(password_hash),
            is_staff: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "A user with that username already exists."))?;

        log::info!("New account created: {}", user.username);
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let invalid = || AppError::AuthError("The username or password is incorrect.".to_string());

        let user = users::Entity::find()
            .filter(users::Column::Username.eq(request.username.trim()))
            .one(&self.pool)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(invalid());
        }

        self.issue_tokens(user)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user = users::Entity::find_by_id(claims.user_id()?)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, &user.username)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, &user.username)?;

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    // ---------------------------------------------------------------------
    // 找回密码: forgot_password -> security_question -> reset_password
    // ---------------------------------------------------------------------

    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> AppResult<ForgotPasswordResponse> {
        let username = request.username.trim();
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Username not found.".to_string()))?;

        // 未设置密保的账号无法自助找回
        self.find_phrase(user.id).await?;

        let token = Uuid::new_v4();
        let ticket = RecoveryTicket {
            user_id: user.id,
            username: user.username,
            security_verified: false,
            expires_at: Utc::now() + Duration::seconds(self.ticket_ttl_secs),
        };

        {
            let mut tickets = self.recovery_tickets.write().await;
            let now = Utc::now();
            tickets.retain(|_, t| t.expires_at > now);
            tickets.insert(token, ticket);
        }

        Ok(ForgotPasswordResponse {
            reset_token: token,
            expires_in: self.ticket_ttl_secs,
        })
    }

    pub async fn security_question(&self, reset_token: Uuid) -> AppResult<SecurityQuestionResponse> {
        let ticket = self.live_ticket(reset_token).await?;
        let phrase = self.find_phrase(ticket.user_id).await?;
        Ok(SecurityQuestionResponse {
            question: phrase.question,
        })
    }

    pub async fn answer_security_question(
        &self,
        request: SecurityAnswerRequest,
    ) -> AppResult<SecurityAnswerResponse> {
        let ticket = self.live_ticket(request.reset_token).await?;
        let phrase = self.find_phrase(ticket.user_id).await?;

        if !phrase.answer_matches(&request.answer) {
            return Err(AppError::ValidationError(
                "Incorrect answer. Please try again.".to_string(),
            ));
        }

        let mut tickets = self.recovery_tickets.write().await;
        match tickets.get_mut(&request.reset_token) {
            Some(t) => t.security_verified = true,
            None => return Err(Self::ticket_error()),
        }

        Ok(SecurityAnswerResponse { verified: true })
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        let ticket = self.live_ticket(request.reset_token).await?;
        if !ticket.security_verified {
            return Err(AppError::AuthError(
                "Please answer your security question first.".to_string(),
            ));
        }

        ensure_passwords_match(
            &request.new_password1,
            &request.new_password2,
            "Passwords don't match!",
        )?;
        validate_password(&request.new_password1, &ticket.username)?;

        let user = users::Entity::find_by_id(ticket.user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Username not found.".to_string()))?;

        let mut am = user.into_active_model();
        am.password_hash = Set(hash_password(&request.new_password1)?);
        am.updated_at = Set(Utc::now());
        am.update(&self.pool).await?;

        self.recovery_tickets.write().await.remove(&request.reset_token);
        log::info!("Password reset completed for {}", ticket.username);
        Ok(())
    }

    async fn live_ticket(&self, token: Uuid) -> AppResult<RecoveryTicket> {
        let mut tickets = self.recovery_tickets.write().await;
        let now = Utc::now();
        tickets.retain(|_, t| t.expires_at > now);
        tickets.get(&token).cloned().ok_or_else(Self::ticket_error)
    }

    fn ticket_error() -> AppError {
        AppError::AuthError("Password reset session expired. Please start again.".to_string())
    }

    async fn find_phrase(&self, user_id: i64) -> AppResult<phrases::Model> {
        phrases::Entity::find()
            .filter(phrases::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError(
                    "No security phrase found for this account. Please contact support.".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, insert_user};

    fn service(db: DatabaseConnection, ttl: i64) -> AuthService {
        AuthService::new(db, JwtService::new("test-secret", 60, 120), ttl)
    }

    fn signup_request(username: &str, p1: &str, p2: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    async fn add_phrase(db: &DatabaseConnection, user_id: i64) {
        let now = Utc::now();
        phrases::ActiveModel {
            user_id: Set(user_id),
            question: Set("Favourite film director?".to_string()),
            answer: Set("kubrick".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let svc = service(create_test_db().await, 900);
        let auth = svc
            .signup(signup_request("norma", "sunset-boulevard", "sunset-boulevard"))
            .await
            .unwrap();
        assert_eq!(auth.user.username, "norma");
        assert!(!auth.user.is_staff);

        let login = svc
            .login(LoginRequest {
                username: "norma".into(),
                password: "sunset-boulevard".into(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.id, auth.user.id);

        let err = svc
            .login(LoginRequest {
                username: "norma".into(),
                password: "wrong-password".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(msg) if msg == "The username or password is incorrect."));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let svc = service(create_test_db().await, 900);

        let err = svc
            .signup(signup_request("norma", "sunset-boulevard", "sunset-blvd"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "The two password fields didn't match."));

        assert!(svc.signup(signup_request("bad name", "sunset-boulevard", "sunset-boulevard")).await.is_err());
        assert!(svc.signup(signup_request("norma", "12345678", "12345678")).await.is_err());

        svc.signup(signup_request("norma", "sunset-boulevard", "sunset-boulevard"))
            .await
            .unwrap();
        let err = svc
            .signup(signup_request("norma", "another-password", "another-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_refresh_token() {
        let svc = service(create_test_db().await, 900);
        let auth = svc
            .signup(signup_request("norma", "sunset-boulevard", "sunset-boulevard"))
            .await
            .unwrap();

        let refreshed = svc.refresh_token(&auth.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, auth.user.id);
        // access token 不能用来刷新
        assert!(svc.refresh_token(&auth.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_forgot_password_requires_known_user_with_phrase() {
        let db = create_test_db().await;
        insert_user(&db, "nophrase", false).await;
        let svc = service(db, 900);

        let err = svc
            .forgot_password(ForgotPasswordRequest { username: "ghost".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Username not found."));

        let err = svc
            .forgot_password(ForgotPasswordRequest { username: "nophrase".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_full_recovery_flow() {
        let db = create_test_db().await;
        let svc = service(db.clone(), 900);
        let auth = svc
            .signup(signup_request("norma", "sunset-boulevard", "sunset-boulevard"))
            .await
            .unwrap();
        add_phrase(&db, auth.user.id).await;

        let ticket = svc
            .forgot_password(ForgotPasswordRequest { username: "norma".into() })
            .await
            .unwrap();

        let q = svc.security_question(ticket.reset_token).await.unwrap();
        assert_eq!(q.question, "Favourite film director?");

        // 未答题不能重置
        let err = svc
            .reset_password(ResetPasswordRequest {
                reset_token: ticket.reset_token,
                new_password1: "mulholland-drive".into(),
                new_password2: "mulholland-drive".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        let err = svc
            .answer_security_question(SecurityAnswerRequest {
                reset_token: ticket.reset_token,
                answer: "lynch".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Incorrect answer. Please try again."));

        let ok = svc
            .answer_security_question(SecurityAnswerRequest {
                reset_token: ticket.reset_token,
                answer: "  KUBRICK ".into(),
            })
            .await
            .unwrap();
        assert!(ok.verified);

        let err = svc
            .reset_password(ResetPasswordRequest {
                reset_token: ticket.reset_token,
                new_password1: "mulholland-drive".into(),
                new_password2: "mulholland-road".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Passwords don't match!"));

        svc.reset_password(ResetPasswordRequest {
            reset_token: ticket.reset_token,
            new_password1: "mulholland-drive".into(),
            new_password2: "mulholland-drive".into(),
        })
        .await
        .unwrap();

        svc.login(LoginRequest {
            username: "norma".into(),
            password: "mulholland-drive".into(),
        })
        .await
        .unwrap();

        // 凭证已被消费
        assert!(svc.security_question(ticket.reset_token).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_and_expired_tickets_are_rejected() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        add_phrase(&db, user.id).await;

        let svc = service(db.clone(), 900);
        let err = svc.security_question(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));

        // TTL 为 0：凭证创建即过期
        let expiring = service(db, 0);
        let ticket = expiring
            .forgot_password(ForgotPasswordRequest { username: "norma".into() })
            .await
            .unwrap();
        assert!(expiring.security_question(ticket.reset_token).await.is_err());
    }
}
