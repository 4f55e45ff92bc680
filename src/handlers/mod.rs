pub mod account;
pub mod admin;
pub mod auth;
pub mod geographic;
pub mod movie;
pub mod order;
pub mod petition;
pub mod rating;

pub use account::account_config;
pub use admin::admin_config;
pub use auth::auth_config;
pub use geographic::geographic_config;
pub use movie::movie_config;
pub use order::order_config;
pub use petition::petition_config;
pub use rating::rating_config;

use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest, ResponseError, error, web};

/// 当前登录用户（中间件在鉴权后注入）
pub(crate) fn current_user_id(req: &HttpRequest) -> AppResult<i64> {
    optional_user_id(req).ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// 公开接口上的可选身份
pub(crate) fn optional_user_id(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

/// JSON 解析失败统一返回 400 信封
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        let response = AppError::ValidationError(message).error_response();
        error::InternalError::from_response(err, response).into()
    })
}
