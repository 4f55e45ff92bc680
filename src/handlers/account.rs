use super::current_user_id;
use crate::models::*;
use crate::services::{OrderService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/account/profile",
    tag = "account",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "个人资料", body = ProfileResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match user_service.get_profile(user_id).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(ApiResponse::success(profile))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/account/security-phrase",
    tag = "account",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "密保问题（未设置时 data 为空）", body = SecurityPhraseResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_security_phrase(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match user_service.get_security_phrase(user_id).await {
        Ok(Some(phrase)) => Ok(HttpResponse::Ok().json(ApiResponse::success(phrase))),
        Ok(None) => Ok(HttpResponse::Ok().json(ApiResponse::message("No security phrase set"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/account/security-phrase",
    tag = "account",
    request_body = SecurityPhraseRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "密保已保存", body = SecurityPhraseResponse),
        (status = 400, description = "问题或答案长度不符合要求"),
        (status = 401, description = "未授权")
    )
)]
pub async fn set_security_phrase(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    request: web::Json<SecurityPhraseRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match user_service.set_security_phrase(user_id, request.into_inner()).await {
        Ok(phrase) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            phrase,
            "Your security phrase has been updated successfully!",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/account/orders",
    tag = "account",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "订单列表（分页，最新在前）", body = [OrderResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match order_service.list_orders(user_id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn account_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/account")
            .route("/profile", web::get().to(get_profile))
            .route("/security-phrase", web::get().to(get_security_phrase))
            .route("/security-phrase", web::put().to(set_security_phrase))
            .route("/orders", web::get().to(get_orders)),
    );
}
