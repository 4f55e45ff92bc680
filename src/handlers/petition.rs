use super::{current_user_id, optional_user_id};
use crate::models::*;
use crate::services::PetitionService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/petitions",
    tag = "petitions",
    params(PetitionQuery),
    responses(
        (status = 200, description = "进行中的请愿（最新在前）", body = [PetitionResponse])
    )
)]
pub async fn list_petitions(
    petition_service: web::Data<PetitionService>,
    query: web::Query<PetitionQuery>,
) -> Result<HttpResponse> {
    match petition_service.list_petitions(&query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/petitions",
    tag = "petitions",
    request_body = CreatePetitionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "请愿已创建", body = PetitionResponse),
        (status = 400, description = "参数错误")
    )
)]
pub async fn create_petition(
    petition_service: web::Data<PetitionService>,
    req: HttpRequest,
    request: web::Json<CreatePetitionRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match petition_service.create_petition(user_id, request.into_inner()).await {
        Ok(petition) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            petition,
            "Your petition has been created successfully!",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/petitions/{id}",
    tag = "petitions",
    params(("id" = i64, Path, description = "请愿ID")),
    responses(
        (status = 200, description = "请愿详情（登录时附带投票状态）", body = PetitionDetailResponse),
        (status = 404, description = "请愿不存在")
    )
)]
pub async fn get_petition(
    petition_service: web::Data<PetitionService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match petition_service
        .get_petition(path.into_inner(), optional_user_id(&req))
        .await
    {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/petitions/{id}/vote",
    tag = "petitions",
    params(("id" = i64, Path, description = "请愿ID")),
    request_body = VoteRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "投票成功", body = VoteResponse),
        (status = 400, description = "请愿已关闭"),
        (status = 404, description = "请愿不存在"),
        (status = 409, description = "已经投过票")
    )
)]
pub async fn vote(
    petition_service: web::Data<PetitionService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<VoteRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match petition_service
        .vote(user_id, path.into_inner(), request.vote_type)
        .await
    {
        Ok(result) => {
            let message = format!("Your {} vote has been recorded!", result.vote_type);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/petitions/mine",
    tag = "petitions",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我发起的请愿", body = [PetitionResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn my_petitions(
    petition_service: web::Data<PetitionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match petition_service.my_petitions(user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn petition_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/petitions")
            .route("", web::get().to(list_petitions))
            .route("", web::post().to(create_petition))
            // 必须在 /{id} 之前注册
            .route("/mine", web::get().to(my_petitions))
            .route("/{id}", web::get().to(get_petition))
            .route("/{id}/vote", web::post().to(vote)),
    );
}
