use super::current_user_id;
use crate::models::*;
use crate::services::{RegionService, TrendingService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/geographic/regions",
    tag = "geographic",
    responses(
        (status = 200, description = "启用中的地区", body = [RegionResponse])
    )
)]
pub async fn list_regions(region_service: web::Data<RegionService>) -> Result<HttpResponse> {
    match region_service.list_regions().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/geographic/trending",
    tag = "geographic",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "所有地区的热门电影", body = [RegionTrendingResponse]),
        (status = 401, description = "未授权")
    )
)]
pub async fn trending_all(trending_service: web::Data<TrendingService>) -> Result<HttpResponse> {
    match trending_service.calculate_trending_for_all_regions().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/geographic/regions/{id}/trending",
    tag = "geographic",
    params(("id" = i64, Path, description = "地区ID"), LimitQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "地区热门电影（实时计算）", body = RegionTrendingResponse),
        (status = 404, description = "地区不存在")
    )
)]
pub async fn region_trending(
    trending_service: web::Data<TrendingService>,
    path: web::Path<i64>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let limit = query.resolve(trending_service.default_limit() as u64) as usize;
    match trending_service
        .calculate_trending_for_region(path.into_inner(), limit)
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/geographic/regions/{id}/snapshot",
    tag = "geographic",
    params(("id" = i64, Path, description = "地区ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "最近一次持久化的热门榜", body = [TrendingSnapshotItem]),
        (status = 404, description = "地区不存在")
    )
)]
pub async fn region_snapshot(
    trending_service: web::Data<TrendingService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match trending_service.get_trending_snapshot(path.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/geographic/user-region",
    tag = "geographic",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前用户地区（未设置时 region 为 null）", body = UserRegionResponse),
        (status = 401, description = "未授权")
    )
)]
pub async fn get_user_region(
    region_service: web::Data<RegionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match region_service.get_user_region(user_id).await {
        Ok(region) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserRegionResponse { region }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/geographic/user-region",
    tag = "geographic",
    request_body = SetUserRegionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "地区已设置", body = RegionResponse),
        (status = 400, description = "缺少 region_id"),
        (status = 404, description = "地区不存在")
    )
)]
pub async fn set_user_region(
    region_service: web::Data<RegionService>,
    req: HttpRequest,
    request: web::Json<SetUserRegionRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match region_service.set_user_region(user_id, request.region_id).await {
        Ok(region) => {
            let message = format!("Region set to {}", region.name);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(region, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn geographic_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/geographic")
            .route("/regions", web::get().to(list_regions))
            .route("/regions/{id}/trending", web::get().to(region_trending))
            .route("/regions/{id}/snapshot", web::get().to(region_snapshot))
            .route("/trending", web::get().to(trending_all))
            .route("/user-region", web::get().to(get_user_region))
            .route("/user-region", web::post().to(set_user_region)),
    );
}
