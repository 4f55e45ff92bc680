//! 管理员维护接口，全部需要 staff 身份

use super::current_user_id;
use crate::error::AppResult;
use crate::models::*;
use crate::services::{RatingService, RegionService, SampleDataService, TrendingService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

async fn require_staff(user_service: &UserService, req: &HttpRequest) -> AppResult<i64> {
    let user_id = current_user_id(req)?;
    user_service.ensure_staff(user_id).await?;
    Ok(user_id)
}

#[utoipa::path(
    post,
    path = "/admin/ratings/rebuild",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "评分聚合已重建", body = RebuildAggregatesResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn rebuild_rating_aggregates(
    user_service: web::Data<UserService>,
    rating_service: web::Data<RatingService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_staff(&user_service, &req).await {
        return Ok(e.error_response());
    }
    match rating_service.update_all_rating_aggregates().await {
        Ok(movies_updated) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            RebuildAggregatesResponse { movies_updated },
            format!("Updated rating aggregates for {movies_updated} movies"),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/trending/refresh",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "热门榜快照已刷新", body = TrendingRefreshResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn refresh_trending(
    user_service: web::Data<UserService>,
    trending_service: web::Data<TrendingService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_staff(&user_service, &req).await {
        return Ok(e.error_response());
    }
    match trending_service.update_trending_scores().await {
        Ok(result) => {
            let message = format!("Trending scores updated for {} regions", result.regions);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/regions/seed",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "示例地区已创建（已存在的跳过）", body = SeedRegionsResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn seed_regions(
    user_service: web::Data<UserService>,
    region_service: web::Data<RegionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_staff(&user_service, &req).await {
        return Ok(e.error_response());
    }
    match region_service.create_sample_regions().await {
        Ok(created) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            SeedRegionsResponse { created },
            format!("Created {created} sample regions"),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/sample/ratings",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "示例评分已生成", body = SampleRatingsResponse),
        (status = 400, description = "没有电影"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn generate_sample_ratings(
    user_service: web::Data<UserService>,
    sample_service: web::Data<SampleDataService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_staff(&user_service, &req).await {
        return Ok(e.error_response());
    }
    match sample_service.generate_sample_ratings().await {
        Ok(result) => {
            let message = format!("Created {} sample ratings", result.ratings_created);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/sample/purchases",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "示例购买记录已生成", body = SamplePurchasesResponse),
        (status = 400, description = "没有电影或地区"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn generate_sample_purchases(
    user_service: web::Data<UserService>,
    sample_service: web::Data<SampleDataService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_staff(&user_service, &req).await {
        return Ok(e.error_response());
    }
    match sample_service.generate_sample_purchases().await {
        Ok(result) => {
            let message = format!("Created {} sample purchases", result.purchases_created);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/sample/realistic-purchases",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "带地区偏好的 30 天购买数据已生成", body = RealisticPurchasesResponse),
        (status = 400, description = "没有电影或地区"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn generate_realistic_purchases(
    user_service: web::Data<UserService>,
    sample_service: web::Data<SampleDataService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_staff(&user_service, &req).await {
        return Ok(e.error_response());
    }
    match sample_service.generate_realistic_purchases().await {
        Ok(result) => {
            let message = format!("Successfully generated {} realistic purchases", result.purchases_created);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(result, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/ratings/rebuild", web::post().to(rebuild_rating_aggregates))
            .route("/trending/refresh", web::post().to(refresh_trending))
            .route("/regions/seed", web::post().to(seed_regions))
            .route("/sample/ratings", web::post().to(generate_sample_ratings))
            .route("/sample/purchases", web::post().to(generate_sample_purchases))
            .route(
                "/sample/realistic-purchases",
                web::post().to(generate_realistic_purchases),
            ),
    );
}
