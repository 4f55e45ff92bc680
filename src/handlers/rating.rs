use super::{current_user_id, optional_user_id};
use crate::error::AppError;
use crate::models::*;
use crate::services::{DEFAULT_HISTORY_LIMIT, DEFAULT_TREND_DAYS, RatingService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

const DEFAULT_RANKING_LIMIT: u64 = 10;

#[utoipa::path(
    post,
    path = "/ratings/movies/{id}",
    tag = "ratings",
    params(("id" = i64, Path, description = "电影ID")),
    request_body = SubmitRatingRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "评分已保存", body = SubmitRatingResponse),
        (status = 400, description = "评分必须在 1-5 之间"),
        (status = 404, description = "电影不存在")
    )
)]
/// 新增或修改当前用户对电影的评分，并返回最新统计
pub async fn submit_rating(
    rating_service: web::Data<RatingService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SubmitRatingRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let movie_id = path.into_inner();

    let (rating, created) = match rating_service
        .create_or_update_rating(user_id, movie_id, request.rating)
        .await
    {
        Ok(r) => r,
        Err(e) => return Ok(e.error_response()),
    };
    match rating_service.get_movie_rating_stats(movie_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(SubmitRatingResponse {
            rating: rating.into(),
            created,
            stats,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/ratings/movies/{id}",
    tag = "ratings",
    params(("id" = i64, Path, description = "电影ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "评分已删除", body = RatingStats),
        (status = 404, description = "尚未评分")
    )
)]
pub async fn delete_rating(
    rating_service: web::Data<RatingService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let movie_id = path.into_inner();

    match rating_service.delete_rating(user_id, movie_id).await {
        Ok(true) => {}
        Ok(false) => return Ok(AppError::NotFound("Rating not found".to_string()).error_response()),
        Err(e) => return Ok(e.error_response()),
    }
    match rating_service.get_movie_rating_stats(movie_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(stats, "Rating deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ratings/movies/{id}",
    tag = "ratings",
    params(("id" = i64, Path, description = "电影ID")),
    responses(
        (status = 200, description = "评分统计（登录时附带本人评分）", body = MovieRatingView),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn get_movie_ratings(
    rating_service: web::Data<RatingService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match rating_service
        .get_movie_rating_view(path.into_inner(), optional_user_id(&req))
        .await
    {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ratings/movies/{id}/analytics",
    tag = "ratings",
    params(("id" = i64, Path, description = "电影ID"), RatingTrendsQuery),
    responses(
        (status = 200, description = "评分分析", body = RatingAnalyticsResponse),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn get_movie_analytics(
    rating_service: web::Data<RatingService>,
    path: web::Path<i64>,
    query: web::Query<RatingTrendsQuery>,
) -> Result<HttpResponse> {
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS).clamp(1, 365);
    match rating_service.get_movie_analytics(path.into_inner(), days).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ratings/top-rated",
    tag = "ratings",
    params(LimitQuery),
    responses(
        (status = 200, description = "评分最高的电影", body = [RatedMovie])
    )
)]
pub async fn top_rated(
    rating_service: web::Data<RatingService>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    match rating_service
        .get_top_rated_movies(query.resolve(DEFAULT_RANKING_LIMIT))
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ratings/most-rated",
    tag = "ratings",
    params(LimitQuery),
    responses(
        (status = 200, description = "评分人数最多的电影", body = [RatedMovie])
    )
)]
pub async fn most_rated(
    rating_service: web::Data<RatingService>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    match rating_service
        .get_most_rated_movies(query.resolve(DEFAULT_RANKING_LIMIT))
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ratings/recent",
    tag = "ratings",
    params(LimitQuery),
    responses(
        (status = 200, description = "最近的评分", body = [RecentRating])
    )
)]
pub async fn recent_ratings(
    rating_service: web::Data<RatingService>,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    match rating_service
        .get_recent_ratings(query.resolve(DEFAULT_HISTORY_LIMIT))
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/ratings/me",
    tag = "ratings",
    params(LimitQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "我的评分历史", body = [RatingHistoryItem]),
        (status = 401, description = "未授权")
    )
)]
pub async fn my_ratings(
    rating_service: web::Data<RatingService>,
    req: HttpRequest,
    query: web::Query<LimitQuery>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match rating_service
        .get_user_rating_history(user_id, query.resolve(DEFAULT_HISTORY_LIMIT))
        .await
    {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn rating_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ratings")
            .route("/top-rated", web::get().to(top_rated))
            .route("/most-rated", web::get().to(most_rated))
            .route("/recent", web::get().to(recent_ratings))
            .route("/me", web::get().to(my_ratings))
            .route("/movies/{id}", web::get().to(get_movie_ratings))
            .route("/movies/{id}", web::post().to(submit_rating))
            .route("/movies/{id}", web::delete().to(delete_rating))
            .route("/movies/{id}/analytics", web::get().to(get_movie_analytics)),
    );
}
