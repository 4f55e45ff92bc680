use super::current_user_id;
use crate::models::*;
use crate::services::MovieService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/movies",
    tag = "movies",
    params(MovieQuery),
    responses(
        (status = 200, description = "电影列表（含评分摘要）", body = [MovieListItem])
    )
)]
pub async fn list_movies(
    movie_service: web::Data<MovieService>,
    query: web::Query<MovieQuery>,
) -> Result<HttpResponse> {
    match movie_service.list_movies(&query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/movies/{id}",
    tag = "movies",
    params(("id" = i64, Path, description = "电影ID")),
    responses(
        (status = 200, description = "电影详情与评分统计", body = MovieDetailResponse),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn get_movie(
    movie_service: web::Data<MovieService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match movie_service.get_movie(path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(detail))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/movies",
    tag = "movies",
    request_body = CreateMovieRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "电影已创建", body = MovieResponse),
        (status = 400, description = "参数错误"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn create_movie(
    movie_service: web::Data<MovieService>,
    req: HttpRequest,
    request: web::Json<CreateMovieRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match movie_service.create_movie(user_id, request.into_inner()).await {
        Ok(movie) => Ok(HttpResponse::Created().json(ApiResponse::success(movie))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/movies/{id}",
    tag = "movies",
    params(("id" = i64, Path, description = "电影ID")),
    request_body = UpdateMovieRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "电影已更新", body = MovieResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn update_movie(
    movie_service: web::Data<MovieService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<UpdateMovieRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match movie_service
        .update_movie(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(movie) => Ok(HttpResponse::Ok().json(ApiResponse::success(movie))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/movies/{id}",
    tag = "movies",
    params(("id" = i64, Path, description = "电影ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "电影已删除"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn delete_movie(
    movie_service: web::Data<MovieService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match movie_service.delete_movie(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Movie deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/movies/{id}/reviews",
    tag = "movies",
    params(("id" = i64, Path, description = "电影ID")),
    responses(
        (status = 200, description = "评论列表（最新在前）", body = [ReviewResponse]),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn list_reviews(
    movie_service: web::Data<MovieService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match movie_service.list_reviews(path.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/movies/{id}/reviews",
    tag = "movies",
    params(("id" = i64, Path, description = "电影ID")),
    request_body = ReviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "评论已发布", body = ReviewResponse),
        (status = 400, description = "评论内容不符合要求"),
        (status = 404, description = "电影不存在")
    )
)]
pub async fn create_review(
    movie_service: web::Data<MovieService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match movie_service
        .create_review(user_id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(review) => Ok(HttpResponse::Created().json(ApiResponse::success(review))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/movies/{id}/reviews/{review_id}",
    tag = "movies",
    params(
        ("id" = i64, Path, description = "电影ID"),
        ("review_id" = i64, Path, description = "评论ID")
    ),
    request_body = ReviewRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "评论已更新", body = ReviewResponse),
        (status = 403, description = "只能修改自己的评论"),
        (status = 404, description = "评论不存在")
    )
)]
pub async fn update_review(
    movie_service: web::Data<MovieService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    request: web::Json<ReviewRequest>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let (movie_id, review_id) = path.into_inner();
    match movie_service
        .update_review(user_id, movie_id, review_id, request.into_inner())
        .await
    {
        Ok(review) => Ok(HttpResponse::Ok().json(ApiResponse::success(review))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/movies/{id}/reviews/{review_id}",
    tag = "movies",
    params(
        ("id" = i64, Path, description = "电影ID"),
        ("review_id" = i64, Path, description = "评论ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "评论已删除"),
        (status = 403, description = "只能删除自己的评论"),
        (status = 404, description = "评论不存在")
    )
)]
pub async fn delete_review(
    movie_service: web::Data<MovieService>,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse> {
    let user_id = match current_user_id(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let (movie_id, review_id) = path.into_inner();
    match movie_service.delete_review(user_id, movie_id, review_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Review deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn movie_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/movies")
            .route("", web::get().to(list_movies))
            .route("", web::post().to(create_movie))
            .route("/{id}", web::get().to(get_movie))
            .route("/{id}", web::put().to(update_movie))
            .route("/{id}", web::delete().to(delete_movie))
            .route("/{id}/reviews", web::get().to(list_reviews))
            .route("/{id}/reviews", web::post().to(create_review))
            .route("/{id}/reviews/{review_id}", web::put().to(update_review))
            .route("/{id}/reviews/{review_id}", web::delete().to(delete_review)),
    );
}
