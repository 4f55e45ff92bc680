use crate::entities::{
    movie_entity as movies, rating_aggregate_entity as aggregates, review_entity as reviews,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{RatingService, icontains};
use crate::services::user_service::require_staff;
use crate::utils::validate_text_length;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::collections::HashMap;

pub const NAME_MAX_LENGTH: usize = 255;
pub const IMAGE_MAX_LENGTH: usize = 255;
pub const COMMENT_MAX_LENGTH: usize = 255;

#[derive(Clone)]
pub struct MovieService {
    pool: DatabaseConnection,
    rating_service: RatingService,
}

impl MovieService {
    pub fn new(pool: DatabaseConnection, rating_service: RatingService) -> Self {
        Self {
            pool,
            rating_service,
        }
    }

    async fn find_movie(&self, movie_id: i64) -> AppResult<movies::Model> {
        movies::Entity::find_by_id(movie_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }

    /// 电影列表，可按名称模糊搜索（忽略大小写）
    pub async fn list_movies(&self, query: &MovieQuery) -> AppResult<Vec<MovieListItem>> {
        let mut select = movies::Entity::find();
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(icontains(movies::Column::Name, term));
        }
        let list = select.order_by_asc(movies::Column::Id).all(&self.pool).await?;

        let ids: Vec<i64> = list.iter().map(|m| m.id).collect();
        let agg_map: HashMap<i64, aggregates::Model> = if ids.is_empty() {
            HashMap::new()
        } else {
            aggregates::Entity::find()
                .filter(aggregates::Column::MovieId.is_in(ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|a| (a.movie_id, a))
                .collect()
        };

        Ok(list
            .into_iter()
            .map(|m| {
                let (average_rating, total_ratings) = agg_map
                    .get(&m.id)
                    .map(|a| (a.average_rating, a.total_ratings))
                    .unwrap_or((0.0, 0));
                MovieListItem {
                    movie: m.into(),
                    average_rating,
                    total_ratings,
                }
            })
            .collect())
    }

    pub async fn get_movie(&self, movie_id: i64) -> AppResult<MovieDetailResponse> {
        let movie = self.find_movie(movie_id).await?;
        let rating_stats = self.rating_service.get_movie_rating_stats(movie_id).await?;
        Ok(MovieDetailResponse {
            movie: movie.into(),
            rating_stats,
        })
    }

    pub async fn create_movie(&self, actor_id: i64, request: CreateMovieRequest) -> AppResult<MovieResponse> {
        require_staff(&self.pool, actor_id).await?;

        let name = validate_text_length(&request.name, "Name", 1, NAME_MAX_LENGTH)?;
        let description = validate_text_length(&request.description, "Description", 1, usize::MAX)?;
        let image = validate_text_length(&request.image, "Image", 1, IMAGE_MAX_LENGTH)?;
        validate_price(request.price)?;

        let movie = movies::ActiveModel {
            name: Set(name),
            price: Set(request.price),
            description: Set(description),
            image: Set(image),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Movie created: {} ({})", movie.name, movie.id);
        Ok(movie.into())
    }

    pub async fn update_movie(
        &self,
        actor_id: i64,
        movie_id: i64,
        request: UpdateMovieRequest,
    ) -> AppResult<MovieResponse> {
        require_staff(&self.pool, actor_id).await?;
        let movie = self.find_movie(movie_id).await?;

        let mut am = movie.into_active_model();
        if let Some(name) = request.name.as_deref() {
            am.name = Set(validate_text_length(name, "Name", 1, NAME_MAX_LENGTH)?);
        }
        if let Some(price) = request.price {
            validate_price(price)?;
            am.price = Set(price);
        }
        if let Some(description) = request.description.as_deref() {
            am.description = Set(validate_text_length(description, "Description", 1, usize::MAX)?);
        }
        if let Some(image) = request.image.as_deref() {
            am.image = Set(validate_text_length(image, "Image", 1, IMAGE_MAX_LENGTH)?);
        }

        Ok(am.update(&self.pool).await?.into())
    }

    /// 删除电影（评分、评论、购买记录级联删除）
    pub async fn delete_movie(&self, actor_id: i64, movie_id: i64) -> AppResult<()> {
        require_staff(&self.pool, actor_id).await?;
        let result = movies::Entity::delete_by_id(movie_id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Movie not found".to_string()));
        }
        log::info!("Movie deleted: {movie_id}");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // 评论
    // ---------------------------------------------------------------------

    pub async fn list_reviews(&self, movie_id: i64) -> AppResult<Vec<ReviewResponse>> {
        self.find_movie(movie_id).await?;
        let rows = reviews::Entity::find()
            .filter(reviews::Column::MovieId.eq(movie_id))
            .order_by_desc(reviews::Column::Date)
            .order_by_desc(reviews::Column::Id)
            .all(&self.pool)
            .await?;

        let user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        let names: HashMap<i64, String> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(user_ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|u| (u.id, u.username))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|r| {
                let username = names.get(&r.user_id).cloned().unwrap_or_default();
                ReviewResponse::from_model(r, username)
            })
            .collect())
    }

    pub async fn create_review(
        &self,
        user_id: i64,
        movie_id: i64,
        request: ReviewRequest,
    ) -> AppResult<ReviewResponse> {
        self.find_movie(movie_id).await?;
        let comment = validate_text_length(&request.comment, "Comment", 1, COMMENT_MAX_LENGTH)?;
        let author = self.find_user(user_id).await?;

        let review = reviews::ActiveModel {
            movie_id: Set(movie_id),
            user_id: Set(user_id),
            comment: Set(comment),
            date: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(ReviewResponse::from_model(review, author.username))
    }

    pub async fn update_review(
        &self,
        user_id: i64,
        movie_id: i64,
        review_id: i64,
        request: ReviewRequest,
    ) -> AppResult<ReviewResponse> {
        let review = self.find_own_review(user_id, movie_id, review_id).await?;
        let comment = validate_text_length(&request.comment, "Comment", 1, COMMENT_MAX_LENGTH)?;
        let author = self.find_user(user_id).await?;

        let mut am = review.into_active_model();
        am.comment = Set(comment);
        let updated = am.update(&self.pool).await?;

        Ok(ReviewResponse::from_model(updated, author.username))
    }

    pub async fn delete_review(&self, user_id: i64, movie_id: i64, review_id: i64) -> AppResult<()> {
        let review = self.find_own_review(user_id, movie_id, review_id).await?;
        reviews::Entity::delete_by_id(review.id).exec(&self.pool).await?;
        Ok(())
    }

    /// 仅作者本人可以修改或删除评论
    async fn find_own_review(&self, user_id: i64, movie_id: i64, review_id: i64) -> AppResult<reviews::Model> {
        let review = reviews::Entity::find_by_id(review_id)
            .filter(reviews::Column::MovieId.eq(movie_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
        if review.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(review)
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User not found".to_string()))
    }
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::ValidationError(
            "Price must be zero or greater.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, insert_movie, insert_user};

    fn service(db: DatabaseConnection) -> MovieService {
        MovieService::new(db.clone(), RatingService::new(db))
    }

    fn create_request(name: &str, price: i64) -> CreateMovieRequest {
        CreateMovieRequest {
            name: name.to_string(),
            price,
            description: "A film.".to_string(),
            image: "movie_images/film.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let db = create_test_db().await;
        insert_movie(&db, "The Godfather", 12).await;
        insert_movie(&db, "Godzilla", 9).await;
        insert_movie(&db, "Casablanca", 7).await;
        let svc = service(db);

        let all = svc.list_movies(&MovieQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let found = svc
            .list_movies(&MovieQuery { search: Some("GOD".into()) })
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.movie.name.as_str()).collect();
        assert_eq!(names, vec!["The Godfather", "Godzilla"]);
        assert_eq!(found[0].total_ratings, 0);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = create_test_db().await;
        insert_movie(&db, "50% Off", 5).await;
        insert_movie(&db, "Heat 50", 9).await;
        insert_movie(&db, "Back\\Slash", 9).await;
        let svc = service(db);

        let found = svc
            .list_movies(&MovieQuery { search: Some("50%".into()) })
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.movie.name.as_str()).collect();
        assert_eq!(names, vec!["50% Off"]);

        let found = svc
            .list_movies(&MovieQuery { search: Some("k\\s".into()) })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_staff_only_management() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let staff = insert_user(&db, "admin", true).await;
        let svc = service(db);

        let err = svc.create_movie(user.id, create_request("Heat", 10)).await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));

        assert!(svc.create_movie(staff.id, create_request("Heat", -1)).await.is_err());
        assert!(svc.create_movie(staff.id, create_request("  ", 10)).await.is_err());

        let movie = svc.create_movie(staff.id, create_request("Heat", 10)).await.unwrap();
        let updated = svc
            .update_movie(
                staff.id,
                movie.id,
                UpdateMovieRequest {
                    price: Some(15),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 15);
        assert_eq!(updated.name, "Heat");

        let detail = svc.get_movie(movie.id).await.unwrap();
        assert_eq!(detail.rating_stats.total_ratings, 0);

        assert!(matches!(
            svc.delete_movie(user.id, movie.id).await.unwrap_err(),
            AppError::PermissionDenied
        ));
        svc.delete_movie(staff.id, movie.id).await.unwrap();
        assert!(matches!(svc.get_movie(movie.id).await.unwrap_err(), AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reviews_only_editable_by_author() {
        let db = create_test_db().await;
        let author = insert_user(&db, "norma", false).await;
        let other = insert_user(&db, "joe", false).await;
        let movie = insert_movie(&db, "Sunset Boulevard", 10).await;
        let svc = service(db);

        let review = svc
            .create_review(author.id, movie.id, ReviewRequest { comment: "Ready for my close-up.".into() })
            .await
            .unwrap();
        assert_eq!(review.username, "norma");

        let err = svc
            .update_review(other.id, movie.id, review.id, ReviewRequest { comment: "Mine now".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert!(matches!(
            svc.delete_review(other.id, movie.id, review.id).await.unwrap_err(),
            AppError::Forbidden
        ));

        let edited = svc
            .update_review(author.id, movie.id, review.id, ReviewRequest { comment: "Still big.".into() })
            .await
            .unwrap();
        assert_eq!(edited.comment, "Still big.");

        let too_long = "x".repeat(COMMENT_MAX_LENGTH + 1);
        assert!(
            svc.create_review(author.id, movie.id, ReviewRequest { comment: too_long })
                .await
                .is_err()
        );

        assert_eq!(svc.list_reviews(movie.id).await.unwrap().len(), 1);
        svc.delete_review(author.id, movie.id, review.id).await.unwrap();
        assert!(svc.list_reviews(movie.id).await.unwrap().is_empty());
    }
}
