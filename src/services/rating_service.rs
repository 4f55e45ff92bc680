use crate::entities::{
    movie_entity as movies, movie_purchase_entity as purchases, movie_rating_entity as ratings,
    order_item_entity as order_items, rating_aggregate_entity as aggregates, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::rating_calculator::{
    MAX_RATING, MIN_RATING, RatingSummary, rating_purchase_ratio, rating_trends, weighted_average,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

pub const DEFAULT_HISTORY_LIMIT: u64 = 20;
pub const DEFAULT_TREND_DAYS: i64 = 30;

/// 由 movie_ratings 全量重算某部电影的汇总行（不存在则创建）
pub(crate) async fn recompute_aggregate<C: ConnectionTrait>(
    db: &C,
    movie_id: i64,
) -> AppResult<aggregates::Model> {
    let values: Vec<i32> = ratings::Entity::find()
        .select_only()
        .column(ratings::Column::Rating)
        .filter(ratings::Column::MovieId.eq(movie_id))
        .into_tuple()
        .all(db)
        .await?;
    let summary = RatingSummary::from_ratings(&values);
    let [c1, c2, c3, c4, c5] = summary.distribution;
    let now = Utc::now();

    let existing = aggregates::Entity::find()
        .filter(aggregates::Column::MovieId.eq(movie_id))
        .one(db)
        .await?;

    let fill = |am: &mut aggregates::ActiveModel| {
        am.average_rating = Set(summary.average_rating);
        am.total_ratings = Set(summary.total_ratings);
        am.rating_1_count = Set(c1);
        am.rating_2_count = Set(c2);
        am.rating_3_count = Set(c3);
        am.rating_4_count = Set(c4);
        am.rating_5_count = Set(c5);
        am.last_updated = Set(now);
    };

    let saved = match existing {
        Some(row) => {
            let mut am = row.into_active_model();
            fill(&mut am);
            am.update(db).await?
        }
        None => {
            let mut am = aggregates::ActiveModel {
                movie_id: Set(movie_id),
                ..Default::default()
            };
            fill(&mut am);
            am.insert(db).await?
        }
    };
    Ok(saved)
}

#[derive(Clone)]
pub struct RatingService {
    pool: DatabaseConnection,
}

impl RatingService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn find_movie(&self, movie_id: i64) -> AppResult<movies::Model> {
        movies::Entity::find_by_id(movie_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }

    /// 新增或修改评分，评分与汇总在同一事务内更新
    pub async fn create_or_update_rating(
        &self,
        user_id: i64,
        movie_id: i64,
        value: i32,
    ) -> AppResult<(ratings::Model, bool)> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(AppError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        self.find_movie(movie_id).await?;

        let txn = self.pool.begin().await?;
        let now = Utc::now();

        let existing = ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id))
            .filter(ratings::Column::MovieId.eq(movie_id))
            .one(&txn)
            .await?;

        let (rating, created) = match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.rating = Set(value);
                am.updated_at = Set(now);
                (am.update(&txn).await?, false)
            }
            None => {
                let row = ratings::ActiveModel {
                    user_id: Set(user_id),
                    movie_id: Set(movie_id),
                    rating: Set(value),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| AppError::from_unique_violation(e, "You have already rated this movie."))?;
                (row, true)
            }
        };

        recompute_aggregate(&txn, movie_id).await?;
        txn.commit().await?;

        Ok((rating, created))
    }

    /// 删除评分；不存在时返回 false
    pub async fn delete_rating(&self, user_id: i64, movie_id: i64) -> AppResult<bool> {
        let txn = self.pool.begin().await?;

        let Some(existing) = ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id))
            .filter(ratings::Column::MovieId.eq(movie_id))
            .one(&txn)
            .await?
        else {
            return Ok(false);
        };

        ratings::Entity::delete_by_id(existing.id).exec(&txn).await?;
        recompute_aggregate(&txn, movie_id).await?;
        txn.commit().await?;

        Ok(true)
    }

    pub async fn get_user_rating(&self, user_id: i64, movie_id: i64) -> AppResult<Option<ratings::Model>> {
        Ok(ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id))
            .filter(ratings::Column::MovieId.eq(movie_id))
            .one(&self.pool)
            .await?)
    }

    /// 读取汇总行；尚无汇总时返回零值
    pub async fn get_movie_rating_stats(&self, movie_id: i64) -> AppResult<RatingStats> {
        let row = aggregates::Entity::find()
            .filter(aggregates::Column::MovieId.eq(movie_id))
            .one(&self.pool)
            .await?;

        Ok(match row {
            Some(agg) => RatingSummary::from_counts(agg.average_rating, agg.total_ratings, agg.counts())
                .into_stats(Some(agg.last_updated)),
            None => RatingSummary::empty().into_stats(None),
        })
    }

    /// 电影评分概览 + 当前用户评分
    pub async fn get_movie_rating_view(
        &self,
        movie_id: i64,
        viewer_id: Option<i64>,
    ) -> AppResult<MovieRatingView> {
        self.find_movie(movie_id).await?;
        let stats = self.get_movie_rating_stats(movie_id).await?;
        let user_rating = match viewer_id {
            Some(uid) => self.get_user_rating(uid, movie_id).await?.map(|r| r.rating),
            None => None,
        };

        Ok(MovieRatingView {
            movie_id,
            stats,
            user_rating,
        })
    }

    pub async fn update_movie_rating_aggregate(&self, movie_id: i64) -> AppResult<aggregates::Model> {
        recompute_aggregate(&self.pool, movie_id).await
    }

    /// 重算所有电影的汇总，返回处理的电影数
    pub async fn update_all_rating_aggregates(&self) -> AppResult<u64> {
        let ids: Vec<i64> = movies::Entity::find()
            .select_only()
            .column(movies::Column::Id)
            .order_by_asc(movies::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;

        for id in &ids {
            recompute_aggregate(&self.pool, *id).await?;
        }

        log::info!("Rating aggregates rebuilt for {} movies", ids.len());
        Ok(ids.len() as u64)
    }

    pub async fn get_top_rated_movies(&self, limit: u64) -> AppResult<Vec<RatedMovie>> {
        let rows = aggregates::Entity::find()
            .filter(aggregates::Column::TotalRatings.gte(1))
            .order_by_desc(aggregates::Column::AverageRating)
            .order_by_desc(aggregates::Column::TotalRatings)
            .limit(limit)
            .all(&self.pool)
            .await?;
        self.to_rated_movies(rows).await
    }

    pub async fn get_most_rated_movies(&self, limit: u64) -> AppResult<Vec<RatedMovie>> {
        let rows = aggregates::Entity::find()
            .filter(aggregates::Column::TotalRatings.gte(1))
            .order_by_desc(aggregates::Column::TotalRatings)
            .order_by_desc(aggregates::Column::AverageRating)
            .limit(limit)
            .all(&self.pool)
            .await?;
        self.to_rated_movies(rows).await
    }

    async fn to_rated_movies(&self, rows: Vec<aggregates::Model>) -> AppResult<Vec<RatedMovie>> {
        let movie_map = self.movie_map(rows.iter().map(|r| r.movie_id).collect()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|agg| {
                movie_map.get(&agg.movie_id).map(|m| RatedMovie {
                    movie_id: m.id,
                    name: m.name.clone(),
                    image: m.image.clone(),
                    average_rating: agg.average_rating,
                    total_ratings: agg.total_ratings,
                })
            })
            .collect())
    }

    /// 用户评分历史，最新在前
    pub async fn get_user_rating_history(&self, user_id: i64, limit: u64) -> AppResult<Vec<RatingHistoryItem>> {
        let rows = ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id))
            .order_by_desc(ratings::Column::CreatedAt)
            .order_by_desc(ratings::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;

        let movie_map = self.movie_map(rows.iter().map(|r| r.movie_id).collect()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| {
                movie_map.get(&r.movie_id).map(|m| RatingHistoryItem {
                    movie_id: m.id,
                    movie_name: m.name.clone(),
                    movie_image: m.image.clone(),
                    rating: r.rating,
                    updated_at: r.updated_at,
                })
            })
            .collect())
    }

    /// 全站最近评分
    pub async fn get_recent_ratings(&self, limit: u64) -> AppResult<Vec<RecentRating>> {
        let rows = ratings::Entity::find()
            .order_by_desc(ratings::Column::CreatedAt)
            .order_by_desc(ratings::Column::Id)
            .limit(limit)
            .all(&self.pool)
            .await?;

        let movie_map = self.movie_map(rows.iter().map(|r| r.movie_id).collect()).await?;
        let user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        let user_map: HashMap<i64, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let movie = movie_map.get(&r.movie_id)?;
                let username = user_map.get(&r.user_id)?;
                Some(RecentRating {
                    id: r.id,
                    username: username.clone(),
                    movie_id: movie.id,
                    movie_name: movie.name.clone(),
                    rating: r.rating,
                    updated_at: r.updated_at,
                })
            })
            .collect())
    }

    /// 评分分析：加权均分、每日趋势、与购买量的关系
    pub async fn get_movie_analytics(&self, movie_id: i64, days: i64) -> AppResult<RatingAnalyticsResponse> {
        let movie = self.find_movie(movie_id).await?;
        let stats = self.get_movie_rating_stats(movie_id).await?;

        let rows = ratings::Entity::find()
            .filter(ratings::Column::MovieId.eq(movie_id))
            .order_by_asc(ratings::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let purchase_count = order_items::Entity::find()
            .filter(order_items::Column::MovieId.eq(movie_id))
            .count(&self.pool)
            .await? as i64;
        let geographic_purchases = purchases::Entity::find()
            .filter(purchases::Column::MovieId.eq(movie_id))
            .count(&self.pool)
            .await? as i64;

        let now = Utc::now();
        Ok(RatingAnalyticsResponse {
            correlation: RatingCorrelation {
                movie: movie.into(),
                average_rating: stats.average_rating,
                total_ratings: stats.total_ratings,
                purchase_count,
                geographic_purchases,
                rating_purchase_ratio: rating_purchase_ratio(stats.total_ratings, purchase_count),
            },
            weighted_average: weighted_average(&rows, now),
            trends: rating_trends(&rows, now, days),
        })
    }

    async fn movie_map(&self, ids: Vec<i64>) -> AppResult<HashMap<i64, movies::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(movies::Entity::find()
            .filter(movies::Column::Id.is_in(ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, insert_movie, insert_user};

    async fn aggregate(db: &DatabaseConnection, movie_id: i64) -> aggregates::Model {
        aggregates::Entity::find()
            .filter(aggregates::Column::MovieId.eq(movie_id))
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_rate_then_update_keeps_single_rating() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "Vertigo", 10).await;
        let svc = RatingService::new(db.clone());

        let (_, created) = svc.create_or_update_rating(user.id, movie.id, 3).await.unwrap();
        assert!(created);
        let (rating, created) = svc.create_or_update_rating(user.id, movie.id, 5).await.unwrap();
        assert!(!created);
        assert_eq!(rating.rating, 5);

        let agg = aggregate(&db, movie.id).await;
        assert_eq!(agg.total_ratings, 1);
        assert_eq!(agg.average_rating, 5.0);
        assert_eq!(agg.rating_5_count, 1);
        assert_eq!(agg.rating_3_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_rating_row_maps_to_conflict() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "Vertigo", 10).await;
        RatingService::new(db.clone())
            .create_or_update_rating(user.id, movie.id, 4)
            .await
            .unwrap();

        let now = Utc::now();
        let err = ratings::ActiveModel {
            user_id: Set(user.id),
            movie_id: Set(movie.id),
            rating: Set(2),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "You have already rated this movie."))
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(ratings::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rating_out_of_range_is_rejected() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "Vertigo", 10).await;
        let svc = RatingService::new(db);

        for bad in [0, 6, -1] {
            let err = svc.create_or_update_rating(user.id, movie.id, bad).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(msg) if msg == "Rating must be between 1 and 5"));
        }
        let err = svc.create_or_update_rating(user.id, 9999, 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_aggregate_matches_ratings() {
        let db = create_test_db().await;
        let movie = insert_movie(&db, "Psycho", 8).await;
        let svc = RatingService::new(db.clone());

        for (i, value) in [5, 4, 4, 3].into_iter().enumerate() {
            let u = insert_user(&db, &format!("user{i}"), false).await;
            svc.create_or_update_rating(u.id, movie.id, value).await.unwrap();
        }

        let stats = svc.get_movie_rating_stats(movie.id).await.unwrap();
        assert_eq!(stats.total_ratings, 4);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.distribution[&4], 2);
        assert_eq!(stats.percentages[&4], 50.0);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_delete_only_rating_resets_aggregate() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "Vertigo", 10).await;
        let svc = RatingService::new(db.clone());

        assert!(!svc.delete_rating(user.id, movie.id).await.unwrap());

        svc.create_or_update_rating(user.id, movie.id, 4).await.unwrap();
        assert!(svc.delete_rating(user.id, movie.id).await.unwrap());
        assert!(svc.get_user_rating(user.id, movie.id).await.unwrap().is_none());

        let agg = aggregate(&db, movie.id).await;
        assert_eq!(agg.total_ratings, 0);
        assert_eq!(agg.average_rating, 0.0);
        assert_eq!(agg.counts(), [0; 5]);
    }

    #[tokio::test]
    async fn test_stats_without_aggregate_row() {
        let db = create_test_db().await;
        let movie = insert_movie(&db, "Rope", 6).await;
        let svc = RatingService::new(db);

        let stats = svc.get_movie_rating_stats(movie.id).await.unwrap();
        assert_eq!(stats.total_ratings, 0);
        assert!(stats.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_top_and_most_rated_ordering() {
        let db = create_test_db().await;
        let a = insert_movie(&db, "A", 1).await;
        let b = insert_movie(&db, "B", 1).await;
        let c = insert_movie(&db, "C", 1).await;
        let u1 = insert_user(&db, "u1", false).await;
        let u2 = insert_user(&db, "u2", false).await;
        let svc = RatingService::new(db);

        // A: 5 (1 条)；B: 4,4 (2 条)；C 无评分
        svc.create_or_update_rating(u1.id, a.id, 5).await.unwrap();
        svc.create_or_update_rating(u1.id, b.id, 4).await.unwrap();
        svc.create_or_update_rating(u2.id, b.id, 4).await.unwrap();
        svc.update_movie_rating_aggregate(c.id).await.unwrap();

        let top: Vec<i64> = svc.get_top_rated_movies(10).await.unwrap().iter().map(|m| m.movie_id).collect();
        assert_eq!(top, vec![a.id, b.id]);
        let most: Vec<i64> = svc.get_most_rated_movies(10).await.unwrap().iter().map(|m| m.movie_id).collect();
        assert_eq!(most, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_update_all_rating_aggregates() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let a = insert_movie(&db, "A", 1).await;
        insert_movie(&db, "B", 1).await;

        // 直接写入评分，绕过汇总
        let now = Utc::now();
        ratings::ActiveModel {
            user_id: Set(user.id),
            movie_id: Set(a.id),
            rating: Set(2),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let svc = RatingService::new(db.clone());
        assert_eq!(svc.update_all_rating_aggregates().await.unwrap(), 2);
        assert_eq!(aggregate(&db, a.id).await.average_rating, 2.0);
        assert_eq!(aggregates::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_history_recent_and_analytics() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let a = insert_movie(&db, "A", 1).await;
        let b = insert_movie(&db, "B", 1).await;
        let svc = RatingService::new(db);

        svc.create_or_update_rating(user.id, a.id, 3).await.unwrap();
        svc.create_or_update_rating(user.id, b.id, 5).await.unwrap();

        let history = svc.get_user_rating_history(user.id, DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].movie_id, b.id);

        let recent = svc.get_recent_ratings(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].username, "norma");

        let analytics = svc.get_movie_analytics(a.id, DEFAULT_TREND_DAYS).await.unwrap();
        assert_eq!(analytics.correlation.total_ratings, 1);
        assert_eq!(analytics.correlation.purchase_count, 0);
        assert_eq!(analytics.correlation.rating_purchase_ratio, 1.0);
        assert_eq!(analytics.weighted_average, 3.0);
        assert_eq!(analytics.trends.len(), 1);

        let view = svc.get_movie_rating_view(a.id, Some(user.id)).await.unwrap();
        assert_eq!(view.user_rating, Some(3));
        let anon = svc.get_movie_rating_view(a.id, None).await.unwrap();
        assert!(anon.user_rating.is_none());
    }
}
