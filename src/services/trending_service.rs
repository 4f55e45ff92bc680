use crate::config::TrendingConfig;
use crate::entities::{
    movie_entity as movies, movie_purchase_entity as purchases, region_entity as regions,
    trending_movie_entity as trending,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::trending_calculator::rank_trending;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct TrendingService {
    pool: DatabaseConnection,
    config: TrendingConfig,
}

impl TrendingService {
    pub fn new(pool: DatabaseConnection, config: TrendingConfig) -> Self {
        Self { pool, config }
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        (end - Duration::days(self.config.period_days), end)
    }

    /// 计算单个地区的热门电影（统计窗口内的购买事件）
    pub async fn calculate_trending_for_region(
        &self,
        region_id: i64,
        limit: usize,
    ) -> AppResult<RegionTrendingResponse> {
        let region = regions::Entity::find_by_id(region_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Region not found".to_string()))?;
        let (period_start, period_end) = self.window();
        self.trending_in_window(region, period_start, period_end, limit).await
    }

    async fn trending_in_window(
        &self,
        region: regions::Model,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        limit: usize,
    ) -> AppResult<RegionTrendingResponse> {
        let rows = purchases::Entity::find()
            .filter(purchases::Column::RegionId.eq(region.id))
            .filter(purchases::Column::PurchaseDate.gte(period_start))
            .filter(purchases::Column::PurchaseDate.lte(period_end))
            .order_by_asc(purchases::Column::Id)
            .all(&self.pool)
            .await?;

        let ranked = rank_trending(&rows, limit);

        let ids: Vec<i64> = ranked.iter().map(|e| e.movie_id).collect();
        let movie_map: HashMap<i64, movies::Model> = if ids.is_empty() {
            HashMap::new()
        } else {
            movies::Entity::find()
                .filter(movies::Column::Id.is_in(ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect()
        };

        let movies = ranked
            .into_iter()
            .filter_map(|e| {
                movie_map.get(&e.movie_id).map(|m| TrendingMovieResponse {
                    movie: m.clone().into(),
                    purchase_count: e.purchase_count,
                    total_quantity: e.total_quantity,
                    trending_score: e.trending_score,
                })
            })
            .collect();

        Ok(RegionTrendingResponse {
            region: region.into(),
            period_start,
            period_end,
            movies,
        })
    }

    /// 所有启用地区的热门榜（默认条数）
    pub async fn calculate_trending_for_all_regions(&self) -> AppResult<Vec<RegionTrendingResponse>> {
        let (period_start, period_end) = self.window();
        let active = regions::Entity::find()
            .filter(regions::Column::IsActive.eq(true))
            .order_by_asc(regions::Column::Id)
            .all(&self.pool)
            .await?;

        let mut all = Vec::with_capacity(active.len());
        for region in active {
            all.push(
                self.trending_in_window(region, period_start, period_end, self.config.default_limit)
                    .await?,
            );
        }
        Ok(all)
    }

    /// 重新计算并替换热门榜快照（删除旧快照与写入新快照在同一事务内）
    pub async fn update_trending_scores(&self) -> AppResult<TrendingRefreshResponse> {
        let all = self.calculate_trending_for_all_regions().await?;
        let created_at = Utc::now();

        let txn = self.pool.begin().await?;
        trending::Entity::delete_many().exec(&txn).await?;

        let mut rows_written = 0;
        for data in &all {
            for m in &data.movies {
                trending::ActiveModel {
                    movie_id: Set(m.movie.id),
                    region_id: Set(data.region.id),
                    purchase_count: Set(m.purchase_count),
                    view_count: Set(0),
                    trending_score: Set(m.trending_score),
                    period_start: Set(data.period_start),
                    period_end: Set(data.period_end),
                    created_at: Set(created_at),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                rows_written += 1;
            }
        }
        txn.commit().await?;

        log::info!(
            "Trending snapshot refreshed: {} regions, {rows_written} rows",
            all.len()
        );
        Ok(TrendingRefreshResponse {
            regions: all.len(),
            rows_written,
        })
    }

    /// 读取已持久化的地区快照，按分数降序
    pub async fn get_trending_snapshot(&self, region_id: i64) -> AppResult<Vec<TrendingSnapshotItem>> {
        regions::Entity::find_by_id(region_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Region not found".to_string()))?;

        let rows = trending::Entity::find()
            .filter(trending::Column::RegionId.eq(region_id))
            .order_by_desc(trending::Column::TrendingScore)
            .order_by_asc(trending::Column::Id)
            .all(&self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.movie_id).collect();
        let names: HashMap<i64, String> = if ids.is_empty() {
            HashMap::new()
        } else {
            movies::Entity::find()
                .filter(movies::Column::Id.is_in(ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|r| TrendingSnapshotItem {
                movie_name: names.get(&r.movie_id).cloned().unwrap_or_default(),
                movie_id: r.movie_id,
                purchase_count: r.purchase_count,
                view_count: r.view_count,
                trending_score: r.trending_score,
                period_start: r.period_start,
                period_end: r.period_end,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RegionService;
    use crate::test_support::{create_test_db, insert_movie, insert_user};
    use sea_orm::PaginatorTrait;

    async fn add_purchase(
        db: &DatabaseConnection,
        movie_id: i64,
        user_id: i64,
        region_id: i64,
        quantity: i32,
        purchase_date: DateTime<Utc>,
    ) {
        purchases::ActiveModel {
            movie_id: Set(movie_id),
            user_id: Set(user_id),
            region_id: Set(region_id),
            purchase_date: Set(purchase_date),
            quantity: Set(quantity),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_trending_for_region_uses_window() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let a = insert_movie(&db, "A", 1).await;
        let b = insert_movie(&db, "B", 1).await;
        let region = RegionService::new(db.clone()).list_regions().await.unwrap().remove(0);
        let now = Utc::now();

        add_purchase(&db, a.id, user.id, region.id, 1, now - Duration::hours(1)).await;
        add_purchase(&db, b.id, user.id, region.id, 2, now - Duration::hours(2)).await;
        add_purchase(&db, b.id, user.id, region.id, 1, now - Duration::hours(3)).await;
        // 窗口外
        add_purchase(&db, a.id, user.id, region.id, 3, now - Duration::days(30)).await;

        let svc = TrendingService::new(db, TrendingConfig::default());
        let result = svc.calculate_trending_for_region(region.id, 10).await.unwrap();
        let ranked: Vec<(i64, f64)> = result
            .movies
            .iter()
            .map(|m| (m.movie.id, m.trending_score))
            .collect();
        assert_eq!(ranked, vec![(b.id, 6.0), (a.id, 1.0)]);

        let err = svc.calculate_trending_for_region(9999, 10).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_trending_scores_replaces_snapshot() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let a = insert_movie(&db, "A", 1).await;
        let region = RegionService::new(db.clone()).list_regions().await.unwrap().remove(0);
        add_purchase(&db, a.id, user.id, region.id, 2, Utc::now() - Duration::hours(1)).await;

        let svc = TrendingService::new(db.clone(), TrendingConfig::default());
        let first = svc.update_trending_scores().await.unwrap();
        assert_eq!(first.regions, 5);
        assert_eq!(first.rows_written, 1);

        let second = svc.update_trending_scores().await.unwrap();
        assert_eq!(second.rows_written, 1);
        assert_eq!(trending::Entity::find().count(&db).await.unwrap(), 1);

        let snapshot = svc.get_trending_snapshot(region.id).await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].movie_name, "A");
        assert_eq!(snapshot[0].trending_score, 2.0);
        assert_eq!(snapshot[0].view_count, 0);
    }
}
