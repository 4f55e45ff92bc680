//! 示例数据生成（管理员维护接口使用）

use crate::entities::{
    movie_entity as movies, movie_purchase_entity as purchases, movie_rating_entity as ratings,
    region_entity as regions, user_entity as users, user_region_entity as user_regions,
};
use crate::error::{AppError, AppResult};
use crate::models::{RealisticPurchasesResponse, SamplePurchasesResponse, SampleRatingsResponse};
use crate::services::{RatingService, TrendingService};
use crate::utils::hash_password;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

pub const SAMPLE_PASSWORD: &str = "testpass123";
pub const SAMPLE_RATING_USERS: usize = 10;
pub const SAMPLE_PURCHASE_USER: &str = "testuser";
pub const SAMPLE_PURCHASES: usize = 20;
pub const REALISTIC_USERS: usize = 5;
pub const REALISTIC_DAYS: i64 = 30;
/// 每个地区偏好前 N 部电影
pub const REALISTIC_PREFERRED_MOVIES: usize = 3;
pub const REALISTIC_PREFERENCE_CHANCE: f64 = 0.7;
/// 每 1000 万人口每天多 1 笔购买
const POPULATION_PER_EXTRA_PURCHASE: i64 = 10_000_000;
const INSERT_CHUNK: usize = 100;

#[derive(Clone)]
pub struct SampleDataService {
    pool: DatabaseConnection,
    rating_service: RatingService,
    trending_service: TrendingService,
    period_days: i64,
}

impl SampleDataService {
    pub fn new(
        pool: DatabaseConnection,
        rating_service: RatingService,
        trending_service: TrendingService,
        period_days: i64,
    ) -> Self {
        Self {
            pool,
            rating_service,
            trending_service,
            period_days,
        }
    }

    async fn movie_ids(&self) -> AppResult<Vec<i64>> {
        let ids: Vec<i64> = movies::Entity::find()
            .select_only()
            .column(movies::Column::Id)
            .order_by_asc(movies::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;
        if ids.is_empty() {
            return Err(AppError::ValidationError(
                "No movies found. Add some movies first.".to_string(),
            ));
        }
        Ok(ids)
    }

    /// 按用户名 get-or-create 测试用户；`password_hash` 仅在需要新建时计算一次
    async fn ensure_user(&self, username: &str, password_hash: &mut Option<String>) -> AppResult<users::Model> {
        if let Some(existing) = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.pool)
            .await?
        {
            return Ok(existing);
        }

        let hash = match password_hash.clone() {
            Some(h) => h,
            None => {
                let h = hash_password(SAMPLE_PASSWORD)?;
                *password_hash = Some(h.clone());
                h
            }
        };

        let now = Utc::now();
        Ok(users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash),
            is_staff: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?)
    }

    /// 生成示例评分
    /// - ratinguser1..10，清空其旧评分
    /// - 每人随机给 3-7 部电影打 1-5 分
    /// - 最后重算所有汇总
    pub async fn generate_sample_ratings(&self) -> AppResult<SampleRatingsResponse> {
        let movie_ids = self.movie_ids().await?;
        let mut rng = StdRng::from_entropy();
        let mut password_hash = None;

        let mut user_ids = Vec::with_capacity(SAMPLE_RATING_USERS);
        for i in 1..=SAMPLE_RATING_USERS {
            let user = self.ensure_user(&format!("ratinguser{i}"), &mut password_hash).await?;
            user_ids.push(user.id);
        }

        ratings::Entity::delete_many()
            .filter(ratings::Column::UserId.is_in(user_ids.clone()))
            .exec(&self.pool)
            .await?;

        let mut ratings_created = 0;
        for &user_id in &user_ids {
            let wanted = rng.gen_range(3..=7).min(movie_ids.len());
            let picked: Vec<i64> = movie_ids.choose_multiple(&mut rng, wanted).copied().collect();
            for movie_id in picked {
                let now = Utc::now();
                ratings::ActiveModel {
                    user_id: Set(user_id),
                    movie_id: Set(movie_id),
                    rating: Set(rng.gen_range(1..=5)),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
                ratings_created += 1;
            }
        }

        let movies_updated = self.rating_service.update_all_rating_aggregates().await?;
        log::info!("Generated {ratings_created} sample ratings for {} users", user_ids.len());

        Ok(SampleRatingsResponse {
            users: user_ids.len(),
            ratings_created,
            movies_updated,
        })
    }

    /// 生成示例购买事件
    /// - testuser 没有地区时随机分配
    /// - 清空其旧购买事件后，在热门榜窗口内随机生成 20 条
    /// - 最后刷新热门榜快照
    pub async fn generate_sample_purchases(&self) -> AppResult<SamplePurchasesResponse> {
        let region_list = regions::Entity::find()
            .order_by_asc(regions::Column::Id)
            .all(&self.pool)
            .await?;
        if region_list.is_empty() {
            return Err(AppError::ValidationError(
                "No regions found. Seed regions first.".to_string(),
            ));
        }
        let movie_ids = self.movie_ids().await?;

        let mut rng = StdRng::from_entropy();
        let mut password_hash = None;
        let user = self.ensure_user(SAMPLE_PURCHASE_USER, &mut password_hash).await?;

        let existing_link = user_regions::Entity::find()
            .filter(user_regions::Column::UserId.eq(user.id))
            .one(&self.pool)
            .await?;
        let home_region_id = match existing_link {
            Some(link) => link.region_id,
            None => {
                let region_id = region_list[rng.gen_range(0..region_list.len())].id;
                user_regions::ActiveModel {
                    user_id: Set(user.id),
                    region_id: Set(region_id),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
                region_id
            }
        };
        let region_code = region_list
            .iter()
            .find(|r| r.id == home_region_id)
            .map(|r| r.code.clone())
            .unwrap_or_default();

        purchases::Entity::delete_many()
            .filter(purchases::Column::UserId.eq(user.id))
            .exec(&self.pool)
            .await?;

        let end = Utc::now();
        let window_secs = Duration::days(self.period_days).num_seconds();
        for _ in 0..SAMPLE_PURCHASES {
            let movie_id = movie_ids[rng.gen_range(0..movie_ids.len())];
            let region_id = region_list[rng.gen_range(0..region_list.len())].id;
            let purchase_date = end - Duration::seconds(rng.gen_range(0..=window_secs));
            purchases::ActiveModel {
                movie_id: Set(movie_id),
                user_id: Set(user.id),
                region_id: Set(region_id),
                purchase_date: Set(purchase_date),
                quantity: Set(rng.gen_range(1..=3)),
                ..Default::default()
            }
            .insert(&self.pool)
            .await?;
        }

        let refresh = self.trending_service.update_trending_scores().await?;
        log::info!(
            "Generated {SAMPLE_PURCHASES} sample purchases across {} regions",
            region_list.len()
        );

        Ok(SamplePurchasesResponse {
            username: user.username,
            region_code,
            purchases_created: SAMPLE_PURCHASES,
            trending_rows: refresh.rows_written,
        })
    }

    /// 生成带地区偏好的购买数据
    /// - testuser1..5 轮流分配到各地区（已有地区的保留）
    /// - 清空全部购买事件，按天为每个地区生成最近 30 天的数据
    /// - 每天笔数 = 1..=5 + 人口 / 1000 万；70% 概率买地区偏好的电影
    /// - 购买记在该地区第一个用户名下，没有用户的地区跳过
    /// - 最后刷新热门榜快照
    pub async fn generate_realistic_purchases(&self) -> AppResult<RealisticPurchasesResponse> {
        let region_list = regions::Entity::find()
            .order_by_asc(regions::Column::Id)
            .all(&self.pool)
            .await?;
        let movie_ids: Vec<i64> = movies::Entity::find()
            .select_only()
            .column(movies::Column::Id)
            .order_by_asc(movies::Column::Id)
            .into_tuple()
            .all(&self.pool)
            .await?;
        if region_list.is_empty() || movie_ids.is_empty() {
            return Err(AppError::ValidationError(
                "No regions or movies found. Seed regions and add movies first.".to_string(),
            ));
        }

        let mut rng = StdRng::from_entropy();
        let mut password_hash = None;
        for i in 0..REALISTIC_USERS {
            let user = self
                .ensure_user(&format!("testuser{}", i + 1), &mut password_hash)
                .await?;
            let linked = user_regions::Entity::find()
                .filter(user_regions::Column::UserId.eq(user.id))
                .one(&self.pool)
                .await?;
            if linked.is_none() {
                user_regions::ActiveModel {
                    user_id: Set(user.id),
                    region_id: Set(region_list[i % region_list.len()].id),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }

        // 每个地区取最早关联的用户
        let mut region_buyer: HashMap<i64, i64> = HashMap::new();
        for link in user_regions::Entity::find()
            .order_by_asc(user_regions::Column::Id)
            .all(&self.pool)
            .await?
        {
            region_buyer.entry(link.region_id).or_insert(link.user_id);
        }

        let preferred = &movie_ids[..movie_ids.len().min(REALISTIC_PREFERRED_MOVIES)];
        let start = Utc::now() - Duration::days(REALISTIC_DAYS);

        let mut rows = Vec::new();
        for day in 0..REALISTIC_DAYS {
            let day_start = start + Duration::days(day);
            for region in &region_list {
                let Some(&user_id) = region_buyer.get(&region.id) else {
                    continue;
                };
                let daily = rng.gen_range(1..=5) + region.population / POPULATION_PER_EXTRA_PURCHASE;
                for _ in 0..daily {
                    let movie_id = if rng.gen_bool(REALISTIC_PREFERENCE_CHANCE) {
                        preferred[rng.gen_range(0..preferred.len())]
                    } else {
                        movie_ids[rng.gen_range(0..movie_ids.len())]
                    };
                    let purchase_date = day_start
                        + Duration::hours(rng.gen_range(0..=23))
                        + Duration::minutes(rng.gen_range(0..=59));
                    rows.push(purchases::ActiveModel {
                        movie_id: Set(movie_id),
                        user_id: Set(user_id),
                        region_id: Set(region.id),
                        purchase_date: Set(purchase_date),
                        quantity: Set(rng.gen_range(1..=3)),
                        ..Default::default()
                    });
                }
            }
        }
        let purchases_created = rows.len();

        let txn = self.pool.begin().await?;
        purchases::Entity::delete_many().exec(&txn).await?;
        for chunk in rows.chunks(INSERT_CHUNK) {
            purchases::Entity::insert_many(chunk.to_vec()).exec(&txn).await?;
        }
        txn.commit().await?;

        let refresh = self.trending_service.update_trending_scores().await?;
        log::info!(
            "Generated {purchases_created} realistic purchases across {} regions",
            region_buyer.len()
        );

        Ok(RealisticPurchasesResponse {
            users: REALISTIC_USERS,
            regions: region_buyer.len(),
            purchases_created,
            trending_rows: refresh.rows_written,
        })
    }
}
