use crate::entities::{region_entity as regions, user_region_entity as user_regions};
use crate::error::{AppError, AppResult};
use crate::models::RegionResponse;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};

/// 示例地区: (name, code, latitude, longitude, population)
pub const SAMPLE_REGIONS: [(&str, &str, f64, f64, i64); 5] = [
    ("Georgia", "US-GA", 33.7490, -84.3880, 10_711_908),
    ("California", "US-CA", 36.7783, -119.4179, 39_538_223),
    ("New York", "US-NY", 42.1657, -74.9481, 20_201_249),
    ("Texas", "US-TX", 31.9686, -98.5350, 29_145_505),
    ("Florida", "US-FL", 27.7663, -82.6404, 21_538_187),
];

/// 查询用户所属地区
pub(crate) async fn find_user_region<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<Option<regions::Model>> {
    let Some(link) = user_regions::Entity::find()
        .filter(user_regions::Column::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    Ok(regions::Entity::find_by_id(link.region_id).one(db).await?)
}

#[derive(Clone)]
pub struct RegionService {
    pool: DatabaseConnection,
}

impl RegionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 启用中的地区，按名称排序
    pub async fn list_regions(&self) -> AppResult<Vec<RegionResponse>> {
        let list = regions::Entity::find()
            .filter(regions::Column::IsActive.eq(true))
            .order_by_asc(regions::Column::Name)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn get_region(&self, region_id: i64) -> AppResult<regions::Model> {
        regions::Entity::find_by_id(region_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Region not found".to_string()))
    }

    pub async fn get_user_region(&self, user_id: i64) -> AppResult<Option<RegionResponse>> {
        Ok(find_user_region(&self.pool, user_id).await?.map(Into::into))
    }

    /// 设置用户地区（存在则更新）；`region_id` 为空或 0 视为未提供
    pub async fn set_user_region(&self, user_id: i64, region_id: Option<i64>) -> AppResult<RegionResponse> {
        let region_id = region_id
            .filter(|&id| id != 0)
            .ok_or_else(|| AppError::ValidationError("Region ID is required".to_string()))?;
        let region = self.get_region(region_id).await?;

        let existing = user_regions::Entity::find()
            .filter(user_regions::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;

        let now = Utc::now();
        match existing {
            Some(link) => {
                let mut am = link.into_active_model();
                am.region_id = Set(region.id);
                am.updated_at = Set(now);
                am.update(&self.pool).await?;
            }
            None => {
                user_regions::ActiveModel {
                    user_id: Set(user_id),
                    region_id: Set(region.id),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.pool)
                .await?;
            }
        }

        Ok(region.into())
    }

    /// 按 code get-or-create 示例地区，返回新建数量
    pub async fn create_sample_regions(&self) -> AppResult<usize> {
        let mut created = 0;
        for (name, code, latitude, longitude, population) in SAMPLE_REGIONS {
            let exists = regions::Entity::find()
                .filter(regions::Column::Code.eq(code))
                .one(&self.pool)
                .await?
                .is_some();
            if exists {
                continue;
            }

            regions::ActiveModel {
                name: Set(name.to_string()),
                code: Set(code.to_string()),
                latitude: Set(latitude),
                longitude: Set(longitude),
                population: Set(population),
                is_active: Set(true),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&self.pool)
            .await?;
            created += 1;
        }

        log::info!("Sample regions ensured, {created} created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_db, insert_user};

    #[tokio::test]
    async fn test_seeded_regions_are_listed() {
        let svc = RegionService::new(create_test_db().await);
        let list = svc.list_regions().await.unwrap();
        let codes: Vec<&str> = list.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["US-CA", "US-FL", "US-GA", "US-NY", "US-TX"]);
    }

    #[tokio::test]
    async fn test_create_sample_regions_is_idempotent() {
        let db = create_test_db().await;
        regions::Entity::delete_many()
            .filter(regions::Column::Code.eq("US-TX"))
            .exec(&db)
            .await
            .unwrap();

        let svc = RegionService::new(db);
        assert_eq!(svc.create_sample_regions().await.unwrap(), 1);
        assert_eq!(svc.create_sample_regions().await.unwrap(), 0);
        assert_eq!(svc.list_regions().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_set_user_region() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let svc = RegionService::new(db);
        let regions = svc.list_regions().await.unwrap();

        assert!(svc.get_user_region(user.id).await.unwrap().is_none());

        let err = svc.set_user_region(user.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Region ID is required"));
        let err = svc.set_user_region(user.id, Some(0)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Region ID is required"));
        let err = svc.set_user_region(user.id, Some(9999)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        svc.set_user_region(user.id, Some(regions[0].id)).await.unwrap();
        svc.set_user_region(user.id, Some(regions[1].id)).await.unwrap();
        let current = svc.get_user_region(user.id).await.unwrap().unwrap();
        assert_eq!(current.id, regions[1].id);
    }
}
