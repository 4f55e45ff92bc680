use crate::entities::{
    movie_entity as movies, movie_purchase_entity as purchases, order_entity as orders,
    order_item_entity as order_items,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::region_service::find_user_region;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashMap;

fn quantity_too_large() -> AppError {
    AppError::ValidationError("Quantity is too large.".to_string())
}

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 结算购物车
    ///
    /// 同一事务内:
    /// 1. 按当前单价计算总价并创建订单
    /// 2. 写入订单明细（单价快照）
    /// 3. 用户已设置地区时，为每个明细写一条购买事件（热门榜数据源）
    pub async fn checkout(&self, user_id: i64, request: CheckoutRequest) -> AppResult<OrderResponse> {
        // 合并重复的电影，保持首次出现顺序
        let mut cart: Vec<CartItem> = Vec::new();
        for item in request.items {
            if item.quantity < 1 {
                return Err(AppError::ValidationError(
                    "Quantity must be at least 1.".to_string(),
                ));
            }
            match cart.iter_mut().find(|c| c.movie_id == item.movie_id) {
                Some(existing) => {
                    existing.quantity = existing
                        .quantity
                        .checked_add(item.quantity)
                        .ok_or_else(quantity_too_large)?;
                }
                None => cart.push(item),
            }
        }
        if cart.is_empty() {
            return Err(AppError::ValidationError("Your cart is empty.".to_string()));
        }

        let txn = self.pool.begin().await?;

        let ids: Vec<i64> = cart.iter().map(|c| c.movie_id).collect();
        let movie_map: HashMap<i64, movies::Model> = movies::Entity::find()
            .filter(movies::Column::Id.is_in(ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut total = 0i64;
        for item in &cart {
            let movie = movie_map
                .get(&item.movie_id)
                .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", item.movie_id)))?;
            total = movie
                .price
                .checked_mul(i64::from(item.quantity))
                .and_then(|line| total.checked_add(line))
                .ok_or_else(quantity_too_large)?;
        }

        let now = Utc::now();
        let order = orders::ActiveModel {
            user_id: Set(user_id),
            total: Set(total),
            date: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let region = find_user_region(&txn, user_id).await?;

        let mut items = Vec::with_capacity(cart.len());
        for item in &cart {
            let Some(movie) = movie_map.get(&item.movie_id) else {
                continue;
            };
            let row = order_items::ActiveModel {
                order_id: Set(order.id),
                movie_id: Set(movie.id),
                price: Set(movie.price),
                quantity: Set(item.quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            if let Some(region) = &region {
                purchases::ActiveModel {
                    movie_id: Set(movie.id),
                    user_id: Set(user_id),
                    region_id: Set(region.id),
                    purchase_date: Set(now),
                    quantity: Set(item.quantity),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }

            items.push(OrderItemResponse::from_model(row, movie.name.clone()));
        }

        txn.commit().await?;

        log::info!("Order {} placed by user {user_id}, total {total}", order.id);
        Ok(OrderResponse::from_model(order, items))
    }

    /// 用户订单（分页，最新在前）
    pub async fn list_orders(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let base = orders::Entity::find().filter(orders::Column::UserId.eq(user_id));
        let total = base.clone().count(&self.pool).await?;

        let order_rows = base
            .order_by_desc(orders::Column::Date)
            .order_by_desc(orders::Column::Id)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        let order_ids: Vec<i64> = order_rows.iter().map(|o| o.id).collect();
        let item_rows = if order_ids.is_empty() {
            Vec::new()
        } else {
            order_items::Entity::find()
                .filter(order_items::Column::OrderId.is_in(order_ids))
                .order_by_asc(order_items::Column::Id)
                .all(&self.pool)
                .await?
        };

        let movie_ids: Vec<i64> = item_rows.iter().map(|i| i.movie_id).collect();
        let names: HashMap<i64, String> = if movie_ids.is_empty() {
            HashMap::new()
        } else {
            movies::Entity::find()
                .filter(movies::Column::Id.is_in(movie_ids))
                .all(&self.pool)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect()
        };

        let mut grouped: HashMap<i64, Vec<OrderItemResponse>> = HashMap::new();
        for item in item_rows {
            let name = names.get(&item.movie_id).cloned().unwrap_or_default();
            grouped
                .entry(item.order_id)
                .or_default()
                .push(OrderItemResponse::from_model(item, name));
        }

        let list = order_rows
            .into_iter()
            .map(|o| {
                let items = grouped.remove(&o.id).unwrap_or_default();
                OrderResponse::from_model(o, items)
            })
            .collect();

        Ok(PaginatedResponse::new(list, params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RegionService;
    use crate::test_support::{create_test_db, insert_movie, insert_user};

    fn item(movie_id: i64, quantity: i32) -> CartItem {
        CartItem { movie_id, quantity }
    }

    #[tokio::test]
    async fn test_checkout_creates_order_and_items() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let a = insert_movie(&db, "A", 10).await;
        let b = insert_movie(&db, "B", 4).await;
        let svc = OrderService::new(db.clone());

        let order = svc
            .checkout(user.id, CheckoutRequest { items: vec![item(a.id, 2), item(b.id, 1), item(a.id, 1)] })
            .await
            .unwrap();
        assert_eq!(order.total, 34);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].quantity, 3);

        // 未设置地区：不产生购买事件
        assert_eq!(purchases::Entity::find().count(&db).await.unwrap(), 0);

        let page = svc.list_orders(user.id, &PaginationParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].items.len(), 2);
        assert_eq!(page.items[0].items[1].movie_name, "B");
    }

    #[tokio::test]
    async fn test_checkout_records_purchases_for_region() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "A", 10).await;
        let regions = RegionService::new(db.clone());
        let region = regions.list_regions().await.unwrap().remove(0);
        regions.set_user_region(user.id, Some(region.id)).await.unwrap();

        OrderService::new(db.clone())
            .checkout(user.id, CheckoutRequest { items: vec![item(movie.id, 2)] })
            .await
            .unwrap();

        let rows = purchases::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region_id, region.id);
        assert_eq!(rows[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_checkout_validation() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "A", 10).await;
        let svc = OrderService::new(db.clone());

        let err = svc.checkout(user.id, CheckoutRequest { items: vec![] }).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = svc
            .checkout(user.id, CheckoutRequest { items: vec![item(movie.id, 0)] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let err = svc
            .checkout(user.id, CheckoutRequest { items: vec![item(movie.id, 1), item(9999, 1)] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // 失败的结算不留下订单
        assert_eq!(orders::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_checkout_rejects_overflowing_quantities() {
        let db = create_test_db().await;
        let user = insert_user(&db, "norma", false).await;
        let movie = insert_movie(&db, "A", 10).await;
        let pricey = insert_movie(&db, "B", i64::MAX / 2).await;
        let svc = OrderService::new(db.clone());

        let err = svc
            .checkout(user.id, CheckoutRequest { items: vec![item(movie.id, i32::MAX), item(movie.id, 1)] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(msg) if msg == "Quantity is too large."));

        let err = svc
            .checkout(user.id, CheckoutRequest { items: vec![item(pricey.id, 3)] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        assert_eq!(orders::Entity::find().count(&db).await.unwrap(), 0);
    }
}
