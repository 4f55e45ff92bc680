//! 测试辅助函数：内存数据库与常用测试数据

use crate::entities::{movie_entity as movies, user_entity as users};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

/// 创建已迁移的内存数据库（单连接，保证所有查询落在同一个库上）
pub async fn create_test_db() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("connect in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn insert_user(db: &DatabaseConnection, username: &str, is_staff: bool) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        username: Set(username.to_string()),
        // 非真实哈希，仅用于不涉及登录的测试
        password_hash: Set("!".to_string()),
        is_staff: Set(is_staff),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn insert_movie(db: &DatabaseConnection, name: &str, price: i64) -> movies::Model {
    movies::ActiveModel {
        name: Set(name.to_string()),
        price: Set(price),
        description: Set(format!("{name} description")),
        image: Set(format!("movie_images/{}.jpg", name.to_lowercase())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert movie")
}
