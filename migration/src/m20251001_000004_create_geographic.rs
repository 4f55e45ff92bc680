use crate::m20251001_000001_create_accounts::Users;
use crate::m20251001_000002_create_catalog::Movies;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveIden)]
enum Regions {
    Table,
    Id,
    Name,
    Code,
    Latitude,
    Longitude,
    Population,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserRegions {
    Table,
    Id,
    UserId,
    RegionId,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MoviePurchases {
    Table,
    Id,
    MovieId,
    UserId,
    RegionId,
    PurchaseDate,
    Quantity,
}

/// 热门榜快照（派生数据，每次刷新整体替换）
#[derive(DeriveIden)]
enum TrendingMovies {
    Table,
    Id,
    MovieId,
    RegionId,
    PurchaseCount,
    ViewCount,
    TrendingScore,
    PeriodStart,
    PeriodEnd,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Regions are static reference data; the five sample US states are seeded
/// here so a fresh database can compute trending immediately.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Regions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Regions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Regions::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Regions::Code)
                            .string_len(10)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Regions::Latitude).double().not_null())
                    .col(ColumnDef::new(Regions::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Regions::Population)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Regions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Regions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRegions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRegions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserRegions::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(UserRegions::RegionId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UserRegions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_regions_user")
                            .from(UserRegions::Table, UserRegions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_regions_region")
                            .from(UserRegions::Table, UserRegions::RegionId)
                            .to(Regions::Table, Regions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MoviePurchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MoviePurchases::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MoviePurchases::MovieId).big_integer().not_null())
                    .col(ColumnDef::new(MoviePurchases::UserId).big_integer().not_null())
                    .col(ColumnDef::new(MoviePurchases::RegionId).big_integer().not_null())
                    .col(
                        ColumnDef::new(MoviePurchases::PurchaseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MoviePurchases::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_purchases_movie")
                            .from(MoviePurchases::Table, MoviePurchases::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_purchases_user")
                            .from(MoviePurchases::Table, MoviePurchases::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_purchases_region")
                            .from(MoviePurchases::Table, MoviePurchases::RegionId)
                            .to(Regions::Table, Regions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movie_purchases_region_date")
                    .table(MoviePurchases::Table)
                    .col(MoviePurchases::RegionId)
                    .col(MoviePurchases::PurchaseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TrendingMovies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TrendingMovies::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TrendingMovies::MovieId).big_integer().not_null())
                    .col(ColumnDef::new(TrendingMovies::RegionId).big_integer().not_null())
                    .col(
                        ColumnDef::new(TrendingMovies::PurchaseCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TrendingMovies::ViewCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TrendingMovies::TrendingScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(TrendingMovies::PeriodStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrendingMovies::PeriodEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrendingMovies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trending_movies_movie")
                            .from(TrendingMovies::Table, TrendingMovies::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trending_movies_region")
                            .from(TrendingMovies::Table, TrendingMovies::RegionId)
                            .to(Regions::Table, Regions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_trending_movies_movie_region_period")
                    .table(TrendingMovies::Table)
                    .col(TrendingMovies::MovieId)
                    .col(TrendingMovies::RegionId)
                    .col(TrendingMovies::PeriodStart)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 初始地区数据
        let conn = manager.get_connection();
        let insert_sql = r#"
INSERT INTO regions (name, code, latitude, longitude, population, is_active, created_at)
VALUES
 ('Georgia', 'US-GA', 33.7490, -84.3880, 10711908, TRUE, '2025-10-01T00:00:00+00:00'),
 ('California', 'US-CA', 36.7783, -119.4179, 39538223, TRUE, '2025-10-01T00:00:00+00:00'),
 ('New York', 'US-NY', 42.1657, -74.9481, 20201249, TRUE, '2025-10-01T00:00:00+00:00'),
 ('Texas', 'US-TX', 31.9686, -98.5350, 29145505, TRUE, '2025-10-01T00:00:00+00:00'),
 ('Florida', 'US-FL', 27.7663, -82.6404, 21538187, TRUE, '2025-10-01T00:00:00+00:00')
ON CONFLICT (code) DO NOTHING;
"#;
        conn.execute(Statement::from_string(
            manager.get_database_backend(),
            insert_sql.to_string(),
        ))
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TrendingMovies::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MoviePurchases::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserRegions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Regions::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
