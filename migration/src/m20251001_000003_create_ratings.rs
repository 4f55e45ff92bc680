use crate::m20251001_000001_create_accounts::Users;
use crate::m20251001_000002_create_catalog::Movies;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum MovieRatings {
    Table,
    Id,
    UserId,
    MovieId,
    Rating,
    CreatedAt,
    UpdatedAt,
}

/// 评分汇总（派生数据，可随时由 movie_ratings 重算）
#[derive(DeriveIden)]
enum RatingAggregates {
    Table,
    Id,
    MovieId,
    AverageRating,
    TotalRatings,
    #[sea_orm(iden = "rating_1_count")]
    Rating1Count,
    #[sea_orm(iden = "rating_2_count")]
    Rating2Count,
    #[sea_orm(iden = "rating_3_count")]
    Rating3Count,
    #[sea_orm(iden = "rating_4_count")]
    Rating4Count,
    #[sea_orm(iden = "rating_5_count")]
    Rating5Count,
    LastUpdated,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MovieRatings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MovieRatings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MovieRatings::UserId).big_integer().not_null())
                    .col(ColumnDef::new(MovieRatings::MovieId).big_integer().not_null())
                    .col(
                        ColumnDef::new(MovieRatings::Rating)
                            .integer()
                            .not_null()
                            .check(Expr::col(MovieRatings::Rating).between(1, 5)),
                    )
                    .col(
                        ColumnDef::new(MovieRatings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovieRatings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_ratings_user")
                            .from(MovieRatings::Table, MovieRatings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_ratings_movie")
                            .from(MovieRatings::Table, MovieRatings::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 每个用户对每部电影只能有一条评分
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_movie_ratings_user_movie")
                    .table(MovieRatings::Table)
                    .col(MovieRatings::UserId)
                    .col(MovieRatings::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movie_ratings_movie_rating")
                    .table(MovieRatings::Table)
                    .col(MovieRatings::MovieId)
                    .col(MovieRatings::Rating)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_movie_ratings_user_created")
                    .table(MovieRatings::Table)
                    .col(MovieRatings::UserId)
                    .col(MovieRatings::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RatingAggregates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RatingAggregates::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::MovieId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::AverageRating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::TotalRatings)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::Rating1Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::Rating2Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::Rating3Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::Rating4Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::Rating5Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RatingAggregates::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_aggregates_movie")
                            .from(RatingAggregates::Table, RatingAggregates::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(RatingAggregates::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(MovieRatings::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
