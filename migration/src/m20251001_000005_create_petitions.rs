use crate::m20251001_000001_create_accounts::Users;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Petitions {
    Table,
    Id,
    Title,
    Description,
    MovieTitle,
    MovieYear,
    MovieDirector,
    CreatedBy,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    Id,
    UserId,
    PetitionId,
    VoteType,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Petitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Petitions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Petitions::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Petitions::Description).text().not_null())
                    .col(ColumnDef::new(Petitions::MovieTitle).string_len(200).not_null())
                    .col(ColumnDef::new(Petitions::MovieYear).integer().null())
                    .col(ColumnDef::new(Petitions::MovieDirector).string_len(100).null())
                    .col(ColumnDef::new(Petitions::CreatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Petitions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Petitions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Petitions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_petitions_created_by")
                            .from(Petitions::Table, Petitions::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::PetitionId).big_integer().not_null())
                    .col(ColumnDef::new(Votes::VoteType).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Votes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_user")
                            .from(Votes::Table, Votes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_petition")
                            .from(Votes::Table, Votes::PetitionId)
                            .to(Petitions::Table, Petitions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一用户对同一请愿只能投一票；应用层检查之外由唯一索引兜底
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_votes_user_petition")
                    .table(Votes::Table)
                    .col(Votes::UserId)
                    .col(Votes::PetitionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Votes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Petitions::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
