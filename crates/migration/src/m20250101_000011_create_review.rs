//! Create `review`: consumer ratings, visible once approved by an admin.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(uuid(Review::Id).primary_key())
                    .col(uuid(Review::ProductId).not_null())
                    .col(uuid(Review::UserId).not_null())
                    .col(integer(Review::Rating).not_null())
                    .col(string_len_null(Review::Comment, 1000))
                    .col(boolean(Review::IsApproved).not_null())
                    .col(timestamp_with_time_zone(Review::CreatedAt).not_null())
                    .col(timestamp_with_time_zone_null(Review::ApprovedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_product")
                            .from(Review::Table, Review::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_user")
                            .from(Review::Table, Review::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Review::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Review { Table, Id, ProductId, UserId, Rating, Comment, IsApproved, CreatedAt, ApprovedAt }

#[derive(DeriveIden)]
enum Product { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
