use sea_orm_migration::prelude::*;

use super::m20260201_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Cars::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Cars::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Cars::SupplierId).big_integer().not_null())
          .col(ColumnDef::new(Cars::Name).string().not_null())
          .col(
            ColumnDef::new(Cars::Available)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Cars::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_cars_supplier")
              .from(Cars::Table, Cars::SupplierId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_cars_supplier")
          .table(Cars::Table)
          .col(Cars::SupplierId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Cars::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Cars {
  Table,
  Id,
  SupplierId,
  Name,
  Available,
  CreatedAt,
}
