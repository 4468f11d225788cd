use sea_orm_migration::prelude::*;

use super::{
  m20260201_000001_create_users::Users, m20260201_000002_create_cars::Cars,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Bookings::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Bookings::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Bookings::SupplierId).big_integer().not_null())
          .col(ColumnDef::new(Bookings::CarId).big_integer().null())
          .col(ColumnDef::new(Bookings::Price).double().not_null().default(0))
          .col(
            ColumnDef::new(Bookings::CommissionTotal)
              .double()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Bookings::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Bookings::FromDate).date_time().not_null())
          .col(ColumnDef::new(Bookings::ToDate).date_time().not_null())
          .col(ColumnDef::new(Bookings::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_bookings_supplier")
              .from(Bookings::Table, Bookings::SupplierId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_bookings_car")
              .from(Bookings::Table, Bookings::CarId)
              .to(Cars::Table, Cars::Id)
              .on_delete(ForeignKeyAction::SetNull),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_bookings_supplier_from")
          .table(Bookings::Table)
          .col(Bookings::SupplierId)
          .col(Bookings::FromDate)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Bookings::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Bookings {
  Table,
  Id,
  SupplierId,
  CarId,
  Price,
  CommissionTotal,
  Status,
  FromDate,
  ToDate,
  CreatedAt,
}
