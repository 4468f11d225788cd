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
          .table(CommissionEvents::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CommissionEvents::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(CommissionEvents::AgencyId).big_integer().not_null(),
          )
          .col(ColumnDef::new(CommissionEvents::Month).integer().not_null())
          .col(ColumnDef::new(CommissionEvents::Year).integer().not_null())
          .col(ColumnDef::new(CommissionEvents::EventType).string().not_null())
          .col(ColumnDef::new(CommissionEvents::AdminId).big_integer().null())
          .col(
            ColumnDef::new(CommissionEvents::Amount)
              .double()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(CommissionEvents::PaymentDate).date_time().null())
          .col(ColumnDef::new(CommissionEvents::Reference).string().null())
          .col(ColumnDef::new(CommissionEvents::Channel).string().null())
          .col(
            ColumnDef::new(CommissionEvents::Success)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(CommissionEvents::Message).text().null())
          .col(ColumnDef::new(CommissionEvents::Metadata).json().null())
          .col(
            ColumnDef::new(CommissionEvents::CreatedAt).date_time().not_null(),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_commission_events_agency")
              .from(CommissionEvents::Table, CommissionEvents::AgencyId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_commission_events_period")
          .table(CommissionEvents::Table)
          .col(CommissionEvents::AgencyId)
          .col(CommissionEvents::Month)
          .col(CommissionEvents::Year)
          .col(CommissionEvents::EventType)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CommissionEvents::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum CommissionEvents {
  Table,
  Id,
  AgencyId,
  Month,
  Year,
  EventType,
  AdminId,
  Amount,
  PaymentDate,
  Reference,
  Channel,
  Success,
  Message,
  Metadata,
  CreatedAt,
}
