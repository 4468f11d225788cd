use sea_orm_migration::prelude::*;

use super::m20260201_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    // One row per agency; suspension is not scoped to a month.
    manager
      .create_table(
        Table::create()
          .table(CommissionState::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CommissionState::AgencyId)
              .big_integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(CommissionState::Blocked)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(CommissionState::BlockedAt).date_time().null())
          .col(ColumnDef::new(CommissionState::BlockedBy).big_integer().null())
          .col(ColumnDef::new(CommissionState::DisabledCars).json().not_null())
          .col(ColumnDef::new(CommissionState::UpdatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_commission_state_agency")
              .from(CommissionState::Table, CommissionState::AgencyId)
              .to(Users::Table, Users::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CommissionState::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum CommissionState {
  Table,
  AgencyId,
  Blocked,
  BlockedAt,
  BlockedBy,
  DisabledCars,
  UpdatedAt,
}
