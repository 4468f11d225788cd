use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(CommissionSettings::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(CommissionSettings::Id)
              .integer()
              .not_null()
              .primary_key(),
          )
          .col(
            ColumnDef::new(CommissionSettings::ReminderChannel)
              .string()
              .not_null()
              .default("email"),
          )
          .col(
            ColumnDef::new(CommissionSettings::EmailTemplate).text().not_null(),
          )
          .col(ColumnDef::new(CommissionSettings::SmsTemplate).text().not_null())
          .col(
            ColumnDef::new(CommissionSettings::BankTransferEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(CommissionSettings::CardPaymentEnabled)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(
            ColumnDef::new(CommissionSettings::D17PaymentEnabled)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(CommissionSettings::BankTransferRibDetails)
              .json()
              .null(),
          )
          .col(
            ColumnDef::new(CommissionSettings::UpdatedBy).big_integer().null(),
          )
          .col(
            ColumnDef::new(CommissionSettings::UpdatedAt)
              .date_time()
              .not_null(),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(CommissionSettings::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum CommissionSettings {
  Table,
  Id,
  ReminderChannel,
  EmailTemplate,
  SmsTemplate,
  BankTransferEnabled,
  CardPaymentEnabled,
  D17PaymentEnabled,
  BankTransferRibDetails,
  UpdatedBy,
  UpdatedAt,
}
