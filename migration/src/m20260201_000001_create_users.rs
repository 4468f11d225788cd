use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Users::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(Users::Id)
              .big_integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(Users::FullName).string().not_null())
          .col(ColumnDef::new(Users::Email).string().null())
          .col(ColumnDef::new(Users::Phone).string().null())
          .col(
            ColumnDef::new(Users::Language)
              .string()
              .not_null()
              .default("fr"),
          )
          .col(ColumnDef::new(Users::Slug).string().null())
          .col(ColumnDef::new(Users::City).string().null())
          .col(ColumnDef::new(Users::Role).string().not_null().default("user"))
          .col(
            ColumnDef::new(Users::Blacklisted)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(ColumnDef::new(Users::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Users {
  Table,
  Id,
  FullName,
  Email,
  Phone,
  Language,
  Slug,
  City,
  Role,
  Blacklisted,
  CreatedAt,
}
