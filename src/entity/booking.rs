use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "reserved")]
  Reserved,
  #[sea_orm(string_value = "deposit")]
  Deposit,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
  #[sea_orm(string_value = "void")]
  Void,
}

impl BookingStatus {
  /// Statuses that generate a commission obligation.
  pub const ELIGIBLE: [BookingStatus; 3] =
    [BookingStatus::Reserved, BookingStatus::Deposit, BookingStatus::Paid];

  pub fn is_eligible(self) -> bool {
    Self::ELIGIBLE.contains(&self)
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub supplier_id: i64,
  pub car_id: Option<i64>,
  pub price: f64,
  pub commission_total: f64,
  pub status: BookingStatus,
  pub from_date: DateTime,
  pub to_date: DateTime,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::SupplierId",
    to = "user::Column::Id"
  )]
  Supplier,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Supplier.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
