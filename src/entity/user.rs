use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{booking, car};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
  #[sea_orm(string_value = "user")]
  #[default]
  User,
  #[sea_orm(string_value = "supplier")]
  Supplier,
  #[sea_orm(string_value = "admin")]
  Admin,
}

/// Users and agencies share one table; an agency is a user with the
/// `supplier` role.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub full_name: String,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub language: String,
  pub slug: Option<String>,
  pub city: Option<String>,
  pub role: UserRole,
  pub blacklisted: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "car::Entity")]
  Cars,
  #[sea_orm(has_many = "booking::Entity")]
  Bookings,
}

impl Related<car::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Cars.def()
  }
}

impl Related<booking::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Bookings.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
