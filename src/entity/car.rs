use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub supplier_id: i64,
  pub name: String,
  pub available: bool,
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
