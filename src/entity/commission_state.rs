use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

/// Mutable suspension flags, one row per agency. `disabled_cars` holds a JSON
/// array of car ids and is empty whenever `blocked` is false.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_state")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub agency_id: i64,
  pub blocked: bool,
  pub blocked_at: Option<DateTime>,
  pub blocked_by: Option<i64>,
  pub disabled_cars: Json,
  pub updated_at: DateTime,
}

impl Model {
  pub fn disabled_car_ids(&self) -> Vec<i64> {
    self
      .disabled_cars
      .as_array()
      .map(|ids| ids.iter().filter_map(|id| id.as_i64()).collect())
      .unwrap_or_default()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::AgencyId",
    to = "user::Column::Id"
  )]
  Agency,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Agency.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
