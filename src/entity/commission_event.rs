use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum EventType {
  #[sea_orm(string_value = "payment")]
  Payment,
  #[sea_orm(string_value = "reminder")]
  Reminder,
  #[sea_orm(string_value = "block")]
  Block,
  #[sea_orm(string_value = "unblock")]
  Unblock,
  #[sea_orm(string_value = "note")]
  Note,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ReminderChannel {
  #[sea_orm(string_value = "email")]
  #[default]
  Email,
  #[sea_orm(string_value = "sms")]
  Sms,
  #[sea_orm(string_value = "email_and_sms")]
  EmailAndSms,
}

impl ReminderChannel {
  pub fn uses_email(self) -> bool {
    matches!(self, Self::Email | Self::EmailAndSms)
  }

  pub fn uses_sms(self) -> bool {
    matches!(self, Self::Sms | Self::EmailAndSms)
  }
}

/// Append-only fact about an agency's commission account. Rows are inserted
/// once and never updated or deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_events")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i64,
  pub agency_id: i64,
  pub month: i32,
  pub year: i32,
  pub event_type: EventType,
  pub admin_id: Option<i64>,
  pub amount: f64,
  pub payment_date: Option<DateTime>,
  pub reference: Option<String>,
  pub channel: Option<ReminderChannel>,
  pub success: bool,
  pub message: Option<String>,
  pub metadata: Option<Json>,
  pub created_at: DateTime,
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
