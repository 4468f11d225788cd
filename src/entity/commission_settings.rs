use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::commission_event::ReminderChannel;

/// Well-known id of the single settings row.
pub const SINGLETON_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_settings")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i32,
  pub reminder_channel: ReminderChannel,
  pub email_template: String,
  pub sms_template: String,
  pub bank_transfer_enabled: bool,
  pub card_payment_enabled: bool,
  pub d17_payment_enabled: bool,
  pub bank_transfer_rib_details: Option<Json>,
  pub updated_by: Option<i64>,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
