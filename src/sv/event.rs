use sea_orm::entity::prelude::Json;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{EventType, ReminderChannel, commission_event},
  prelude::*,
  sv::period::{MonthPeriod, round_cents},
};

/// Everything needed to append one event. Fields that do not apply to the
/// event type stay at their defaults.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub agency_id: i64,
  pub period: MonthPeriod,
  pub event_type: EventType,
  pub admin_id: Option<i64>,
  pub amount: f64,
  pub payment_date: Option<DateTime>,
  pub reference: Option<String>,
  pub channel: Option<ReminderChannel>,
  pub success: bool,
  pub message: Option<String>,
  pub metadata: Option<Json>,
}

impl NewEvent {
  pub fn new(
    agency_id: i64,
    period: MonthPeriod,
    event_type: EventType,
    admin_id: Option<i64>,
  ) -> Self {
    Self {
      agency_id,
      period,
      event_type,
      admin_id,
      amount: 0.0,
      payment_date: None,
      reference: None,
      channel: None,
      success: true,
      message: None,
      metadata: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
  pub month: Option<u32>,
  pub year: Option<i32>,
  pub amount: Option<f64>,
  pub payment_date: Option<DateTime>,
  pub reference: Option<String>,
  pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastReminder {
  pub at: DateTime,
  pub channel: Option<ReminderChannel>,
  pub success: bool,
}

/// Derived view of an agency's event log for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EventSummary {
  pub collected: f64,
  pub payments: usize,
  pub last_payment_date: Option<DateTime>,
  pub last_reminder: Option<LastReminder>,
}

impl EventSummary {
  /// Folds events in any order; the result only depends on the set of events.
  pub fn fold<'a>(
    events: impl IntoIterator<Item = &'a commission_event::Model>,
  ) -> Self {
    let mut summary = Self::default();
    let mut collected = 0.0;

    for event in events {
      match event.event_type {
        EventType::Payment => {
          collected += event.amount;
          summary.payments += 1;
          let paid_at = event.payment_date.unwrap_or(event.created_at);
          if summary.last_payment_date.is_none_or(|last| paid_at > last) {
            summary.last_payment_date = Some(paid_at);
          }
        }
        EventType::Reminder => {
          if summary.last_reminder.is_none_or(|last| event.created_at > last.at)
          {
            summary.last_reminder = Some(LastReminder {
              at: event.created_at,
              channel: event.channel,
              success: event.success,
            });
          }
        }
        EventType::Block | EventType::Unblock | EventType::Note => {}
      }
    }

    summary.collected = round_cents(collected);
    summary
  }
}

pub struct Events<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Events<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Inserts an event on any connection, so cascades can append inside their
  /// own transaction.
  pub async fn append_on<C: ConnectionTrait>(
    conn: &C,
    event: NewEvent,
  ) -> Result<commission_event::Model> {
    let (month, year) = event.period.key();

    let model = commission_event::ActiveModel {
      id: NotSet,
      agency_id: Set(event.agency_id),
      month: Set(month),
      year: Set(year),
      event_type: Set(event.event_type),
      admin_id: Set(event.admin_id),
      amount: Set(event.amount),
      payment_date: Set(event.payment_date),
      reference: Set(event.reference),
      channel: Set(event.channel),
      success: Set(event.success),
      message: Set(event.message),
      metadata: Set(event.metadata),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(conn)
    .await?;

    debug!(
      "commission event #{} ({:?}) appended for agency {} {}/{}",
      model.id, model.event_type, model.agency_id, month, year
    );
    Ok(model)
  }

  pub async fn append(&self, event: NewEvent) -> Result<commission_event::Model> {
    Self::append_on(self.db, event).await
  }

  /// Events of one agency and month, newest first.
  pub async fn for_period(
    &self,
    agency_id: i64,
    period: &MonthPeriod,
  ) -> Result<Vec<commission_event::Model>> {
    let (month, year) = period.key();

    Ok(
      commission_event::Entity::find()
        .filter(commission_event::Column::AgencyId.eq(agency_id))
        .filter(commission_event::Column::Month.eq(month))
        .filter(commission_event::Column::Year.eq(year))
        .order_by_desc(commission_event::Column::CreatedAt)
        .order_by_desc(commission_event::Column::Id)
        .all(self.db)
        .await?,
    )
  }

  pub async fn for_agencies(
    &self,
    agency_ids: &[i64],
    period: &MonthPeriod,
  ) -> Result<HashMap<i64, Vec<commission_event::Model>>> {
    if agency_ids.is_empty() {
      return Ok(HashMap::new());
    }

    let (month, year) = period.key();
    let events = commission_event::Entity::find()
      .filter(commission_event::Column::AgencyId.is_in(agency_ids.to_vec()))
      .filter(commission_event::Column::Month.eq(month))
      .filter(commission_event::Column::Year.eq(year))
      .all(self.db)
      .await?;

    let mut grouped: HashMap<i64, Vec<_>> = HashMap::new();
    for event in events {
      grouped.entry(event.agency_id).or_default().push(event);
    }
    Ok(grouped)
  }

  pub async fn record_payment(
    &self,
    admin_id: i64,
    agency_id: i64,
    input: PaymentInput,
  ) -> Result<commission_event::Model> {
    let period = super::period::require_period(input.year, input.month)?;
    let amount = input
      .amount
      .filter(|amount| amount.is_finite() && *amount > 0.0)
      .ok_or_else(|| {
        Error::InvalidArgs("Payment amount must be positive".into())
      })?;

    super::User::new(self.db).agency(agency_id).await?;

    let mut event =
      NewEvent::new(agency_id, period, EventType::Payment, Some(admin_id));
    event.amount = round_cents(amount);
    event.payment_date =
      Some(input.payment_date.unwrap_or_else(|| Utc::now().naive_utc()));
    event.reference = non_empty(input.reference);
    event.message = non_empty(input.note);

    let event = self.append(event).await?;
    info!(
      "payment of {:.2} recorded for agency {} ({}/{}) by {}",
      event.amount, agency_id, period.month, period.year, admin_id
    );
    Ok(event)
  }

  pub async fn add_note(
    &self,
    admin_id: i64,
    agency_id: i64,
    period: MonthPeriod,
    note: &str,
  ) -> Result<commission_event::Model> {
    let note = note.trim();
    if note.is_empty() {
      return Err(Error::InvalidArgs("Note must not be empty".into()));
    }

    super::User::new(self.db).agency(agency_id).await?;

    let mut event =
      NewEvent::new(agency_id, period, EventType::Note, Some(admin_id));
    event.message = Some(note.to_string());

    let event = self.append(event).await?;
    info!(
      "note added for agency {} ({}/{}) by {}",
      agency_id, period.month, period.year, admin_id
    );
    Ok(event)
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
