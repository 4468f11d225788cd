//! One agency's monthly commission detail, including the per-booking
//! payment status derived from the collected total.

use serde::Serialize;

use crate::{
  entity::{
    BookingStatus, EventType, ReminderChannel, booking, commission_event,
    commission_state, user,
  },
  prelude::*,
  sv::{
    self,
    event::EventSummary,
    period::{AgencyStatus, Figures, MonthPeriod, Rules, to_cents},
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Paid,
  Partial,
  Unpaid,
}

/// Consumes `collected` across `owed` amounts in the given order (oldest
/// booking first). Once the pool runs dry no later booking is paid, and a
/// partially covered booking consumes whatever was left.
pub fn allocate(owed: &[f64], collected: f64) -> Vec<PaymentStatus> {
  let mut remaining = to_cents(collected).max(0);

  owed
    .iter()
    .map(|&amount| {
      let owed = to_cents(amount);
      if owed <= 0 {
        PaymentStatus::Paid
      } else if remaining >= owed {
        remaining -= owed;
        PaymentStatus::Paid
      } else if remaining > 0 {
        remaining = 0;
        PaymentStatus::Partial
      } else {
        PaymentStatus::Unpaid
      }
    })
    .collect()
}

/// Commission a booking generates; ineligible bookings owe nothing.
pub fn owed_by(booking: &booking::Model) -> f64 {
  if booking.status.is_eligible() { booking.commission_total } else { 0.0 }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgencyInfo {
  pub id: i64,
  pub name: String,
  pub city: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub slug: Option<String>,
  pub status: AgencyStatus,
  pub blocked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
  #[serde(flatten)]
  pub figures: Figures,
  pub threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminRef {
  pub id: i64,
  pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
  pub id: i64,
  pub event_type: EventType,
  pub created_at: DateTime,
  pub amount: f64,
  pub payment_date: Option<DateTime>,
  pub reference: Option<String>,
  pub channel: Option<ReminderChannel>,
  pub success: bool,
  pub message: Option<String>,
  pub metadata: Option<json::Value>,
  pub admin: Option<AdminRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingAllocation {
  pub booking_id: i64,
  pub car_id: Option<i64>,
  pub from: DateTime,
  pub to: DateTime,
  pub status: BookingStatus,
  pub price: f64,
  pub commission: f64,
  pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgencyLedger {
  pub year: i32,
  pub month: u32,
  pub agency: AgencyInfo,
  pub summary: LedgerSummary,
  pub log: Vec<LogEntry>,
  pub bookings: Vec<BookingAllocation>,
}

pub struct Ledger<'a> {
  db: &'a DatabaseConnection,
  rules: Rules,
}

impl<'a> Ledger<'a> {
  pub fn new(db: &'a DatabaseConnection, rules: Rules) -> Self {
    Self { db, rules }
  }

  pub async fn build(
    &self,
    agency_id: i64,
    period: MonthPeriod,
  ) -> Result<AgencyLedger> {
    let agency = sv::User::new(self.db).agency(agency_id).await?;
    let state = commission_state::Entity::find_by_id(agency_id)
      .one(self.db)
      .await?;
    let events = sv::Events::new(self.db).for_period(agency_id, &period).await?;

    let active = period.clamp(self.rules.effective_from);
    let bookings = match active {
      Some(active) => {
        sv::Booking::new(self.db).for_agency_in(agency_id, &active).await?
      }
      None => Vec::new(),
    };

    let admins = self.admin_names(&events).await?;

    Ok(assemble(
      agency,
      state.as_ref(),
      events,
      bookings,
      &admins,
      period,
      active.is_some(),
      self.rules,
    ))
  }

  async fn admin_names(
    &self,
    events: &[commission_event::Model],
  ) -> Result<HashMap<i64, String>> {
    let mut ids: Vec<i64> =
      events.iter().filter_map(|event| event.admin_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let users = sv::User::new(self.db).by_ids(&ids).await?;
    Ok(users.into_iter().map(|(id, user)| (id, user.full_name)).collect())
  }
}

/// Pure part of the ledger: `bookings` must be sorted by start date and
/// `events` newest first. Outside the commission window the log is kept but
/// payments are not counted.
#[allow(clippy::too_many_arguments)]
fn assemble(
  agency: user::Model,
  state: Option<&commission_state::Model>,
  events: Vec<commission_event::Model>,
  bookings: Vec<booking::Model>,
  admins: &HashMap<i64, String>,
  period: MonthPeriod,
  in_window: bool,
  rules: Rules,
) -> AgencyLedger {
  let (mut reservations, mut gross, mut due) = (0u64, 0.0, 0.0);
  for booking in bookings.iter().filter(|b| b.status.is_eligible()) {
    reservations += 1;
    gross += booking.price;
    due += booking.commission_total;
  }

  let collected =
    if in_window { EventSummary::fold(&events).collected } else { 0.0 };
  let figures =
    Figures::new(reservations, gross, due, collected, rules.monthly_threshold);

  let blocked = state.is_some_and(|s| s.blocked) || agency.blacklisted;
  let status = AgencyStatus::derive(blocked, figures.balance);

  let owed: Vec<f64> = bookings.iter().map(owed_by).collect();
  let statuses = allocate(&owed, collected);

  let bookings = bookings
    .into_iter()
    .zip(owed)
    .zip(statuses)
    .map(|((booking, commission), payment_status)| BookingAllocation {
      booking_id: booking.id,
      car_id: booking.car_id,
      from: booking.from_date,
      to: booking.to_date,
      status: booking.status,
      price: booking.price,
      commission,
      payment_status,
    })
    .collect();

  let log = events
    .into_iter()
    .map(|event| LogEntry {
      admin: event.admin_id.map(|id| AdminRef {
        id,
        name: admins.get(&id).cloned(),
      }),
      id: event.id,
      event_type: event.event_type,
      created_at: event.created_at,
      amount: event.amount,
      payment_date: event.payment_date,
      reference: event.reference,
      channel: event.channel,
      success: event.success,
      message: event.message,
      metadata: event.metadata,
    })
    .collect();

  AgencyLedger {
    year: period.year,
    month: period.month,
    agency: AgencyInfo {
      id: agency.id,
      name: agency.full_name,
      city: agency.city,
      email: agency.email,
      phone: agency.phone,
      slug: agency.slug,
      status,
      blocked,
    },
    summary: LedgerSummary { figures, threshold: rules.monthly_threshold },
    log,
    bookings,
  }
}
