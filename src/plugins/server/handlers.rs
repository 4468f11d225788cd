use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::auth::Actor;
use crate::{
  entity::{car, commission_event, commission_settings, commission_state},
  prelude::*,
  state::AppState,
  sv::{
    blocking::Transition,
    event::PaymentInput,
    ledger::AgencyLedger,
    period::{AgencyStatus, require_period},
    reminder::ReminderRequest,
    settings::{PaymentOptions, SettingsUpdate},
    summary::{DEFAULT_PAGE_SIZE, MonthlySummary, SummaryFilter},
  },
};

type App = State<Arc<AppState>>;

pub async fn health() -> &'static str {
  "OK"
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
  pub year: Option<i32>,
  pub month: Option<u32>,
  pub search: Option<String>,
  pub status: Option<AgencyStatus>,
  pub above_threshold: Option<bool>,
  pub page: Option<u64>,
  pub size: Option<u64>,
}

pub async fn summary(
  State(app): App,
  actor: Actor,
  Query(query): Query<SummaryQuery>,
) -> Result<Json<MonthlySummary>> {
  actor.require_admin()?;
  let period = require_period(query.year, query.month)?;

  let filter = SummaryFilter {
    search: query.search,
    status: query.status,
    above_threshold_only: query.above_threshold.unwrap_or(false),
  };
  let summary = app
    .sv()
    .summary
    .monthly(
      period,
      &filter,
      query.page.unwrap_or(1),
      query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?;

  Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
  pub year: Option<i32>,
  pub month: Option<u32>,
}

pub async fn agency_ledger(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
  Query(query): Query<PeriodQuery>,
) -> Result<Json<AgencyLedger>> {
  actor.require_agency_access(agency_id)?;
  let period = require_period(query.year, query.month)?;

  Ok(Json(app.sv().ledger.build(agency_id, period).await?))
}

#[derive(Debug, Serialize)]
pub struct AgencyState {
  pub state: Option<commission_state::Model>,
  pub cars: Vec<car::Model>,
}

pub async fn agency_state(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
) -> Result<Json<AgencyState>> {
  actor.require_agency_access(agency_id)?;

  let sv = app.sv();
  sv.user.agency(agency_id).await?;
  Ok(Json(AgencyState {
    state: sv.blocking.state(agency_id).await?,
    cars: sv.car.by_agency(agency_id).await?,
  }))
}

pub async fn record_payment(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
  Json(input): Json<PaymentInput>,
) -> Result<(StatusCode, Json<commission_event::Model>)> {
  actor.require_admin()?;

  let event = app.sv().events.record_payment(actor.id, agency_id, input).await?;
  Ok((StatusCode::CREATED, Json(event)))
}

#[derive(Debug, Deserialize)]
pub struct NoteInput {
  pub year: Option<i32>,
  pub month: Option<u32>,
  pub note: Option<String>,
}

pub async fn add_note(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
  Json(input): Json<NoteInput>,
) -> Result<(StatusCode, Json<commission_event::Model>)> {
  actor.require_admin()?;
  let period = require_period(input.year, input.month)?;

  let note = input.note.unwrap_or_default();
  let event =
    app.sv().events.add_note(actor.id, agency_id, period, &note).await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// A failed delivery is still stored, but the caller gets an error.
pub async fn send_reminder(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
  Json(req): Json<ReminderRequest>,
) -> Result<(StatusCode, Json<commission_event::Model>)> {
  actor.require_admin()?;

  let event = app.sv().reminder.send(actor.id, agency_id, req).await?;
  if !event.success {
    return Err(Error::Dispatch(delivery_errors(&event)));
  }
  Ok((StatusCode::CREATED, Json(event)))
}

fn delivery_errors(event: &commission_event::Model) -> String {
  let errors: Vec<&str> = event
    .metadata
    .as_ref()
    .and_then(|meta| meta["errors"].as_array())
    .map(|errors| errors.iter().filter_map(|e| e.as_str()).collect())
    .unwrap_or_default();

  if errors.is_empty() {
    format!("reminder #{} failed", event.id)
  } else {
    errors.join("; ")
  }
}

#[derive(Debug, Deserialize)]
pub struct BlockInput {
  pub year: Option<i32>,
  pub month: Option<u32>,
  pub reason: Option<String>,
}

pub async fn block(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
  Json(input): Json<BlockInput>,
) -> Result<Json<Transition>> {
  actor.require_admin()?;
  let period = require_period(input.year, input.month)?;

  let transition =
    app.sv().blocking.block(agency_id, actor.id, period, input.reason).await?;
  Ok(Json(transition))
}

pub async fn unblock(
  State(app): App,
  actor: Actor,
  Path(agency_id): Path<i64>,
  Json(input): Json<BlockInput>,
) -> Result<Json<Transition>> {
  actor.require_admin()?;
  let period = require_period(input.year, input.month)?;

  let transition =
    app.sv().blocking.unblock(agency_id, actor.id, period, input.reason).await?;
  Ok(Json(transition))
}

pub async fn get_settings(
  State(app): App,
  actor: Actor,
) -> Result<Json<commission_settings::Model>> {
  actor.require_admin()?;
  Ok(Json(app.sv().settings.get_or_create().await?))
}

pub async fn update_settings(
  State(app): App,
  actor: Actor,
  Json(update): Json<SettingsUpdate>,
) -> Result<Json<commission_settings::Model>> {
  actor.require_admin()?;
  Ok(Json(app.sv().settings.update(actor.id, update).await?))
}

pub async fn payment_options(
  State(app): App,
  _actor: Actor,
) -> Result<Json<PaymentOptions>> {
  Ok(Json(app.sv().settings.payment_options().await?))
}
