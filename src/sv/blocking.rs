//! Suspends and restores an agency's cars. The car batch update, the state
//! row, the agency flag and the event are written in one transaction.

use serde::Serialize;

use crate::{
  entity::{EventType, commission_event, commission_state},
  prelude::*,
  sv::{
    self,
    event::{Events, NewEvent},
    period::MonthPeriod,
  },
};

#[derive(Debug, Clone, Serialize)]
pub struct Transition {
  pub state: commission_state::Model,
  pub event: commission_event::Model,
  /// Cars whose availability this call changed.
  pub cars: Vec<i64>,
}

pub struct Blocking<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Blocking<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn state(
    &self,
    agency_id: i64,
  ) -> Result<Option<commission_state::Model>> {
    Ok(commission_state::Entity::find_by_id(agency_id).one(self.db).await?)
  }

  /// Takes the agency's available cars off sale. Blocking an already blocked
  /// agency keeps the original snapshot and only adds cars that became
  /// available since.
  pub async fn block(
    &self,
    agency_id: i64,
    admin_id: i64,
    period: MonthPeriod,
    reason: Option<String>,
  ) -> Result<Transition> {
    let txn = self.db.begin().await?;

    let agency = sv::User::agency_on(&txn, agency_id).await?;
    let state = get_or_create(&txn, agency_id).await?;
    let available = sv::Car::available_ids(&txn, agency_id).await?;

    let mut snapshot =
      if state.blocked { state.disabled_car_ids() } else { Vec::new() };
    let newly: Vec<i64> =
      available.iter().copied().filter(|id| !snapshot.contains(id)).collect();
    snapshot.extend(&newly);

    sv::Car::set_available(&txn, agency_id, &available, false).await?;

    let now = Utc::now().naive_utc();
    let (blocked_at, blocked_by) = if state.blocked {
      (state.blocked_at.or(Some(now)), state.blocked_by.or(Some(admin_id)))
    } else {
      (Some(now), Some(admin_id))
    };
    let state = commission_state::ActiveModel {
      blocked: Set(true),
      blocked_at: Set(blocked_at),
      blocked_by: Set(blocked_by),
      disabled_cars: Set(json::json!(snapshot)),
      updated_at: Set(now),
      ..state.into()
    }
    .update(&txn)
    .await?;

    sv::User::set_blacklisted(&txn, agency, true).await?;

    let mut event =
      NewEvent::new(agency_id, period, EventType::Block, Some(admin_id));
    event.message = reason;
    event.metadata = Some(json::json!({ "disabled_cars": newly }));
    let event = Events::append_on(&txn, event).await?;

    txn.commit().await?;

    info!(
      "agency {} blocked by {}: {} car(s) disabled",
      agency_id,
      admin_id,
      newly.len()
    );
    Ok(Transition { state, event, cars: newly })
  }

  /// Puts back on sale exactly the cars recorded by the block.
  pub async fn unblock(
    &self,
    agency_id: i64,
    admin_id: i64,
    period: MonthPeriod,
    reason: Option<String>,
  ) -> Result<Transition> {
    let txn = self.db.begin().await?;

    let agency = sv::User::agency_on(&txn, agency_id).await?;
    let state = get_or_create(&txn, agency_id).await?;
    let reactivated = state.disabled_car_ids();

    sv::Car::set_available(&txn, agency_id, &reactivated, true).await?;

    let state = commission_state::ActiveModel {
      blocked: Set(false),
      blocked_at: Set(None),
      blocked_by: Set(None),
      disabled_cars: Set(json::json!([])),
      updated_at: Set(Utc::now().naive_utc()),
      ..state.into()
    }
    .update(&txn)
    .await?;

    sv::User::set_blacklisted(&txn, agency, false).await?;

    let mut event =
      NewEvent::new(agency_id, period, EventType::Unblock, Some(admin_id));
    event.message = reason;
    event.metadata = Some(json::json!({ "reactivated_cars": reactivated }));
    let event = Events::append_on(&txn, event).await?;

    txn.commit().await?;

    info!(
      "agency {} unblocked by {}: {} car(s) reactivated",
      agency_id,
      admin_id,
      reactivated.len()
    );
    Ok(Transition { state, event, cars: reactivated })
  }
}

async fn get_or_create<C: ConnectionTrait>(
  conn: &C,
  agency_id: i64,
) -> Result<commission_state::Model> {
  if let Some(state) =
    commission_state::Entity::find_by_id(agency_id).one(conn).await?
  {
    return Ok(state);
  }

  let state = commission_state::ActiveModel {
    agency_id: Set(agency_id),
    blocked: Set(false),
    blocked_at: Set(None),
    blocked_by: Set(None),
    disabled_cars: Set(json::json!([])),
    updated_at: Set(Utc::now().naive_utc()),
  };

  Ok(state.insert(conn).await?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::user,
    sv::test_utils::{fixtures, test_db},
  };

  fn june() -> MonthPeriod {
    MonthPeriod::new(2025, 6).unwrap()
  }

  #[tokio::test]
  async fn test_block_unblock_round_trip() {
    let db = test_db::setup().await;
    fixtures::agency(&db, 10, "Agence Sud").await;
    fixtures::car(&db, 1, 10, true).await;
    fixtures::car(&db, 2, 10, false).await;
    fixtures::car(&db, 3, 10, true).await;

    let blocking = Blocking::new(&db);

    let blocked = blocking.block(10, 1, june(), Some("unpaid".into())).await.unwrap();
    assert!(blocked.state.blocked);
    assert_eq!(blocked.state.blocked_by, Some(1));
    assert_eq!(blocked.state.disabled_car_ids(), vec![1, 3]);
    assert_eq!(blocked.event.event_type, EventType::Block);
    assert_eq!(
      blocked.event.metadata,
      Some(json::json!({ "disabled_cars": [1, 3] }))
    );
    assert!(sv::Car::available_ids(&db, 10).await.unwrap().is_empty());

    let agency = sv::User::new(&db).agency(10).await.unwrap();
    assert!(agency.blacklisted);

    let unblocked = blocking.unblock(10, 1, june(), None).await.unwrap();
    assert!(!unblocked.state.blocked);
    assert!(unblocked.state.disabled_car_ids().is_empty());
    assert!(unblocked.state.blocked_at.is_none());
    assert_eq!(unblocked.cars, vec![1, 3]);

    // car 2 was already off sale before the block and stays that way
    assert_eq!(sv::Car::available_ids(&db, 10).await.unwrap(), vec![1, 3]);

    let agency = sv::User::new(&db).agency(10).await.unwrap();
    assert!(!agency.blacklisted);
  }

  #[tokio::test]
  async fn test_reblock_keeps_snapshot() {
    let db = test_db::setup().await;
    fixtures::agency(&db, 10, "Agence Sud").await;
    fixtures::car(&db, 1, 10, true).await;

    let blocking = Blocking::new(&db);
    let first = blocking.block(10, 1, june(), None).await.unwrap();

    // a car added to the fleet while the agency is suspended
    fixtures::car(&db, 2, 10, true).await;

    let second = blocking.block(10, 7, june(), None).await.unwrap();
    assert_eq!(second.cars, vec![2]);
    assert_eq!(second.state.disabled_car_ids(), vec![1, 2]);
    assert_eq!(second.state.blocked_at, first.state.blocked_at);
    assert_eq!(second.state.blocked_by, Some(1));

    blocking.unblock(10, 1, june(), None).await.unwrap();
    assert_eq!(sv::Car::available_ids(&db, 10).await.unwrap(), vec![1, 2]);
  }

  #[tokio::test]
  async fn test_unblock_without_state_creates_it() {
    let db = test_db::setup().await;
    fixtures::agency(&db, 10, "Agence Sud").await;
    fixtures::car(&db, 1, 10, false).await;

    let blocking = Blocking::new(&db);
    assert!(blocking.state(10).await.unwrap().is_none());

    let result = blocking.unblock(10, 1, june(), None).await.unwrap();
    assert!(result.cars.is_empty());
    assert!(!result.state.blocked);
    assert!(blocking.state(10).await.unwrap().is_some());
    assert!(sv::Car::available_ids(&db, 10).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_block_unknown_agency_writes_nothing() {
    let db = test_db::setup().await;

    let result = Blocking::new(&db).block(404, 1, june(), None).await;
    assert!(matches!(result, Err(Error::AgencyNotFound)));

    let states = commission_state::Entity::find().all(&db).await.unwrap();
    assert!(states.is_empty());
    let users = user::Entity::find().all(&db).await.unwrap();
    assert!(users.is_empty());
  }

  #[tokio::test]
  async fn test_block_failure_rolls_back_every_write() {
    let db = test_db::setup().await;
    fixtures::agency(&db, 10, "Agence Sud").await;
    fixtures::car(&db, 1, 10, true).await;
    fixtures::car(&db, 2, 10, true).await;

    // the event append is the last write of the cascade
    db.execute_unprepared("DROP TABLE commission_events").await.unwrap();

    let result = Blocking::new(&db).block(10, 1, june(), None).await;
    assert!(matches!(result, Err(Error::Db(_))));

    assert_eq!(sv::Car::available_ids(&db, 10).await.unwrap(), vec![1, 2]);
    assert!(commission_state::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(!sv::User::new(&db).agency(10).await.unwrap().blacklisted);
  }
}
