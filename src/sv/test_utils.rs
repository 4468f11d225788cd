//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema};

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    // Users first: cars, bookings and events reference them
    let stmt = schema.create_table_from_entity(user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(car::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(booking::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(commission_event::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(commission_state::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(commission_settings::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }
}

#[cfg(test)]
pub mod fixtures {
  use crate::{
    entity::{BookingStatus, EventType, UserRole, booking, car, user},
    prelude::*,
    sv::{
      Events,
      event::NewEvent,
      period::{MonthPeriod, Rules},
    },
  };

  fn at(year: i32, month: u32, day: u32) -> DateTime {
    NaiveDate::from_ymd_opt(year, month, day)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap()
  }

  pub fn rules() -> Rules {
    Rules { effective_from: at(2025, 1, 1), monthly_threshold: 50.0 }
  }

  async fn insert_user(
    db: &DatabaseConnection,
    id: i64,
    name: &str,
    role: UserRole,
  ) -> user::Model {
    user::ActiveModel {
      id: Set(id),
      full_name: Set(name.into()),
      email: Set(Some(format!("user{id}@example.com"))),
      phone: Set(Some("22 123 456".into())),
      language: Set("fr".into()),
      slug: Set(Some(name.to_lowercase().replace(' ', "-"))),
      city: Set(Some("Tunis".into())),
      role: Set(role),
      blacklisted: Set(false),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn agency(db: &DatabaseConnection, id: i64, name: &str) -> user::Model {
    insert_user(db, id, name, UserRole::Supplier).await
  }

  pub async fn admin(db: &DatabaseConnection, id: i64, name: &str) -> user::Model {
    insert_user(db, id, name, UserRole::Admin).await
  }

  pub async fn car(
    db: &DatabaseConnection,
    id: i64,
    agency: i64,
    available: bool,
  ) -> car::Model {
    car::ActiveModel {
      id: Set(id),
      supplier_id: Set(agency),
      name: Set(format!("Car #{id}")),
      available: Set(available),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  /// Booking in 2025 between two `(month, day)` dates at midnight.
  pub async fn booking(
    db: &DatabaseConnection,
    id: i64,
    agency: i64,
    status: BookingStatus,
    from: (u32, u32),
    to: (u32, u32),
    commission: f64,
  ) -> booking::Model {
    let (from, to) = (at(2025, from.0, from.1), at(2025, to.0, to.1));
    booking_at(db, id, agency, status, from, to, commission).await
  }

  /// Booking from the 5th to the 7th of the given month.
  pub async fn booking_in(
    db: &DatabaseConnection,
    id: i64,
    agency: i64,
    status: BookingStatus,
    year: i32,
    month: u32,
    commission: f64,
  ) -> booking::Model {
    let (from, to) = (at(year, month, 5), at(year, month, 7));
    booking_at(db, id, agency, status, from, to, commission).await
  }

  async fn booking_at(
    db: &DatabaseConnection,
    id: i64,
    agency: i64,
    status: BookingStatus,
    from: DateTime,
    to: DateTime,
    commission: f64,
  ) -> booking::Model {
    booking::ActiveModel {
      id: Set(id),
      supplier_id: Set(agency),
      car_id: Set(None),
      price: Set(commission * 10.0),
      commission_total: Set(commission),
      status: Set(status),
      from_date: Set(from),
      to_date: Set(to),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn payment(
    db: &DatabaseConnection,
    agency: i64,
    month: u32,
    year: i32,
    amount: f64,
    admin: Option<i64>,
  ) {
    let period = MonthPeriod::new(year, month).unwrap();
    let mut event = NewEvent::new(agency, period, EventType::Payment, admin);
    event.amount = amount;
    event.payment_date = Some(at(year, month, 15));
    Events::new(db).append(event).await.unwrap();
  }
}

#[cfg(test)]
pub mod gateways {
  use std::sync::Mutex;

  use async_trait::async_trait;

  use crate::{
    prelude::*,
    sv::notify::{MailSender, PhoneCheck, SmsSender, normalize_phone},
  };

  /// Remembers every message it was asked to deliver.
  #[derive(Default)]
  pub struct RecordingMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<(String, String, String)>>,
  }

  impl RecordingMailer {
    pub fn failing() -> Self {
      Self { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
      self.sent.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl MailSender for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
      if self.fail {
        return Err(Error::Mail("mail gateway unavailable".into()));
      }
      self.sent.lock().unwrap().push((to.into(), subject.into(), html.into()));
      Ok(())
    }
  }

  #[derive(Default)]
  pub struct RecordingSms {
    pub fail: bool,
    pub sent: Mutex<Vec<(String, String)>>,
  }

  impl RecordingSms {
    pub fn failing() -> Self {
      Self { fail: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
      self.sent.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl SmsSender for RecordingSms {
    fn validate_and_format_phone(&self, raw: &str) -> PhoneCheck {
      normalize_phone(raw, "+216")
    }

    async fn send(&self, phone: &str, text: &str) -> Result<()> {
      if self.fail {
        return Err(Error::Sms("sms gateway unavailable".into()));
      }
      self.sent.lock().unwrap().push((phone.into(), text.into()));
      Ok(())
    }
  }
}
