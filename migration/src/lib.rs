pub use sea_orm_migration::prelude::*;

mod m20260201_000001_create_users;
mod m20260201_000002_create_cars;
mod m20260201_000003_create_bookings;
mod m20260215_000004_create_commission_events;
mod m20260215_000005_create_commission_state;
mod m20260215_000006_create_commission_settings;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260201_000001_create_users::Migration),
      Box::new(m20260201_000002_create_cars::Migration),
      Box::new(m20260201_000003_create_bookings::Migration),
      Box::new(m20260215_000004_create_commission_events::Migration),
      Box::new(m20260215_000005_create_commission_state::Migration),
      Box::new(m20260215_000006_create_commission_settings::Migration),
    ]
  }
}
