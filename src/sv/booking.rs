use crate::{
  entity::{BookingStatus, booking},
  prelude::*,
  sv::period::MonthPeriod,
};

pub struct Booking<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Booking<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Eligible bookings of every agency that overlap the period.
  pub async fn eligible_in(
    &self,
    period: &MonthPeriod,
  ) -> Result<Vec<booking::Model>> {
    Ok(
      booking::Entity::find()
        .filter(booking::Column::Status.is_in(BookingStatus::ELIGIBLE))
        .filter(booking::Column::FromDate.lt(period.end))
        .filter(booking::Column::ToDate.gt(period.start))
        .all(self.db)
        .await?,
    )
  }

  /// All bookings of one agency that overlap the period, oldest start first.
  pub async fn for_agency_in(
    &self,
    agency_id: i64,
    period: &MonthPeriod,
  ) -> Result<Vec<booking::Model>> {
    Ok(
      booking::Entity::find()
        .filter(booking::Column::SupplierId.eq(agency_id))
        .filter(booking::Column::FromDate.lt(period.end))
        .filter(booking::Column::ToDate.gt(period.start))
        .order_by_asc(booking::Column::FromDate)
        .order_by_asc(booking::Column::Id)
        .all(self.db)
        .await?,
    )
  }
}
