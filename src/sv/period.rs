//! Calendar periods and the figures derived for one agency in one month.

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Global commission parameters.
#[derive(Debug, Clone, Copy)]
pub struct Rules {
  pub effective_from: DateTime,
  pub monthly_threshold: f64,
}

/// Half-open calendar month `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthPeriod {
  pub year: i32,
  pub month: u32,
  pub start: DateTime,
  pub end: DateTime,
}

impl MonthPeriod {
  pub fn new(year: i32, month: u32) -> Result<Self> {
    if !(1..=12).contains(&month) {
      return Err(Error::InvalidArgs("Month must be between 1 and 12".into()));
    }
    if !(2000..=2100).contains(&year) {
      return Err(Error::InvalidArgs("Year is out of range".into()));
    }

    let (next_year, next_month) =
      if month == 12 { (year + 1, 1) } else { (year, month + 1) };

    let start = month_start(year, month)?;
    let end = month_start(next_year, next_month)?;

    Ok(Self { year, month, start, end })
  }

  /// Period with `start` moved forward to the effective date, or `None` when
  /// commission did not apply yet in this month.
  pub fn clamp(self, effective_from: DateTime) -> Option<Self> {
    let start = self.start.max(effective_from);
    (start < self.end).then_some(Self { start, ..self })
  }

  /// Event rows store month and year as plain integers.
  pub fn key(&self) -> (i32, i32) {
    (self.month as i32, self.year)
  }
}

fn month_start(year: i32, month: u32) -> Result<DateTime> {
  NaiveDate::from_ymd_opt(year, month, 1)
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .ok_or_else(|| Error::InvalidArgs(format!("Invalid period {month}/{year}")))
}

/// Checks the raw query parameters before any storage access.
pub fn require_period(year: Option<i32>, month: Option<u32>) -> Result<MonthPeriod> {
  let year = year.ok_or_else(|| Error::InvalidArgs("Year is required".into()))?;
  let month =
    month.ok_or_else(|| Error::InvalidArgs("Month is required".into()))?;
  MonthPeriod::new(year, month)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgencyStatus {
  Active,
  NeedsFollowUp,
  Blocked,
}

impl AgencyStatus {
  /// Blocked always wins over an outstanding balance.
  pub fn derive(blocked: bool, balance: f64) -> Self {
    if blocked {
      AgencyStatus::Blocked
    } else if balance > 0.0 {
      AgencyStatus::NeedsFollowUp
    } else {
      AgencyStatus::Active
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Figures {
  pub reservations: u64,
  pub gross_turnover: f64,
  pub commission_due: f64,
  pub commission_collected: f64,
  pub balance: f64,
  pub above_threshold: bool,
}

impl Figures {
  pub fn new(
    reservations: u64,
    gross_turnover: f64,
    commission_due: f64,
    commission_collected: f64,
    threshold: f64,
  ) -> Self {
    Self {
      reservations,
      gross_turnover: round_cents(gross_turnover),
      commission_due: round_cents(commission_due),
      commission_collected: round_cents(commission_collected),
      balance: (commission_due - commission_collected).round(),
      above_threshold: commission_due >= threshold,
    }
  }
}

pub fn round_cents(amount: f64) -> f64 {
  (amount * 100.0).round() / 100.0
}

pub fn to_cents(amount: f64) -> i64 {
  (amount * 100.0).round() as i64
}
