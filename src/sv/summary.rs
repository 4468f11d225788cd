//! Fleet-wide monthly commission summary.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
  entity::{commission_state, user},
  prelude::*,
  sv::{
    self,
    event::{EventSummary, LastReminder},
    period::{AgencyStatus, Figures, MonthPeriod, Rules, round_cents},
  },
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryFilter {
  pub search: Option<String>,
  pub status: Option<AgencyStatus>,
  #[serde(default)]
  pub above_threshold_only: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgencyRow {
  pub agency_id: i64,
  pub name: String,
  pub city: Option<String>,
  pub slug: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  #[serde(flatten)]
  pub figures: Figures,
  pub blocked: bool,
  pub status: AgencyStatus,
  pub last_payment_date: Option<DateTime>,
  pub last_reminder: Option<LastReminder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
  pub agencies: usize,
  pub gross_turnover: f64,
  pub commission_due: f64,
  pub commission_collected: f64,
  pub above_threshold: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
  pub year: i32,
  pub month: u32,
  pub threshold: f64,
  pub totals: Totals,
  pub rows: Vec<AgencyRow>,
  pub total: usize,
  pub page: u64,
  pub size: u64,
}

#[derive(Debug, Default)]
struct Grouped {
  reservations: u64,
  gross: f64,
  due: f64,
}

pub struct Summary<'a> {
  db: &'a DatabaseConnection,
  rules: Rules,
}

impl<'a> Summary<'a> {
  pub fn new(db: &'a DatabaseConnection, rules: Rules) -> Self {
    Self { db, rules }
  }

  pub async fn monthly(
    &self,
    period: MonthPeriod,
    filter: &SummaryFilter,
    page: u64,
    size: u64,
  ) -> Result<MonthlySummary> {
    if page == 0 || size == 0 || size > MAX_PAGE_SIZE {
      return Err(Error::InvalidArgs(format!(
        "Page must be >= 1 and size between 1 and {MAX_PAGE_SIZE}"
      )));
    }

    let mut summary = MonthlySummary {
      year: period.year,
      month: period.month,
      threshold: self.rules.monthly_threshold,
      totals: Totals::default(),
      rows: Vec::new(),
      total: 0,
      page,
      size,
    };

    let Some(active) = period.clamp(self.rules.effective_from) else {
      debug!(
        "{}/{} precedes the commission effective date",
        period.month, period.year
      );
      return Ok(summary);
    };

    let rows = self.rows(&active).await?;
    summary.totals = totals(&rows);

    let mut rows = apply_filter(rows, filter);
    sort_rows(&mut rows);
    summary.total = rows.len();
    summary.rows = paginate(rows, page, size);

    Ok(summary)
  }

  async fn rows(&self, period: &MonthPeriod) -> Result<Vec<AgencyRow>> {
    let bookings = sv::Booking::new(self.db).eligible_in(period).await?;

    let mut grouped: BTreeMap<i64, Grouped> = BTreeMap::new();
    for booking in bookings {
      let entry = grouped.entry(booking.supplier_id).or_default();
      entry.reservations += 1;
      entry.gross += booking.price;
      entry.due += booking.commission_total;
    }

    let ids: Vec<i64> = grouped.keys().copied().collect();
    let agencies = sv::User::new(self.db).by_ids(&ids).await?;
    let states: HashMap<i64, commission_state::Model> =
      commission_state::Entity::find()
        .filter(commission_state::Column::AgencyId.is_in(ids.clone()))
        .all(self.db)
        .await?
        .into_iter()
        .map(|state| (state.agency_id, state))
        .collect();
    let events = sv::Events::new(self.db).for_agencies(&ids, period).await?;

    let mut rows = Vec::with_capacity(grouped.len());
    for (agency_id, group) in grouped {
      let Some(agency) = agencies.get(&agency_id) else {
        warn!("bookings reference missing agency {agency_id}");
        continue;
      };

      let log = events.get(&agency_id).map(Vec::as_slice).unwrap_or_default();
      rows.push(row(
        agency,
        states.get(&agency_id),
        EventSummary::fold(log),
        group,
        self.rules.monthly_threshold,
      ));
    }

    Ok(rows)
  }
}

fn row(
  agency: &user::Model,
  state: Option<&commission_state::Model>,
  events: EventSummary,
  group: Grouped,
  threshold: f64,
) -> AgencyRow {
  let figures = Figures::new(
    group.reservations,
    group.gross,
    group.due,
    events.collected,
    threshold,
  );
  let blocked = state.is_some_and(|s| s.blocked) || agency.blacklisted;

  AgencyRow {
    agency_id: agency.id,
    name: agency.full_name.clone(),
    city: agency.city.clone(),
    slug: agency.slug.clone(),
    email: agency.email.clone(),
    phone: agency.phone.clone(),
    figures,
    blocked,
    status: AgencyStatus::derive(blocked, figures.balance),
    last_payment_date: events.last_payment_date,
    last_reminder: events.last_reminder,
  }
}

fn totals(rows: &[AgencyRow]) -> Totals {
  let mut totals = rows.iter().fold(Totals::default(), |mut acc, row| {
    acc.agencies += 1;
    acc.gross_turnover += row.figures.gross_turnover;
    acc.commission_due += row.figures.commission_due;
    acc.commission_collected += row.figures.commission_collected;
    acc.above_threshold += row.figures.above_threshold as usize;
    acc
  });
  totals.gross_turnover = round_cents(totals.gross_turnover);
  totals.commission_due = round_cents(totals.commission_due);
  totals.commission_collected = round_cents(totals.commission_collected);
  totals
}

pub fn apply_filter(
  rows: Vec<AgencyRow>,
  filter: &SummaryFilter,
) -> Vec<AgencyRow> {
  let needle = filter
    .search
    .as_deref()
    .map(|s| s.trim().to_lowercase())
    .filter(|s| !s.is_empty());

  rows
    .into_iter()
    .filter(|row| {
      needle.as_deref().is_none_or(|needle| matches_search(row, needle))
    })
    .filter(|row| filter.status.is_none_or(|status| row.status == status))
    .filter(|row| !filter.above_threshold_only || row.figures.above_threshold)
    .collect()
}

fn matches_search(row: &AgencyRow, needle: &str) -> bool {
  let contains = |field: &str| field.to_lowercase().contains(needle);

  contains(&row.name)
    || contains(&row.agency_id.to_string())
    || row.city.as_deref().is_some_and(contains)
    || row.slug.as_deref().is_some_and(contains)
}

/// Commission due descending, then agency name.
pub fn sort_rows(rows: &mut [AgencyRow]) {
  rows.sort_by(|a, b| {
    b.figures
      .commission_due
      .partial_cmp(&a.figures.commission_due)
      .unwrap_or(Ordering::Equal)
      .then_with(|| compare_names(&a.name, &b.name))
  });
}

fn compare_names(a: &str, b: &str) -> Ordering {
  a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Pages past the end, including offsets that do not fit in `usize`, are
/// empty.
fn paginate(rows: Vec<AgencyRow>, page: u64, size: u64) -> Vec<AgencyRow> {
  let size = usize::try_from(size).unwrap_or(usize::MAX);
  let skip = page
    .checked_sub(1)
    .and_then(|page| usize::try_from(page).ok())
    .and_then(|page| page.checked_mul(size));

  match skip {
    Some(skip) => rows.into_iter().skip(skip).take(size).collect(),
    None => Vec::new(),
  }
}
