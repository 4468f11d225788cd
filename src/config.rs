use std::{collections::HashSet, env};

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone)]
pub struct Gateway {
  pub url: Option<String>,
  pub api_key: Option<String>,
  pub sender: String,
}

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub admins: HashSet<i64>,
  /// Commission rules only apply to bookings from this instant on.
  pub effective_from: NaiveDateTime,
  pub monthly_threshold: f64,
  pub phone_prefix: String,
  pub mail: Gateway,
  pub sms: Gateway,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      database_url: "sqlite:commission.db?mode=rwc".into(),
      port: 3000,
      admins: HashSet::new(),
      effective_from: NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default(),
      monthly_threshold: 50.0,
      phone_prefix: "+216".into(),
      mail: Gateway {
        url: None,
        api_key: None,
        sender: "no-reply@localhost".into(),
      },
      sms: Gateway { url: None, api_key: None, sender: "RENTAL".into() },
    }
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Self::default();

    let admins = match env::var("ADMIN_IDS") {
      Ok(raw) => parse_admins(&raw)?,
      Err(_) => HashSet::new(),
    };

    let port = match env::var("PORT") {
      Ok(raw) => raw.parse().context("Invalid PORT")?,
      Err(_) => defaults.port,
    };

    let effective_from = match env::var("COMMISSION_EFFECTIVE_DATE") {
      Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .context("Invalid COMMISSION_EFFECTIVE_DATE, expected YYYY-MM-DD")?
        .and_hms_opt(0, 0, 0)
        .context("Invalid COMMISSION_EFFECTIVE_DATE")?,
      Err(_) => defaults.effective_from,
    };

    let monthly_threshold = match env::var("COMMISSION_MONTHLY_THRESHOLD") {
      Ok(raw) => {
        raw.trim().parse().context("Invalid COMMISSION_MONTHLY_THRESHOLD")?
      }
      Err(_) => defaults.monthly_threshold,
    };

    Ok(Self {
      database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
      port,
      admins,
      effective_from,
      monthly_threshold,
      phone_prefix: env::var("DEFAULT_PHONE_PREFIX")
        .unwrap_or(defaults.phone_prefix),
      mail: Gateway {
        url: env::var("MAIL_API_URL").ok(),
        api_key: env::var("MAIL_API_KEY").ok(),
        sender: env::var("MAIL_FROM").unwrap_or(defaults.mail.sender),
      },
      sms: Gateway {
        url: env::var("SMS_API_URL").ok(),
        api_key: env::var("SMS_API_KEY").ok(),
        sender: env::var("SMS_SENDER").unwrap_or(defaults.sms.sender),
      },
    })
  }
}

fn parse_admins(raw: &str) -> anyhow::Result<HashSet<i64>> {
  raw
    .split(',')
    .filter(|s| !s.trim().is_empty())
    .map(|id| {
      id.trim().parse().with_context(|| format!("Invalid admin id `{id}`"))
    })
    .collect()
}
