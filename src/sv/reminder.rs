//! Sends a commission reminder to an agency and records the attempt.

use serde::Deserialize;

use crate::{
  entity::{EventType, ReminderChannel, commission_event, user},
  prelude::*,
  sv::{
    self,
    event::NewEvent,
    ledger::AgencyLedger,
    notify::{MailSender, SmsSender, html_to_text},
    period::{MonthPeriod, Rules, require_period},
  },
  utils::{escape_html, format_amount, render_template},
};

pub const DEFAULT_SUBJECT: &str = "Commission reminder {month}/{year}";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderRequest {
  pub month: Option<u32>,
  pub year: Option<i32>,
  pub subject: Option<String>,
  pub message: Option<String>,
  pub channel: Option<ReminderChannel>,
}

struct Outgoing {
  subject: String,
  html: String,
  sms: String,
}

pub struct Reminder<'a> {
  db: &'a DatabaseConnection,
  rules: Rules,
  mailer: &'a dyn MailSender,
  sms: &'a dyn SmsSender,
}

impl<'a> Reminder<'a> {
  pub fn new(
    db: &'a DatabaseConnection,
    rules: Rules,
    mailer: &'a dyn MailSender,
    sms: &'a dyn SmsSender,
  ) -> Self {
    Self { db, rules, mailer, sms }
  }

  /// Delivery failures do not abort the call: the attempt is stored with
  /// `success = false` and returned like any other reminder.
  pub async fn send(
    &self,
    admin_id: i64,
    agency_id: i64,
    req: ReminderRequest,
  ) -> Result<commission_event::Model> {
    let period = require_period(req.year, req.month)?;
    let agency = sv::User::new(self.db).agency(agency_id).await?;
    let settings = sv::Settings::new(self.db).get_or_create().await?;
    let channel = req.channel.unwrap_or(settings.reminder_channel);

    let ledger = sv::Ledger::new(self.db, self.rules)
      .build(agency_id, period)
      .await?;
    let values = placeholders(&ledger, period);
    let html_values: Vec<_> =
      values.iter().map(|(key, value)| (*key, escape_html(value))).collect();

    let subject = req
      .subject
      .filter(|s| !s.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
    let custom = req.message.filter(|s| !s.trim().is_empty());
    let outgoing = Outgoing {
      subject: render_template(&subject, &values),
      html: render_template(
        custom.as_deref().unwrap_or(&settings.email_template),
        &html_values,
      ),
      sms: render_template(
        custom.as_deref().unwrap_or(&settings.sms_template),
        &values,
      ),
    };

    let mut errors = Vec::new();
    if channel.uses_email()
      && let Err(err) = self.send_email(&agency, &outgoing).await
    {
      errors.push(err.to_string());
    }
    let mut phone = None;
    if channel.uses_sms() {
      match self.send_sms(&agency, &outgoing).await {
        Ok(normalized) => phone = Some(normalized),
        Err(err) => errors.push(err.to_string()),
      }
    }

    let success = errors.is_empty();
    if !success {
      warn!(
        "reminder to agency {} ({}/{}) failed: {}",
        agency_id,
        period.month,
        period.year,
        errors.join("; ")
      );
    }

    let mut event =
      NewEvent::new(agency_id, period, EventType::Reminder, Some(admin_id));
    event.channel = Some(channel);
    event.success = success;
    event.message = Some(outgoing.html);
    event.metadata = Some(json::json!({
      "subject": outgoing.subject,
      "email": channel.uses_email().then_some(agency.email.as_deref()).flatten(),
      "phone": phone,
      "errors": errors,
    }));

    let event = sv::Events::new(self.db).append(event).await?;
    if success {
      info!(
        "reminder sent to agency {} ({}/{}) via {:?}",
        agency_id, period.month, period.year, channel
      );
    }
    Ok(event)
  }

  async fn send_email(
    &self,
    agency: &user::Model,
    out: &Outgoing,
  ) -> Result<()> {
    let email = agency
      .email
      .as_deref()
      .map(str::trim)
      .filter(|email| !email.is_empty())
      .ok_or_else(|| Error::Mail("agency has no email address".into()))?;

    self.mailer.send(email, &out.subject, &out.html).await
  }

  async fn send_sms(
    &self,
    agency: &user::Model,
    out: &Outgoing,
  ) -> Result<String> {
    let raw = agency.phone.as_deref().unwrap_or_default();
    let check = self.sms.validate_and_format_phone(raw);
    if !check.valid {
      return Err(Error::Sms(format!("invalid phone number '{raw}'")));
    }

    self.sms.send(&check.normalized, &html_to_text(&out.sms)).await?;
    Ok(check.normalized)
  }
}

fn placeholders(
  ledger: &AgencyLedger,
  period: MonthPeriod,
) -> Vec<(&'static str, String)> {
  let figures = &ledger.summary.figures;
  vec![
    ("agency", ledger.agency.name.clone()),
    ("month", format!("{:02}", period.month)),
    ("year", period.year.to_string()),
    ("due", format_amount(figures.commission_due)),
    ("collected", format_amount(figures.commission_collected)),
    ("balance", format_amount(figures.balance)),
  ]
}
