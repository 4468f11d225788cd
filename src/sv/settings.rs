//! Singleton commission settings: reminder defaults, message templates,
//! accepted payment methods and bank transfer details.

use serde::{Deserialize, Serialize};

use crate::{
  entity::{
    ReminderChannel, commission_settings, commission_settings::SINGLETON_ID,
  },
  prelude::*,
};

pub const DEFAULT_EMAIL_TEMPLATE: &str = "<p>Bonjour {agency},</p>\
<p>Your commission for {month}/{year} amounts to <b>{due}</b>. \
Collected so far: {collected}. Remaining balance: <b>{balance}</b>.</p>\
<p>Please settle the balance to keep your cars online.</p>";

pub const DEFAULT_SMS_TEMPLATE: &str = "{agency}: commission {month}/{year}, \
remaining balance {balance}. Please settle it to keep your cars online.";

const DEFAULT_BANK_TRANSFER: bool = false;
const DEFAULT_CARD_PAYMENT: bool = true;
const DEFAULT_D17_PAYMENT: bool = false;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RibDetails {
  pub account_holder: String,
  pub bank_name: String,
  #[serde(default)]
  pub bank_address: Option<String>,
  pub iban: String,
  pub bic: String,
  pub account_number: String,
}

impl RibDetails {
  /// Trims every field; IBAN and BIC become uppercase without whitespace.
  pub fn sanitize(self) -> Self {
    let compact = |s: &str| {
      s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase()
    };

    Self {
      account_holder: self.account_holder.trim().to_string(),
      bank_name: self.bank_name.trim().to_string(),
      bank_address: self
        .bank_address
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()),
      iban: compact(&self.iban),
      bic: compact(&self.bic),
      account_number: self.account_number.trim().to_string(),
    }
  }

  /// Expects sanitized input.
  pub fn validate(&self) -> Result<()> {
    let invalid = |msg: &str| Err(Error::InvalidBankDetails(msg.into()));

    if self.account_holder.is_empty() {
      return invalid("account holder is required");
    }
    if self.bank_name.is_empty() {
      return invalid("bank name is required");
    }
    if !iban_is_valid(&self.iban) {
      return invalid("IBAN checksum does not match");
    }
    if !bic_is_valid(&self.bic) {
      return invalid("BIC must be 8 or 11 characters (AAAABBCC[DDD])");
    }
    let account_len =
      self.account_number.chars().filter(|c| !c.is_whitespace()).count();
    if account_len < 6 {
      return invalid("account number must have at least 6 characters");
    }
    Ok(())
  }

  fn from_json(value: &json::Value) -> Option<Self> {
    json::from_value(value.clone()).ok()
  }
}

/// ISO 13616 mod-97 check.
pub fn iban_is_valid(iban: &str) -> bool {
  let bytes = iban.as_bytes();
  if !(15..=34).contains(&bytes.len())
    || !bytes[..2].iter().all(u8::is_ascii_uppercase)
    || !bytes[2..4].iter().all(u8::is_ascii_digit)
    || !bytes.iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
  {
    return false;
  }

  let rearranged = bytes[4..].iter().chain(&bytes[..4]);
  let remainder = rearranged.fold(0u32, |acc, &b| {
    if b.is_ascii_digit() {
      (acc * 10 + (b - b'0') as u32) % 97
    } else {
      (acc * 100 + (b - b'A' + 10) as u32) % 97
    }
  });
  remainder == 1
}

/// `AAAA BB CC [DDD]`: bank code, country, location, optional branch.
pub fn bic_is_valid(bic: &str) -> bool {
  let bytes = bic.as_bytes();
  (bytes.len() == 8 || bytes.len() == 11)
    && bytes[..6].iter().all(u8::is_ascii_uppercase)
    && bytes[6..]
      .iter()
      .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
  pub reminder_channel: Option<ReminderChannel>,
  pub email_template: Option<String>,
  pub sms_template: Option<String>,
  pub bank_transfer_enabled: Option<bool>,
  pub card_payment_enabled: Option<bool>,
  pub d17_payment_enabled: Option<bool>,
  pub bank_transfer_rib_details: Option<RibDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOptions {
  pub bank_transfer: bool,
  pub card: bool,
  pub d17: bool,
  pub rib: Option<RibDetails>,
}

/// A toggle keeps its previous value when omitted and falls back to the
/// default only when there is no previous value either.
fn toggle(update: Option<bool>, previous: Option<bool>, default: bool) -> bool {
  update.or(previous).unwrap_or(default)
}

fn template(update: Option<String>, previous: Option<&str>, default: &str) -> String {
  update
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .or_else(|| previous.map(str::to_string))
    .unwrap_or_else(|| default.to_string())
}

pub struct Settings<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Settings<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn get_or_create(&self) -> Result<commission_settings::Model> {
    if let Some(settings) =
      commission_settings::Entity::find_by_id(SINGLETON_ID).one(self.db).await?
    {
      return Ok(settings);
    }

    let settings = commission_settings::ActiveModel {
      id: Set(SINGLETON_ID),
      reminder_channel: Set(ReminderChannel::default()),
      email_template: Set(DEFAULT_EMAIL_TEMPLATE.to_string()),
      sms_template: Set(DEFAULT_SMS_TEMPLATE.to_string()),
      bank_transfer_enabled: Set(DEFAULT_BANK_TRANSFER),
      card_payment_enabled: Set(DEFAULT_CARD_PAYMENT),
      d17_payment_enabled: Set(DEFAULT_D17_PAYMENT),
      bank_transfer_rib_details: Set(None),
      updated_by: Set(None),
      updated_at: Set(Utc::now().naive_utc()),
    };

    info!("commission settings initialised with defaults");
    Ok(settings.insert(self.db).await?)
  }

  pub async fn update(
    &self,
    admin_id: i64,
    update: SettingsUpdate,
  ) -> Result<commission_settings::Model> {
    let previous =
      commission_settings::Entity::find_by_id(SINGLETON_ID).one(self.db).await?;
    let prev = previous.as_ref();

    let bank_transfer_enabled = toggle(
      update.bank_transfer_enabled,
      prev.map(|p| p.bank_transfer_enabled),
      DEFAULT_BANK_TRANSFER,
    );
    let card_payment_enabled = toggle(
      update.card_payment_enabled,
      prev.map(|p| p.card_payment_enabled),
      DEFAULT_CARD_PAYMENT,
    );
    let d17_payment_enabled = toggle(
      update.d17_payment_enabled,
      prev.map(|p| p.d17_payment_enabled),
      DEFAULT_D17_PAYMENT,
    );

    let rib = match update.bank_transfer_rib_details {
      Some(rib) => {
        let rib = rib.sanitize();
        rib.validate()?;
        Some(rib)
      }
      None => prev
        .and_then(|p| p.bank_transfer_rib_details.as_ref())
        .and_then(RibDetails::from_json),
    };

    if bank_transfer_enabled {
      rib
        .as_ref()
        .ok_or_else(|| {
          Error::InvalidBankDetails(
            "bank transfer requires bank account details".into(),
          )
        })?
        .validate()?;
    }

    let reminder_channel = update
      .reminder_channel
      .or(prev.map(|p| p.reminder_channel))
      .unwrap_or_default();
    let email_template = template(
      update.email_template,
      prev.map(|p| p.email_template.as_str()),
      DEFAULT_EMAIL_TEMPLATE,
    );
    let sms_template = template(
      update.sms_template,
      prev.map(|p| p.sms_template.as_str()),
      DEFAULT_SMS_TEMPLATE,
    );

    let rib_json = rib
      .map(json::to_value)
      .transpose()
      .map_err(|e| Error::Internal(format!("Failed to encode RIB: {e}")))?;

    let model = commission_settings::ActiveModel {
      id: Set(SINGLETON_ID),
      reminder_channel: Set(reminder_channel),
      email_template: Set(email_template),
      sms_template: Set(sms_template),
      bank_transfer_enabled: Set(bank_transfer_enabled),
      card_payment_enabled: Set(card_payment_enabled),
      d17_payment_enabled: Set(d17_payment_enabled),
      bank_transfer_rib_details: Set(rib_json),
      updated_by: Set(Some(admin_id)),
      updated_at: Set(Utc::now().naive_utc()),
    };

    let settings = match previous {
      Some(_) => model.update(self.db).await?,
      None => model.insert(self.db).await?,
    };

    info!("commission settings updated by {admin_id}");
    Ok(settings)
  }

  pub async fn payment_options(&self) -> Result<PaymentOptions> {
    let settings = self.get_or_create().await?;
    let rib = settings
      .bank_transfer_enabled
      .then(|| {
        settings
          .bank_transfer_rib_details
          .as_ref()
          .and_then(RibDetails::from_json)
      })
      .flatten();

    Ok(PaymentOptions {
      bank_transfer: settings.bank_transfer_enabled,
      card: settings.card_payment_enabled,
      d17: settings.d17_payment_enabled,
      rib,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  fn rib() -> RibDetails {
    RibDetails {
      account_holder: "  Rental SARL ".into(),
      bank_name: "Deutsche Bank".into(),
      bank_address: Some("   ".into()),
      iban: "de89 3704 0044 0532 0130 00".into(),
      bic: "deut de ff".into(),
      account_number: "0532013000".into(),
    }
  }

  #[test]
  fn test_iban_checksum() {
    assert!(iban_is_valid("GB82WEST12345698765432"));
    assert!(iban_is_valid("DE89370400440532013000"));
    assert!(!iban_is_valid("DE89370400440532013001"));
    assert!(!iban_is_valid("DE89"));
    assert!(!iban_is_valid("de89370400440532013000"));
  }

  #[test]
  fn test_bic_pattern() {
    assert!(bic_is_valid("DEUTDEFF"));
    assert!(bic_is_valid("DEUTDEFF500"));
    assert!(!bic_is_valid("DEUTDEF"));
    assert!(!bic_is_valid("DEU1DEFF"));
  }

  #[test]
  fn test_sanitize() {
    let rib = rib().sanitize();
    assert_eq!(rib.account_holder, "Rental SARL");
    assert_eq!(rib.iban, "DE89370400440532013000");
    assert_eq!(rib.bic, "DEUTDEFF");
    assert!(rib.bank_address.is_none());
    assert!(rib.validate().is_ok());
  }

  #[test]
  fn test_short_account_number() {
    let mut rib = rib().sanitize();
    rib.account_number = "12345".into();
    assert!(matches!(rib.validate(), Err(Error::InvalidBankDetails(_))));
  }

  #[tokio::test]
  async fn test_get_or_create_defaults() {
    let db = test_db::setup().await;
    let sv = Settings::new(&db);

    let settings = sv.get_or_create().await.unwrap();
    assert_eq!(settings.reminder_channel, ReminderChannel::Email);
    assert!(!settings.bank_transfer_enabled);
    assert!(settings.card_payment_enabled);
    assert_eq!(settings.email_template, DEFAULT_EMAIL_TEMPLATE);

    let again = sv.get_or_create().await.unwrap();
    assert_eq!(again.updated_at, settings.updated_at);
  }

  #[tokio::test]
  async fn test_bank_transfer_requires_rib() {
    let db = test_db::setup().await;
    let sv = Settings::new(&db);

    let result = sv
      .update(
        1,
        SettingsUpdate { bank_transfer_enabled: Some(true), ..Default::default() },
      )
      .await;
    assert!(matches!(result, Err(Error::InvalidBankDetails(_))));

    let mut bad = rib();
    bad.iban = "DE00370400440532013000".into();
    let result = sv
      .update(
        1,
        SettingsUpdate {
          bank_transfer_enabled: Some(true),
          bank_transfer_rib_details: Some(bad),
          ..Default::default()
        },
      )
      .await;
    assert!(matches!(result, Err(Error::InvalidBankDetails(_))));

    // rejected updates leave nothing behind
    assert!(
      commission_settings::Entity::find().all(&db).await.unwrap().is_empty()
    );
  }

  #[tokio::test]
  async fn test_update_keeps_omitted_fields() {
    let db = test_db::setup().await;
    let sv = Settings::new(&db);

    sv.update(
      1,
      SettingsUpdate {
        bank_transfer_enabled: Some(true),
        d17_payment_enabled: Some(true),
        card_payment_enabled: Some(false),
        reminder_channel: Some(ReminderChannel::EmailAndSms),
        bank_transfer_rib_details: Some(rib()),
        sms_template: Some("Pay {balance}".into()),
        ..Default::default()
      },
    )
    .await
    .unwrap();

    let settings = sv
      .update(
        2,
        SettingsUpdate { d17_payment_enabled: Some(false), ..Default::default() },
      )
      .await
      .unwrap();

    assert!(settings.bank_transfer_enabled);
    assert!(!settings.card_payment_enabled);
    assert!(!settings.d17_payment_enabled);
    assert_eq!(settings.reminder_channel, ReminderChannel::EmailAndSms);
    assert_eq!(settings.sms_template, "Pay {balance}");
    assert_eq!(settings.email_template, DEFAULT_EMAIL_TEMPLATE);
    assert_eq!(settings.updated_by, Some(2));

    let options = sv.payment_options().await.unwrap();
    assert!(options.bank_transfer && !options.card && !options.d17);
    assert_eq!(options.rib.unwrap().iban, "DE89370400440532013000");
  }
}
