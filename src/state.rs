use migration::{Migrator, MigratorTrait};

use crate::{
  config::Config,
  prelude::*,
  sv::{
    self,
    notify::{HttpMailer, HttpSms, MailSender, SmsSender},
    period::Rules,
  },
};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
  pub mailer: Arc<dyn MailSender>,
  pub sms: Arc<dyn SmsSender>,
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub car: sv::Car<'a>,
  pub events: sv::Events<'a>,
  pub summary: sv::Summary<'a>,
  pub ledger: sv::Ledger<'a>,
  pub blocking: sv::Blocking<'a>,
  pub reminder: sv::Reminder<'a>,
  pub settings: sv::Settings<'a>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;

    let mailer = Arc::new(HttpMailer::new(config.mail.clone()));
    let sms = Arc::new(HttpSms::new(config.sms.clone(), config.phone_prefix.clone()));

    if config.admins.is_empty() {
      warn!("ADMIN_IDS is empty, only users with the admin role are admins");
    }

    Ok(Self::with_gateways(db, config, mailer, sms))
  }

  pub fn with_gateways(
    db: DatabaseConnection,
    config: Config,
    mailer: Arc<dyn MailSender>,
    sms: Arc<dyn SmsSender>,
  ) -> Self {
    Self { db, config, mailer, sms }
  }

  pub fn rules(&self) -> Rules {
    Rules {
      effective_from: self.config.effective_from,
      monthly_threshold: self.config.monthly_threshold,
    }
  }

  pub fn sv(&self) -> Services<'_> {
    let db = &self.db;
    let rules = self.rules();

    Services {
      user: sv::User::new(db),
      car: sv::Car::new(db),
      events: sv::Events::new(db),
      summary: sv::Summary::new(db, rules),
      ledger: sv::Ledger::new(db, rules),
      blocking: sv::Blocking::new(db),
      reminder: sv::Reminder::new(db, rules, &*self.mailer, &*self.sms),
      settings: sv::Settings::new(db),
    }
  }
}
