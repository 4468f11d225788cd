//! Outbound mail and SMS gateways used by reminders.
//!
//! Both gateways speak JSON over HTTP. When no URL is configured the gateway
//! is considered unconfigured and every send fails, which callers record
//! like any other delivery failure.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::{config::Gateway, prelude::*};

#[async_trait]
pub trait MailSender: Send + Sync {
  async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneCheck {
  pub normalized: String,
  pub valid: bool,
}

#[async_trait]
pub trait SmsSender: Send + Sync {
  fn validate_and_format_phone(&self, raw: &str) -> PhoneCheck;

  async fn send(&self, phone: &str, text: &str) -> Result<()>;
}

/// Strips separators, turns a `00` prefix into `+` and prefixes bare
/// national numbers with `default_prefix`.
pub fn normalize_phone(raw: &str, default_prefix: &str) -> PhoneCheck {
  let compact: String = raw
    .trim()
    .chars()
    .filter(|c| !matches!(c, ' ' | '.' | '-' | '(' | ')'))
    .collect();

  let normalized = if let Some(rest) = compact.strip_prefix("00") {
    format!("+{rest}")
  } else if compact.starts_with('+') || compact.is_empty() {
    compact
  } else {
    format!("{default_prefix}{}", compact.trim_start_matches('0'))
  };

  let digits = normalized.strip_prefix('+').unwrap_or_default();
  let valid = (8..=15).contains(&digits.len())
    && digits.chars().all(|c| c.is_ascii_digit());

  PhoneCheck { normalized, valid }
}

const BLOCK_TAGS: &[&str] = &[
  "address", "article", "blockquote", "br", "dd", "div", "dl", "dt",
  "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol",
  "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Plain-text rendering of an HTML message: tags dropped, entities decoded,
/// whitespace collapsed. Block elements separate words, inline ones do not.
pub fn html_to_text(html: &str) -> String {
  let fragment = Html::parse_fragment(html);
  let mut text = String::with_capacity(html.len());
  push_text(fragment.root_element(), &mut text);
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
  let block = BLOCK_TAGS.contains(&element.value().name());
  if block {
    out.push(' ');
  }

  for child in element.children() {
    if let Some(child) = ElementRef::wrap(child) {
      push_text(child, out);
    } else if let Some(text) = child.value().as_text() {
      out.push_str(text);
    }
  }

  if block {
    out.push(' ');
  }
}

#[derive(Serialize)]
struct MailRequest<'a> {
  from: &'a str,
  to: &'a str,
  subject: &'a str,
  html: &'a str,
}

#[derive(Serialize)]
struct SmsRequest<'a> {
  sender: &'a str,
  to: &'a str,
  text: &'a str,
}

#[derive(Clone)]
pub struct HttpMailer {
  client: Client,
  gateway: Gateway,
}

impl HttpMailer {
  pub fn new(gateway: Gateway) -> Self {
    Self { client: Client::new(), gateway }
  }
}

#[async_trait]
impl MailSender for HttpMailer {
  async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
    let url = self
      .gateway
      .url
      .as_deref()
      .ok_or_else(|| Error::Mail("mail gateway is not configured".into()))?;

    let body = MailRequest { from: &self.gateway.sender, to, subject, html };
    post(&self.client, url, self.gateway.api_key.as_deref(), &body)
      .await
      .map_err(Error::Mail)
  }
}

#[derive(Clone)]
pub struct HttpSms {
  client: Client,
  gateway: Gateway,
  phone_prefix: String,
}

impl HttpSms {
  pub fn new(gateway: Gateway, phone_prefix: String) -> Self {
    Self { client: Client::new(), gateway, phone_prefix }
  }
}

#[async_trait]
impl SmsSender for HttpSms {
  fn validate_and_format_phone(&self, raw: &str) -> PhoneCheck {
    normalize_phone(raw, &self.phone_prefix)
  }

  async fn send(&self, phone: &str, text: &str) -> Result<()> {
    let url = self
      .gateway
      .url
      .as_deref()
      .ok_or_else(|| Error::Sms("SMS gateway is not configured".into()))?;

    let body = SmsRequest { sender: &self.gateway.sender, to: phone, text };
    post(&self.client, url, self.gateway.api_key.as_deref(), &body)
      .await
      .map_err(Error::Sms)
  }
}

async fn post<B: Serialize>(
  client: &Client,
  url: &str,
  api_key: Option<&str>,
  body: &B,
) -> std::result::Result<(), String> {
  let mut request = client.post(url).json(body);
  if let Some(key) = api_key {
    request = request.bearer_auth(key);
  }

  let response = request
    .timeout(Duration::from_secs(15))
    .send()
    .await
    .map_err(|e| format!("Request failed: {e}"))?;

  let status = response.status();
  if status.is_success() {
    Ok(())
  } else {
    let text = response.text().await.unwrap_or_default();
    Err(format!("Gateway responded {status}: {}", text.trim()))
  }
}
