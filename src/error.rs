use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Db(#[from] DbErr),
  #[error("Invalid arguments: {0}")]
  InvalidArgs(String),
  #[error("Agency not found")]
  AgencyNotFound,
  #[error("Unauthorized")]
  Unauthorized,
  #[error("Forbidden")]
  Forbidden,
  #[error("Invalid bank details: {0}")]
  InvalidBankDetails(String),
  #[error("Mail error: {0}")]
  Mail(String),
  #[error("SMS error: {0}")]
  Sms(String),
  #[error("Reminder dispatch failed: {0}")]
  Dispatch(String),
  #[error("Internal error: {0}")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Message safe to show to an API client.
  pub fn user_message(&self) -> String {
    match self {
      Error::Db(_) | Error::Internal(_) => "Internal server error".into(),
      Error::InvalidArgs(msg) => msg.clone(),
      Error::AgencyNotFound => "Agency not found".into(),
      Error::Unauthorized => "Authentication required".into(),
      Error::Forbidden => "You are not allowed to perform this action".into(),
      Error::InvalidBankDetails(msg) => format!("Invalid bank details: {msg}"),
      Error::Mail(msg) | Error::Sms(msg) | Error::Dispatch(msg) => {
        format!("Reminder could not be delivered: {msg}")
      }
    }
  }

  fn status(&self) -> (StatusCode, &'static str) {
    match self {
      Error::InvalidArgs(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGS"),
      Error::InvalidBankDetails(_) => {
        (StatusCode::BAD_REQUEST, "INVALID_BANK_DETAILS")
      }
      Error::AgencyNotFound => (StatusCode::NOT_FOUND, "AGENCY_NOT_FOUND"),
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
      Error::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
      Error::Mail(_) | Error::Sms(_) | Error::Dispatch(_) => {
        (StatusCode::BAD_GATEWAY, "DISPATCH_FAILED")
      }
      Error::Db(_) | Error::Internal(_) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
      }
    }
  }
}

#[derive(Serialize)]
struct ErrorBody {
  error: String,
  code: &'static str,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, code) = self.status();
    if status.is_server_error() {
      tracing::error!("{self}");
    }
    (status, Json(ErrorBody { error: self.user_message(), code }))
      .into_response()
  }
}
