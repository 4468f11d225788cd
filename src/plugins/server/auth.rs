use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{entity::UserRole, prelude::*, state::AppState};

pub const USER_HEADER: &str = "x-user-id";

/// Caller identity taken from the `X-User-Id` header.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
  pub id: i64,
  pub admin: bool,
}

impl Actor {
  pub fn require_admin(&self) -> Result<()> {
    if self.admin { Ok(()) } else { Err(Error::Forbidden) }
  }

  /// Admins read every agency, an agency only its own account.
  pub fn require_agency_access(&self, agency_id: i64) -> Result<()> {
    if self.admin || self.id == agency_id { Ok(()) } else { Err(Error::Forbidden) }
  }
}

impl FromRequestParts<Arc<AppState>> for Actor {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let id: i64 = parts
      .headers
      .get(USER_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.trim().parse().ok())
      .ok_or(Error::Unauthorized)?;

    if app.config.admins.contains(&id) {
      return Ok(Self { id, admin: true });
    }

    let user = app.sv().user.by_id(id).await?.ok_or(Error::Unauthorized)?;
    Ok(Self { id, admin: user.role == UserRole::Admin })
  }
}
