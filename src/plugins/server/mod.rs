mod auth;
mod handlers;

use std::net::SocketAddr;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

/// Commission API routes without the rate limiter, which needs peer
/// addresses from the connect info.
pub fn router(app: Arc<AppState>) -> Router {
  const AGENCY: &str = "/api/commission/agencies/{id}";

  Router::new()
    .route("/health", get(handlers::health))
    .route("/api/commission/summary", get(handlers::summary))
    .route(AGENCY, get(handlers::agency_ledger))
    .route(&format!("{AGENCY}/state"), get(handlers::agency_state))
    .route(&format!("{AGENCY}/payments"), post(handlers::record_payment))
    .route(&format!("{AGENCY}/notes"), post(handlers::add_note))
    .route(&format!("{AGENCY}/reminders"), post(handlers::send_reminder))
    .route(&format!("{AGENCY}/block"), post(handlers::block))
    .route(&format!("{AGENCY}/unblock"), post(handlers::unblock))
    .route(
      "/api/commission/settings",
      get(handlers::get_settings).put(handlers::update_settings),
    )
    .route("/api/commission/payment-options", get(handlers::payment_options))
    .layer(
      ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
      ),
    )
    .with_state(app)
}

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));
    let router = router(app)
      .layer(GovernorLayer::new(governor_conf))
      .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP server listening on {addr}");

    tokio::spawn(async move {
      if let Err(err) = axum::serve(listener, router).await {
        error!("HTTP server stopped: {err}");
      }
    });

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    config::Config,
    entity::BookingStatus,
    sv::test_utils::{
      fixtures,
      gateways::{RecordingMailer, RecordingSms},
      test_db,
    },
  };

  async fn app_with(mailer: RecordingMailer) -> Arc<AppState> {
    let db = test_db::setup().await;
    fixtures::admin(&db, 1, "Root").await;
    fixtures::agency(&db, 10, "Agence Sud").await;
    fixtures::agency(&db, 20, "Rent Nord").await;
    fixtures::car(&db, 1, 10, true).await;
    fixtures::booking(&db, 1, 10, BookingStatus::Paid, (6, 2), (6, 4), 100.0)
      .await;
    fixtures::booking(&db, 2, 10, BookingStatus::Reserved, (6, 10), (6, 12), 150.0)
      .await;

    let config = Config { admins: HashSet::from([99]), ..Config::default() };
    Arc::new(AppState::with_gateways(
      db,
      config,
      Arc::new(mailer),
      Arc::new(RecordingSms::default()),
    ))
  }

  async fn call(
    app: &Arc<AppState>,
    method: &str,
    uri: &str,
    user: Option<i64>,
    body: Option<json::Value>,
  ) -> (StatusCode, json::Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      request = request.header(auth::USER_HEADER, user.to_string());
    }
    let body = match body {
      Some(body) => {
        request = request.header("content-type", "application/json");
        Body::from(body.to_string())
      }
      None => Body::empty(),
    };

    let response =
      router(app.clone()).oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = json::from_slice(&bytes).unwrap_or(json::Value::Null);
    (status, value)
  }

  #[tokio::test]
  async fn test_health() {
    let app = app_with(RecordingMailer::default()).await;
    let response = router(app)
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn test_summary_requires_admin() {
    let app = app_with(RecordingMailer::default()).await;
    let uri = "/api/commission/summary?year=2025&month=6";

    let (status, _) = call(&app, "GET", uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", uri, Some(10), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = call(&app, "GET", uri, Some(1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["rows"][0]["commission_due"], 250.0);
  }

  #[tokio::test]
  async fn test_summary_rejects_bad_month() {
    let app = app_with(RecordingMailer::default()).await;
    let (status, body) = call(
      &app,
      "GET",
      "/api/commission/summary?year=2025&month=13",
      Some(99),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ARGS");
  }

  #[tokio::test]
  async fn test_agency_reads_own_ledger_only() {
    let app = app_with(RecordingMailer::default()).await;

    let (status, body) = call(
      &app,
      "GET",
      "/api/commission/agencies/10?year=2025&month=6",
      Some(10),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"]["balance"], 250.0);
    assert_eq!(body["bookings"][1]["payment_status"], "unpaid");

    let (status, _) = call(
      &app,
      "GET",
      "/api/commission/agencies/10?year=2025&month=6",
      Some(20),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn test_payment_then_ledger() {
    let app = app_with(RecordingMailer::default()).await;

    let (status, body) = call(
      &app,
      "POST",
      "/api/commission/agencies/10/payments",
      Some(1),
      Some(json::json!({ "year": 2025, "month": 6, "amount": 120.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["event_type"], "payment");

    let (_, body) = call(
      &app,
      "GET",
      "/api/commission/agencies/10?year=2025&month=6",
      Some(1),
      None,
    )
    .await;
    assert_eq!(body["summary"]["commission_collected"], 120.0);
    assert_eq!(body["bookings"][0]["payment_status"], "paid");
    assert_eq!(body["bookings"][1]["payment_status"], "partial");
    assert_eq!(body["agency"]["status"], "needs_follow_up");
  }

  #[tokio::test]
  async fn test_failed_reminder_is_reported_and_logged() {
    let app = app_with(RecordingMailer::failing()).await;

    let (status, body) = call(
      &app,
      "POST",
      "/api/commission/agencies/10/reminders",
      Some(1),
      Some(json::json!({ "year": 2025, "month": 6, "channel": "email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "DISPATCH_FAILED");

    let (_, body) = call(
      &app,
      "GET",
      "/api/commission/agencies/10?year=2025&month=6",
      Some(1),
      None,
    )
    .await;
    assert_eq!(body["log"][0]["event_type"], "reminder");
    assert_eq!(body["log"][0]["success"], false);
  }

  #[tokio::test]
  async fn test_block_and_unblock() {
    let app = app_with(RecordingMailer::default()).await;
    let period = json::json!({ "year": 2025, "month": 6 });

    let (status, body) = call(
      &app,
      "POST",
      "/api/commission/agencies/10/block",
      Some(1),
      Some(period.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cars"], json::json!([1]));
    assert_eq!(body["state"]["blocked"], true);

    let (_, body) =
      call(&app, "GET", "/api/commission/agencies/10/state", Some(10), None)
        .await;
    assert_eq!(body["cars"][0]["available"], false);

    let (status, body) = call(
      &app,
      "POST",
      "/api/commission/agencies/10/unblock",
      Some(1),
      Some(period),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cars"], json::json!([1]));
    assert_eq!(body["state"]["blocked"], false);
  }

  #[tokio::test]
  async fn test_settings_and_payment_options() {
    let app = app_with(RecordingMailer::default()).await;

    let (status, body) = call(
      &app,
      "PUT",
      "/api/commission/settings",
      Some(1),
      Some(json::json!({ "bank_transfer_enabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BANK_DETAILS");

    let (status, _) = call(
      &app,
      "PUT",
      "/api/commission/settings",
      Some(1),
      Some(json::json!({
        "bank_transfer_enabled": true,
        "bank_transfer_rib_details": {
          "account_holder": "Rental SARL",
          "bank_name": "Lloyds",
          "iban": "GB82 WEST 1234 5698 7654 32",
          "bic": "deutdeff",
          "account_number": "98765432"
        }
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
      call(&app, "GET", "/api/commission/payment-options", Some(10), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bank_transfer"], true);
    assert_eq!(body["rib"]["iban"], "GB82WEST12345698765432");
  }
}
