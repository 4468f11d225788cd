mod config;
mod entity;
mod error;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{config::Config, prelude::*, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "commission=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting Commission Server v{}", env!("CARGO_PKG_VERSION"));
  info!(
    "commission applies from {} with a monthly threshold of {}",
    config.effective_from, config.monthly_threshold
  );

  let app = Arc::new(AppState::new(config).await?);

  plugins::App::new().register(plugins::server::Plugin).run(app).await;

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");
  Ok(())
}
