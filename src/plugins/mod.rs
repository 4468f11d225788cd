pub mod server;

use std::sync::Arc;

use crate::state::AppState;

#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Box<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  /// Starts every plugin in registration order. A plugin that fails to start
  /// is logged and skipped.
  pub async fn run(self, app: Arc<AppState>) {
    for plugin in self.plugins {
      let name = plugin.name();
      tracing::info!("init `{name}`");

      if let Err(err) = plugin.start(app.clone()).await {
        tracing::error!("failed `{name}`: {err:#}");
      }
    }
  }
}
