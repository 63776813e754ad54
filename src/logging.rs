use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

/// Install the global tracing subscriber.
///
/// Returns false when a subscriber was already installed (tests, or a second
/// call), in which case the existing one stays in place.
pub fn init_tracing(config: &AppConfig) -> bool {
  let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

  let result = if config.log_json {
    tracing_subscriber::registry()
      .with(filter)
      .with(tracing_subscriber::fmt::layer().json())
      .try_init()
  } else {
    tracing_subscriber::registry()
      .with(filter)
      .with(tracing_subscriber::fmt::layer())
      .try_init()
  };

  result.is_ok()
}
