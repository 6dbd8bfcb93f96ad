use anyhow::Context as _;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// Install the global subscriber. `RUST_LOG` overrides `config.level`.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
  let level: LevelFilter = config
    .level
    .parse()
    .with_context(|| format!("invalid log level {:?}", config.level))?;

  let filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();
  let builder = tracing_subscriber::fmt().with_env_filter(filter);

  match config.format {
    LogFormat::Text => builder.try_init(),
    LogFormat::Json => builder.json().try_init(),
  }
  .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
