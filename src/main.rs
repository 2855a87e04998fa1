use anyhow::{Context, bail};
use rask_log_client::app::{self, App, Config, ConfigError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => return Err(e).context("invalid configuration"),
    };

    if let Err(e) = app::setup_logging_safe(config.log_level) {
        eprintln!("Warning: {e}");
    }

    let app = App::from_config(config).context("failed to build logger")?;
    let summary = app.run_stdin().await.context("failed to read input")?;

    if summary.undelivered > 0 {
        bail!(
            "{} of {} message(s) not delivered",
            summary.undelivered,
            summary.received
        );
    }
    Ok(())
}
