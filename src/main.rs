use clap::Parser;
use tokio::io::BufReader;

use office_mover::app::{self, AppError};
use office_mover::config::{DEFAULT_LOG_LEVEL, OfficeConfig, RawConfig, RestTimeouts};
use office_mover::store;

#[derive(Parser, Debug)]
#[command(name = "office-mover", about = "Arrange a shared office floor plan in realtime")]
struct Cli {
    /// Store backend: `memory` or `rest`.
    #[arg(long, env = "OFFICE_MOVER_BACKEND")]
    backend: Option<String>,

    /// Realtime database root, e.g. https://office-mover.example.com
    #[arg(long, env = "OFFICE_MOVER_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "OFFICE_MOVER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OFFICE_MOVER_AUTH_URL")]
    auth_url: Option<String>,

    /// Interval between throttled furniture writes, in milliseconds.
    #[arg(long, env = "OFFICE_MOVER_THROTTLE_MS")]
    throttle_ms: Option<u64>,

    /// Most verbose log level written to stderr.
    #[arg(long, env = "OFFICE_MOVER_LOG", default_value = DEFAULT_LOG_LEVEL)]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level)
        .init();

    let raw = RawConfig {
        backend: cli.backend,
        database_url: cli.database_url,
        api_key: cli.api_key,
        auth_url: cli.auth_url,
        throttle_ms: cli.throttle_ms,
    };
    let config = OfficeConfig::from_raw(raw, RestTimeouts::from_env())?;
    let store = store::connect(&config.backend)?;
    tracing::info!(backend = config.backend.name(), throttle_ms = throttle_millis(&config), "office mover starting");

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    app::run(store, config.throttle, input, &mut out).await
}

fn throttle_millis(config: &OfficeConfig) -> u64 {
    u64::try_from(config.throttle.as_millis()).unwrap_or(u64::MAX)
}
