mod action;
mod app;
mod app_state;
mod component;
mod components;
mod download_manager;
mod focus;
mod theme;
mod widgets;
mod workspace;

use samay_proto::client::ForecastClient;
use samay_proto::config::Config;
use samay_proto::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = platform::log_path();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but keep the
    // HTTP client internals quiet.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("samay log: {}", log_path.display());

    tracing::info!("samay starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("config load failed, using defaults: {:#}", e);
            Config::default()
        }
    };
    tracing::info!(
        "service {} (poll every {}ms)",
        config.api.base_url,
        config.polling.interval_ms
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let client = ForecastClient::new(&config.api, &config.polling)?;
    app::App::new(config, client).run().await
}
