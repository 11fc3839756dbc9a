// src/main.rs
use stone_sorter::config::AppConfig;
use stone_sorter::{api, logging};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    logging::setup_logging();

    if let Err(err) = dotenv {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    info!("Stone sorting service starting...");
    api::start_api_server(app_config.api, app_config.distributor, app_config.sessions).await;
}
