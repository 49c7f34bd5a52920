//! GiveFlow server entry point

use giveflow::{Config, http};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("giveflow=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let router = match giveflow::build_app(&config).await {
        Ok(router) => router,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = http::serve(router, &config.bind_addr).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
