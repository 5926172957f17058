use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("interchat=info")),
        )
        .init();

    if let Err(e) = interchat::startup::run().await {
        error!("fatal: {e}");
        std::process::exit(1);
    }
}
