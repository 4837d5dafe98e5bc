use anyhow::Result;
use echo_bench::config::Config;
use echo_bench::supervisor::LoadTest;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("TCP echo load testing.  ");
    info!("Target {}", config.target);

    let report = LoadTest::new(Arc::new(config)).run().await;

    println!("{}", report);
    Ok(())
}
