use tracing_subscriber::EnvFilter;

mod config;
mod notify;
mod paper;
mod pipeline;
mod rank;
mod sources;
mod summarize;

use config::Config;
use pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting paper-digest run");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let pipeline = Pipeline::new(config);
    if !pipeline.run().await {
        std::process::exit(1);
    }

    Ok(())
}
