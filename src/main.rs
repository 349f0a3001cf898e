use anyhow::Result;
use tracing_subscriber::EnvFilter;

use review_sync::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("review_sync=info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    let report = review_sync::run(&settings).await?;

    println!("\n{report}\n\nDONE!");

    Ok(())
}
