use anyhow::Result;
use exchange_store::config::Settings;
use exchange_store::infrastructure::{log_messages, telemetry};
use exchange_store::Application;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    telemetry::init(&settings.logging)?;
    info!("{}", log_messages::configuration::CONFIG_LOADED);

    let app = Application::new(settings);
    app.run().await?;

    Ok(())
}
