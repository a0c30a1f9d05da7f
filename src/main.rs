//! main.rs
use early_access::configuration::get_configuration;
use early_access::startup::Application;
use early_access::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("early_access".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let application = Application::build(&configuration).await?;
    application.run_until_stopped().await?;
    Ok(())
}
