use tokio::net::TcpListener;

use view_alerts::configuration::get_configuration;
use view_alerts::startup::{get_app_state, run};
use view_alerts::telemetry::{get_subscriber, initialize_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("view_alerts".into(), "info".into(), std::io::stdout);
    initialize_subscriber(subscriber);

    let configuration = get_configuration()?;
    let app_state = get_app_state(&configuration)?;

    let listener = TcpListener::bind((
        configuration.application.host.as_str(),
        configuration.application.port,
    ))
    .await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for job triggers");

    run(listener, app_state).await?;

    Ok(())
}
