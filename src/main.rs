use std::net::TcpListener;

use anyhow::Context;

use memberlist::settings::Settings;
use memberlist::{app, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = telemetry::create_subscriber("info", std::io::stdout);
    telemetry::set_subscriber(subscriber)?;

    let settings = Settings::load().context("Failed to load settings")?;

    let store = settings.store.store()?;
    let public_config = settings.public_config();

    let listener = TcpListener::bind(settings.app.addr())?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    app::run(listener, store, public_config)?
        .await
        .context("Failed to run app")
}
