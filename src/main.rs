use tokio::net::TcpListener;

use roomcast_server::config::{generate_config_template, Config};
use roomcast_server::hub::{self, Hub};
use roomcast_server::routes;
use roomcast_server::state::AppState;
use roomcast_server::ws;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "roomcast_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "roomcast_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("roomcast server v{} starting", env!("CARGO_PKG_VERSION"));

    // Seed permanent rooms before the listener accepts any connection
    let hub = Hub::new(config.permanent_rooms.clone(), config.max_name_length);
    tracing::info!(rooms = ?config.permanent_rooms, "Seeded permanent rooms");

    let app_state = AppState {
        hub: hub::new_shared(hub),
        senders: ws::new_sender_map(),
    };

    // Build router
    let app = routes::build_router(app_state);

    // Bind and serve
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
