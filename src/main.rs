use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use marketplace_auth::{
    auth::{links, AuthService, UserRepository},
    config::Settings,
    create_router,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Marketplace Auth - Starting...");

    // The service must not run without a signing secret
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!("Loaded settings: {:?}", settings);

    let (link_tx, link_rx) = links::link_channel();
    tokio::spawn(links::log_links(link_rx));

    let service = Arc::new(AuthService::new(
        UserRepository::new(),
        &settings,
        Arc::new(link_tx),
    ));
    let app = create_router(service);

    let addr = settings.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Marketplace Auth is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
