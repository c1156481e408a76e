use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use user_gateway::cache::CodeCache;
use user_gateway::{configure_routes, AppState, Settings, TOKEN_HEADER};

fn build_cors(settings: &Settings) -> Cors {
    if !settings.cors.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors = if settings.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .supports_credentials()
    } else {
        Cors::default()
            .allowed_origin("http://localhost:8080")
            .allowed_origin("http://127.0.0.1:8080")
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
            .allowed_headers(vec!["Content-Type", "Authorization", TOKEN_HEADER])
            .supports_credentials()
    };

    cors.max_age(settings.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // A missing signing key fails here, before anything listens.
    let config = Settings::new().context("loading configuration")?;
    info!("Configuration loaded successfully");

    let state = AppState::new(config.clone()).context("initializing application state")?;
    let gate = state.auth_gate();

    // Expired verification codes are swept in the background
    let codes = state.codes.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            codes.purge_expired().await;
        }
    });

    let state = web::Data::new(state);
    let workers = config.server.workers as usize;
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
        .context("binding listener")?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || {
        let gate = gate.clone();
        App::new()
            .wrap(build_cors(&config))
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, gate))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await?;

    Ok(())
}
