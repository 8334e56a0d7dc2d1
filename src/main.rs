use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use house_rater::config::{LoggingSettings, Settings};
use house_rater::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use house_rater::routes::{self, AppState};
use house_rater::services::{EmailClient, JwtVerifier, PostgresClient};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// LOG_LEVEL and LOG_FORMAT win over the config file; RUST_LOG wins over both for filtering
fn init_logging(settings: Option<&LoggingSettings>) {
    let defaults = LoggingSettings::default();
    let settings = settings.unwrap_or(&defaults);

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_logging(settings.as_ref().ok().map(|s| &s.logging));

    info!("Starting HouseRater service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let postgres = Arc::new(
        PostgresClient::from_settings(&settings.database)
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    let email = Arc::new(
        EmailClient::from_settings(&settings.email)
            .map_err(|e| startup_error("Failed to create email client", e))?,
    );

    if email.is_configured() {
        info!("Email client initialized ({})", settings.email.api_base);
    } else {
        warn!("No email API key configured, invitation emails will be logged only");
    }

    let verifier = web::Data::new(JwtVerifier::from_settings(&settings.auth));

    let app_state = AppState { postgres, email };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(verifier.clone())
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
