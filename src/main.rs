use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use chrono::Utc;
use mock_pairs::config::{LogFormat, LoggingSettings, Settings};
use mock_pairs::core::PairingEngine;
use mock_pairs::routes::{self, AppState};
use mock_pairs::services::{
    next_run_after, run_weekly, CachedDirectory, LogNotifier, PostgresStore,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.log_format() {
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting mock pairs service...");

    let store = Arc::new(
        PostgresStore::from_settings(&settings.database, settings.registration.clone())
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?,
    );

    info!(
        "PostgreSQL store initialized (registration open: {})",
        settings.registration.open
    );

    let directory = Arc::new(CachedDirectory::new(
        store.clone(),
        settings.cache.directory_size,
        settings.cache.ttl_secs,
    ));
    let notifier = Arc::new(LogNotifier::new(directory));
    let engine = PairingEngine::new(store.clone(), store.clone(), notifier);
    let run_lock = Arc::new(Mutex::new(()));

    if settings.schedule.enabled {
        if let Err(e) = next_run_after(Utc::now(), &settings.schedule) {
            error!("Invalid schedule: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
        let engine = engine.clone();
        let schedule = settings.schedule.clone();
        let run_lock = run_lock.clone();
        actix_web::rt::spawn(async move {
            if let Err(e) = run_weekly(engine, schedule, run_lock).await {
                error!("Scheduler stopped: {}", e);
            }
        });
        info!("Weekly scheduler started");
    } else {
        info!("Weekly scheduler disabled, cycles run only through the API");
    }

    let app_state = AppState {
        engine,
        history: store.clone(),
        database: Some(store),
        run_lock,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(2);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
