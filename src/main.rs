use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tunemap::config::{LoggingSettings, Settings};
use tunemap::core::ProximityEngine;
use tunemap::routes::{self, error as api_error, AppState};
use tunemap::services::{Authenticator, CacheManager, NearbyService, PostgresStore, UploadStorage, UserStore};

fn init_tracing(logging: &LoggingSettings) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_tracing(&settings.as_ref().map(|s| s.logging.clone()).unwrap_or_default());

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Starting Tunemap service...");

    let store: Arc<dyn UserStore> = Arc::new(
        PostgresStore::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| {
            error!("Failed to connect to PostgreSQL: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?,
    );

    info!("PostgreSQL store initialized");

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(60);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);
    let cache = Arc::new(
        CacheManager::connect_or_local(settings.cache.redis_url.as_deref(), l1_cache_size, cache_ttl).await,
    );

    info!(
        "Cache manager initialized (L1: {} entries, TTL: {}s, shared: {})",
        l1_cache_size,
        cache_ttl,
        cache.is_shared()
    );

    let engine = ProximityEngine::new(settings.proximity.sort_by_distance);
    let nearby = NearbyService::new(
        store.clone(),
        cache,
        engine,
        settings.proximity.use_bounding_box,
    );

    let storage = UploadStorage::new(&settings.uploads.dir, settings.uploads.max_bytes);
    storage.ensure_dirs().await.map_err(|e| {
        error!("Failed to create upload directory {}: {}", settings.uploads.dir, e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let app_state = AppState {
        store,
        nearby,
        auth: Arc::new(Authenticator::new(
            &settings.auth.jwt_secret,
            settings.auth.token_expire_minutes,
        )),
        storage,
        default_radius_km: settings.proximity.default_radius_km,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let upload_dir = settings.uploads.dir.clone();
    let max_upload_bytes = settings.uploads.max_bytes;

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(api_error::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(api_error::handle_query_payload_error))
            .app_data(web::FormConfig::default().error_handler(api_error::handle_form_payload_error))
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .service(actix_files::Files::new("/uploads", &upload_dir))
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
