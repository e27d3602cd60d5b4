use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use estate_match::config::{Settings, StoreBackend};
use estate_match::core::{RangeCatalog, SearchEngine, SearchLimits};
use estate_match::models::{Item, Property};
use estate_match::routes::{self, AppState};
use estate_match::services::{CacheManager, ItemStore, MemoryStore, PostgresClient, PropertyStore};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn build_stores(
    settings: &Settings,
) -> io::Result<(Arc<dyn ItemStore>, Arc<dyn PropertyStore>)> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory catalogs; data is lost on restart");
            let items: Arc<dyn ItemStore> = Arc::new(MemoryStore::<Item>::new());
            let properties: Arc<dyn PropertyStore> = Arc::new(MemoryStore::<Property>::new());
            Ok((items, properties))
        }
        StoreBackend::Postgres => {
            let db = &settings.database;
            let connect = |url: String| async move {
                PostgresClient::from_settings(
                    &url,
                    db.max_connections,
                    db.min_connections,
                    db.acquire_timeout_secs,
                    db.idle_timeout_secs,
                )
                .await
            };

            let items = connect(db.item_url.clone())
                .await
                .map_err(|e| startup_error("Failed to connect to item database", e))?;
            let properties = connect(db.property_url.clone())
                .await
                .map_err(|e| startup_error("Failed to connect to property database", e))?;

            info!(
                "PostgreSQL clients initialized (max: {} connections each)",
                db.max_connections.unwrap_or(10)
            );
            let items: Arc<dyn ItemStore> = Arc::new(items);
            let properties: Arc<dyn PropertyStore> = Arc::new(properties);
            Ok((items, properties))
        }
    }
}

async fn build_cache(settings: &Settings) -> Option<Arc<CacheManager>> {
    if !settings.cache.enabled {
        info!("Caching disabled by configuration");
        return None;
    }

    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    match CacheManager::new(&settings.cache.redis_url, l1_cache_size, cache_ttl).await {
        Ok(cache) => {
            info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
            Some(Arc::new(cache))
        }
        Err(e) => {
            warn!("Failed to connect to Redis ({}), running without cache", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_tracing(&settings.logging.level, &settings.logging.format);
    info!("Starting estate-match search service...");

    let item_ranges = RangeCatalog::load(&settings.conditions.item_path)
        .map_err(|e| startup_error("Failed to load item conditions", e))?;
    let property_ranges = RangeCatalog::load(&settings.conditions.property_path)
        .map_err(|e| startup_error("Failed to load property conditions", e))?;
    info!("Range catalogs loaded");

    let (items, properties) = build_stores(&settings).await?;

    let limits = SearchLimits {
        list_limit: settings.search.list_limit,
        nazotte_limit: settings.search.nazotte_limit,
    };

    let mut engine = SearchEngine::new(
        items,
        properties,
        Arc::new(item_ranges),
        Arc::new(property_ranges),
        limits,
    );
    if let Some(cache) = build_cache(&settings).await {
        engine = engine.with_cache(cache);
    }

    info!("Search engine initialized with limits: {:?}", limits);

    let app_state = AppState { engine };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
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
