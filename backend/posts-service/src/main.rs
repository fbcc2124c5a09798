use actix_web::{web, App, HttpServer};
use posts_service::cache::{IndexCacheSettings, MemoryPageCache, PageCache, RedisPageCache};
use posts_service::config::{CacheBackend, Config, DatabaseBackend};
use posts_service::db::{InMemoryPostsRepository, PgPostsRepository, PostsRepository};
use posts_service::handlers;
use posts_service::middleware::{SessionKeys, SessionMiddleware};
use posts_service::state::AppState;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,actix_web=info,sqlx=warn";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn build_repository(config: &Config) -> io::Result<Arc<dyn PostsRepository>> {
    let db = &config.database;
    match db.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory repository; data is lost on restart");
            Ok(Arc::new(InMemoryPostsRepository::new()))
        }
        DatabaseBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(db.max_connections)
                .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
                .connect(&db.url)
                .await
                .map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::Other,
                        format!("Failed to connect to PostgreSQL: {e}"),
                    )
                })?;

            tracing::info!(
                "Database pool initialized with {} max connections",
                db.max_connections
            );

            if db.run_migrations {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| {
                        io::Error::new(
                            io::ErrorKind::Other,
                            format!("Failed to run database migrations: {e}"),
                        )
                    })?;
                tracing::info!("Database migrations applied");
            }

            Ok(Arc::new(PgPostsRepository::new(pool)))
        }
    }
}

async fn build_page_cache(config: &Config) -> io::Result<Arc<dyn PageCache>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryPageCache::new())),
        CacheBackend::Redis => {
            let client = redis::Client::open(config.cache.redis_url.as_str()).map_err(|e| {
                io::Error::new(io::ErrorKind::Other, format!("Invalid REDIS_URL: {e}"))
            })?;
            let manager = ConnectionManager::new(client).await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize Redis connection: {e}"),
                )
            })?;

            tracing::info!("Connected to Redis page cache");
            Ok(Arc::new(RedisPageCache::new(manager, "posts-service")))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Posts Service
///
/// Serves the Yatube feeds, post pages, comments and the follow graph.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/profile/{username}/`, `/follow/` - feeds
/// - `/posts/{post_id}/`, `/create/`, `/posts/{post_id}/edit/` - posts
/// - `/posts/{post_id}/comment/` - comments
/// - `/profile/{username}/follow/`, `/profile/{username}/unfollow/` - follows
/// - `/api/v1/health*`, `/metrics` - operations
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Container healthcheck: `posts-service healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" {
                let port = std::env::var("POSTS_SERVICE_PORT").unwrap_or_else(|_| "8085".into());
                let url = format!("http://127.0.0.1:{}/api/v1/health", port);
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting posts-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);
    tracing::debug!(?config, "Loaded configuration");

    let repo = build_repository(&config).await?;
    let page_cache = build_page_cache(&config).await?;

    let state = web::Data::new(AppState::new(
        repo,
        page_cache,
        IndexCacheSettings::new(&config.cache.index_key_prefix, config.cache.index_ttl()),
        config.auth.login_url.clone(),
    ));
    let session_keys = Arc::new(SessionKeys::new(&config.auth.jwt_secret));
    let cookie_name = config.auth.cookie_name.clone();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(SessionMiddleware::new(session_keys.clone(), &cookie_name))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_ops_routes)
            .configure(handlers::configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .workers(config.app.workers)
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    Err(e)
                }
                Err(e) => {
                    tracing::error!("HTTP server task join error: {}", e);
                    Err(io::Error::new(io::ErrorKind::Other, e.to_string()))
                }
            }
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            let _ = server_task.await;
            Ok(())
        }
    };

    tracing::info!("Posts-service shutting down");
    result
}
