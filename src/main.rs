use axum::{Router, Server, http::HeaderValue, middleware::from_fn, routing::get};
use diesel::{
    PgConnection,
    r2d2::{self, ConnectionManager as DbConnectionManager},
};
use projecthub_backend::{
    AppState,
    cache::CachedUserStore,
    config::Config,
    db::DbPool,
    error::{AppError, AppResult},
    middleware::{auth::AuthService, request_tracking_middleware},
    routes,
    stores::{PgMilestoneNoteStore, PgMilestoneStore, PgUserStore},
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = Config::from_env()?;
    projecthub_backend::init_tracing(&config.logging());

    // Initialize database
    let database = config.database();
    let manager = DbConnectionManager::<PgConnection>::new(&database.url);
    let db: DbPool = r2d2::Pool::builder()
        .max_size(database.max_connections)
        .min_idle(Some(database.min_connections))
        .connection_timeout(Duration::from_secs(database.connection_timeout))
        .build(manager)?;

    // Initialize Redis
    let redis_config = config.redis();
    let redis = redis::Client::open(redis_config.url.as_str())?;

    // Only token authentication goes through the cache; the engine reads users from Postgres
    let session_users = CachedUserStore::new(
        PgUserStore::new(db.clone()),
        redis,
        redis_config.user_cache_ttl,
    );
    let state = AppState::new(
        AuthService::new(config.auth()),
        Arc::new(PgMilestoneStore::new(db.clone())),
        Arc::new(PgMilestoneNoteStore::new(db.clone())),
        Arc::new(PgUserStore::new(db)),
        Arc::new(session_users),
    );

    // CORS configuration
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .cors_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health))
        .merge(routes::create_router(state))
        .layer(cors)
        .layer(from_fn(request_tracking_middleware));

    let addr: SocketAddr = config
        .server_address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;
    tracing::info!(%addr, "ProjectHub milestone service listening");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))
}
