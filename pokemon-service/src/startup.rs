//! Application startup and lifecycle management.

use crate::config::{PokemonConfig, RepositoryBackend};
use crate::handlers;
use crate::services::{InMemoryPokemonRepository, PokemonDb, PokemonRepository};
use axum::{
    http::{Method, Request},
    middleware::from_fn,
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: PokemonConfig,
    pub repo: Arc<dyn PokemonRepository>,
}

/// Build the full HTTP surface over an already-constructed state.
pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.assets.dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/pokemons",
            get(handlers::list_pokemons).post(handlers::create_pokemon),
        )
        .route(
            "/pokemons/:id",
            get(handlers::get_pokemon)
                .put(handlers::update_pokemon)
                .delete(handlers::delete_pokemon),
        )
        .route("/search/:name", get(handlers::search_pokemon))
        .route("/pokemons/search/:name", get(handlers::search_pokemon))
        .nest_service("/assets", assets)
        .route_layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    pokemon_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    mongo: Option<PokemonDb>,
}

impl Application {
    /// Open the configured repository and bind the listener.
    pub async fn build(config: PokemonConfig) -> Result<Self, AppError> {
        let (repo, mongo): (Arc<dyn PokemonRepository>, Option<PokemonDb>) =
            match config.repository.backend {
                RepositoryBackend::Mongo => {
                    let db = PokemonDb::connect(
                        &config.mongodb.uri,
                        &config.mongodb.database,
                        &config.mongodb.collection,
                    )
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;

                    db.initialize_indexes().await.map_err(|e| {
                        tracing::error!("Failed to initialize database indexes: {}", e);
                        e
                    })?;

                    (Arc::new(db.clone()), Some(db))
                }
                RepositoryBackend::Memory => {
                    tracing::warn!("Using in-memory repository; records are not persisted");
                    (Arc::new(InMemoryPokemonRepository::new()), None)
                }
            };

        Self::with_repository(config, repo, mongo).await
    }

    /// Bind the listener around a caller-supplied repository.
    pub async fn with_repository(
        config: PokemonConfig,
        repo: Arc<dyn PokemonRepository>,
        mongo: Option<PokemonDb>,
    ) -> Result<Self, AppError> {
        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port = port,
            backend = ?config.repository.backend,
            base_url = %config.api.base_url,
            "Pokemon service listening"
        );

        Ok(Self {
            port,
            listener,
            state: AppState { config, repo },
            mongo,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn repository(&self) -> Arc<dyn PokemonRepository> {
        self.state.repo.clone()
    }

    /// Serve until `shutdown` resolves, then close the store connection.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);
        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(db) = self.mongo {
            db.close().await;
        }

        result
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }
}
