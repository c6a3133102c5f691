#![allow(dead_code)]

use async_trait::async_trait;
use pokemon_service::config::{
    ApiConfig, AssetsConfig, MongoConfig, PokemonConfig, RepositoryBackend, RepositoryConfig,
};
use pokemon_service::models::{
    default_image_url, default_shiny_image_url, Pokemon, PokemonName, PokemonPatch,
};
use pokemon_service::services::{InMemoryPokemonRepository, PokemonDb, PokemonRepository};
use pokemon_service::startup::Application;
use serde_json::Number;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TEST_BASE_URL: &str = "http://pokedex.test";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub repo: Arc<dyn PokemonRepository>,
    pub client: reqwest::Client,
}

pub fn test_config(backend: RepositoryBackend, database: &str) -> PokemonConfig {
    PokemonConfig {
        common: CoreConfig { port: 0 },
        api: ApiConfig {
            base_url: TEST_BASE_URL.to_string(),
        },
        repository: RepositoryConfig { backend },
        mongodb: MongoConfig {
            uri: std::env::var("TEST_MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: database.to_string(),
            collection: "pokemons".to_string(),
        },
        assets: AssetsConfig {
            dir: concat!(env!("CARGO_MANIFEST_DIR"), "/assets").to_string(),
        },
    }
}

pub fn pokemon(id: i64, english: &str, french: &str, japanese: &str) -> Pokemon {
    Pokemon {
        object_id: None,
        id,
        name: PokemonName::new(english, french, japanese),
        types: vec!["Normal".to_string()],
        base: BTreeMap::from([
            ("HP".to_string(), Number::from(50)),
            ("Speed".to_string(), Number::from(60)),
        ]),
        image: default_image_url(TEST_BASE_URL, id),
        shiny_image: default_shiny_image_url(TEST_BASE_URL, id),
    }
}

/// `count` generic records with ids 1..=count.
pub fn numbered(count: i64) -> Vec<Pokemon> {
    (1..=count)
        .map(|id| {
            let name = format!("Mon{:03}", id);
            pokemon(id, &name, &name, &name)
        })
        .collect()
}

pub const STORE_FAILURE: &str = "connection reset";

/// Repository whose every call fails the way an unreachable store does.
pub struct FailingRepository;

fn store_failure<T>() -> Result<T, AppError> {
    Err(AppError::DatabaseError(anyhow::anyhow!(STORE_FAILURE)))
}

#[async_trait]
impl PokemonRepository for FailingRepository {
    async fn count(&self) -> Result<u64, AppError> {
        store_failure()
    }

    async fn list(&self, _skip: u64, _limit: u64) -> Result<Vec<Pokemon>, AppError> {
        store_failure()
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<Pokemon>, AppError> {
        store_failure()
    }

    async fn find_by_name_fragment(&self, _fragment: &str) -> Result<Option<Pokemon>, AppError> {
        store_failure()
    }

    async fn find_max_id(&self) -> Result<i64, AppError> {
        store_failure()
    }

    async fn insert(&self, _pokemon: Pokemon) -> Result<Pokemon, AppError> {
        store_failure()
    }

    async fn update_by_id(
        &self,
        _id: i64,
        _patch: PokemonPatch,
    ) -> Result<Option<Pokemon>, AppError> {
        store_failure()
    }

    async fn delete_by_id(&self, _id: i64) -> Result<Option<Pokemon>, AppError> {
        store_failure()
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Vec::new()).await
    }

    /// In-memory backed app seeded with `records`.
    pub async fn spawn_with(records: Vec<Pokemon>) -> Self {
        Self::spawn_with_repository(Arc::new(InMemoryPokemonRepository::with_records(records)))
            .await
    }

    /// App over a caller-supplied repository, e.g. [`FailingRepository`].
    pub async fn spawn_with_repository(repo: Arc<dyn PokemonRepository>) -> Self {
        let config = test_config(RepositoryBackend::Memory, "unused");

        let app = Application::with_repository(config, repo, None)
            .await
            .expect("Failed to build test application");

        Self::start(app).await
    }

    /// MongoDB backed app on a throwaway database.
    pub async fn spawn_mongo(database: &str) -> Self {
        let config = test_config(RepositoryBackend::Mongo, database);
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        Self::start(app).await
    }

    async fn start(app: Application) -> Self {
        let port = app.port();
        let repo = app.repository();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            repo,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Drop the throwaway database used by `spawn_mongo`.
    pub async fn drop_mongo_database(database: &str) {
        let config = test_config(RepositoryBackend::Mongo, database);
        if let Ok(db) = PokemonDb::connect(&config.mongodb.uri, database, "pokemons").await {
            let _ = db.database().drop(None).await;
        }
    }
}
