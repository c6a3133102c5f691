use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_production};
use service_core::error::AppError;
use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Deserialize)]
pub struct PokemonConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub api: ApiConfig,
    pub repository: RepositoryConfig,
    pub mongodb: MongoConfig,
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root used to synthesize default `image`/`shinyImage` links.
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    pub backend: RepositoryBackend,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
    pub dir: String,
}

impl PokemonConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        let backend: RepositoryBackend = get_env("REPOSITORY_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The in-memory backend never dials out, so a URI is only mandatory for mongo.
        let uri = match backend {
            RepositoryBackend::Mongo => get_env("MONGODB_URI", None, is_prod)?,
            RepositoryBackend::Memory => env::var("MONGODB_URI").unwrap_or_default(),
        };

        Ok(PokemonConfig {
            common: common_config,
            api: ApiConfig {
                base_url: normalize_base_url(&get_env("API_URL", Some(DEFAULT_BASE_URL), is_prod)?),
            },
            repository: RepositoryConfig { backend },
            mongodb: MongoConfig {
                uri,
                database: get_env("MONGODB_DATABASE", Some("pokedex"), is_prod)?,
                collection: get_env("MONGODB_COLLECTION", Some("pokemons"), is_prod)?,
            },
            assets: AssetsConfig {
                dir: get_env("ASSETS_DIR", Some("assets"), is_prod)?,
            },
        })
    }
}

impl std::str::FromStr for RepositoryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(RepositoryBackend::Mongo),
            "memory" => Ok(RepositoryBackend::Memory),
            _ => Err(format!("Invalid repository backend: {}", s)),
        }
    }
}

/// Drops trailing slashes so `{base}/assets/...` never doubles up.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}
