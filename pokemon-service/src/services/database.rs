use crate::models::{Pokemon, PokemonPatch};
use crate::services::PokemonRepository;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{
        FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions, ReturnDocument,
    },
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use validator::Validate;

#[derive(Clone)]
pub struct PokemonDb {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl PokemonDb {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for pokemon-service");

        // Public identifier: lookups, max-id probe and sort all go through it
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name("id_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.pokemons()
            .create_index(id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create id index on {}: {}", self.collection, e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on {}.id", self.collection);

        Ok(())
    }

    pub fn pokemons(&self) -> Collection<Pokemon> {
        self.db.collection(&self.collection)
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ends the connection pool. Dropping the last handle has the same
    /// effect at process exit; this makes teardown explicit.
    pub async fn close(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB connection closed");
    }
}

/// `$or` filter matching `fragment` as a literal, case-insensitive
/// substring of any of the three language names.
pub fn name_fragment_filter(fragment: &str) -> Document {
    let pattern = regex::escape(&fragment.to_lowercase());
    doc! {
        "$or": [
            { "name.english": { "$regex": pattern.as_str(), "$options": "i" } },
            { "name.french": { "$regex": pattern.as_str(), "$options": "i" } },
            { "name.japanese": { "$regex": pattern.as_str(), "$options": "i" } },
        ]
    }
}

#[async_trait]
impl PokemonRepository for PokemonDb {
    async fn count(&self) -> Result<u64, AppError> {
        self.pokemons()
            .count_documents(doc! {}, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count pokemons: {}", e);
                AppError::from(e)
            })
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<Pokemon>, AppError> {
        let find_options = FindOptions::builder()
            .sort(doc! { "id": 1 })
            .skip(skip)
            .limit(limit as i64)
            .build();

        let cursor = self
            .pokemons()
            .find(doc! {}, find_options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list pokemons: {}", e);
                AppError::from(e)
            })?;

        cursor.try_collect().await.map_err(|e| {
            tracing::error!("Failed to collect pokemons: {}", e);
            AppError::from(e)
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Pokemon>, AppError> {
        self.pokemons()
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find pokemon {}: {}", id, e);
                AppError::from(e)
            })
    }

    async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<Pokemon>, AppError> {
        self.pokemons()
            .find_one(name_fragment_filter(fragment), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to search pokemon by name: {}", e);
                AppError::from(e)
            })
    }

    async fn find_max_id(&self) -> Result<i64, AppError> {
        let options = FindOneOptions::builder().sort(doc! { "id": -1 }).build();
        let last = self
            .pokemons()
            .find_one(doc! {}, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find highest pokemon id: {}", e);
                AppError::from(e)
            })?;
        Ok(last.map(|p| p.id).unwrap_or(0))
    }

    async fn insert(&self, mut pokemon: Pokemon) -> Result<Pokemon, AppError> {
        pokemon.validate()?;

        let result = self
            .pokemons()
            .insert_one(&pokemon, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert pokemon {}: {}", pokemon.id, e);
                AppError::from(e)
            })?;
        pokemon.object_id = result.inserted_id.as_object_id();

        Ok(pokemon)
    }

    async fn update_by_id(
        &self,
        id: i64,
        patch: PokemonPatch,
    ) -> Result<Option<Pokemon>, AppError> {
        patch.validate()?;

        // `$set` refuses an empty document
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let set = patch.to_set_document()?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.pokemons()
            .find_one_and_update(doc! { "id": id }, doc! { "$set": set }, options)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update pokemon {}: {}", id, e);
                AppError::from(e)
            })
    }

    async fn delete_by_id(&self, id: i64) -> Result<Option<Pokemon>, AppError> {
        self.pokemons()
            .find_one_and_delete(doc! { "id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete pokemon {}: {}", id, e);
                AppError::from(e)
            })
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_filter_covers_all_languages() {
        let filter = name_fragment_filter("PIKA");
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 3);

        let english = clauses[0].as_document().unwrap();
        let condition = english.get_document("name.english").unwrap();
        assert_eq!(condition.get_str("$regex").unwrap(), "pika");
        assert_eq!(condition.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn name_filter_treats_input_as_literal_text() {
        let filter = name_fragment_filter("mr. mime (");
        let clause = filter.get_array("$or").unwrap()[1].as_document().unwrap();
        let pattern = clause
            .get_document("name.french")
            .unwrap()
            .get_str("$regex")
            .unwrap();
        assert_eq!(pattern, r"mr\. mime \(");
    }
}
