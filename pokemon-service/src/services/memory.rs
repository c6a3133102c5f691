use crate::models::{Pokemon, PokemonPatch};
use crate::services::PokemonRepository;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use validator::Validate;

/// Process-local repository keyed by `id`.
///
/// Same contract as the MongoDB store; used for the `memory` backend and
/// by the HTTP test-suite. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryPokemonRepository {
    records: RwLock<BTreeMap<i64, Pokemon>>,
}

impl InMemoryPokemonRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Pokemon>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

fn matches_fragment(pokemon: &Pokemon, needle: &str) -> bool {
    [
        &pokemon.name.english,
        &pokemon.name.french,
        &pokemon.name.japanese,
    ]
    .iter()
    .any(|name| name.to_lowercase().contains(needle))
}

#[async_trait]
impl PokemonRepository for InMemoryPokemonRepository {
    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.records.read().await.len() as u64)
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<Pokemon>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Pokemon>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<Pokemon>, AppError> {
        let needle = fragment.to_lowercase();
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|pokemon| matches_fragment(pokemon, &needle))
            .cloned())
    }

    async fn find_max_id(&self) -> Result<i64, AppError> {
        let records = self.records.read().await;
        Ok(records.keys().next_back().copied().unwrap_or(0))
    }

    async fn insert(&self, mut pokemon: Pokemon) -> Result<Pokemon, AppError> {
        pokemon.validate()?;

        let mut records = self.records.write().await;
        if records.contains_key(&pokemon.id) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "duplicate key: a pokemon with id {} already exists",
                pokemon.id
            )));
        }
        pokemon.object_id.get_or_insert_with(ObjectId::new);
        records.insert(pokemon.id, pokemon.clone());
        Ok(pokemon)
    }

    async fn update_by_id(
        &self,
        id: i64,
        patch: PokemonPatch,
    ) -> Result<Option<Pokemon>, AppError> {
        patch.validate()?;

        let mut records = self.records.write().await;
        Ok(records.get_mut(&id).map(|pokemon| {
            patch.apply_to(pokemon);
            pokemon.clone()
        }))
    }

    async fn delete_by_id(&self, id: i64) -> Result<Option<Pokemon>, AppError> {
        Ok(self.records.write().await.remove(&id))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{default_image_url, default_shiny_image_url, PokemonName};

    fn pokemon(id: i64, english: &str, french: &str, japanese: &str) -> Pokemon {
        Pokemon {
            object_id: None,
            id,
            name: PokemonName::new(english, french, japanese),
            types: vec!["Normal".to_string()],
            base: BTreeMap::new(),
            image: default_image_url("http://localhost:3000", id),
            shiny_image: default_shiny_image_url("http://localhost:3000", id),
        }
    }

    fn seeded() -> InMemoryPokemonRepository {
        InMemoryPokemonRepository::with_records([
            pokemon(25, "Pikachu", "Pikachu", "ピカチュウ"),
            pokemon(1, "Bulbasaur", "Bulbizarre", "フシギダネ"),
            pokemon(4, "Charmander", "Salamèche", "ヒトカゲ"),
        ])
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let repo = seeded();
        let ids: Vec<i64> = repo.list(0, 20).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4, 25]);

        let window: Vec<i64> = repo.list(1, 1).await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(window, vec![4]);
    }

    #[tokio::test]
    async fn max_id_is_zero_when_empty() {
        assert_eq!(InMemoryPokemonRepository::new().find_max_id().await.unwrap(), 0);
        assert_eq!(seeded().find_max_id().await.unwrap(), 25);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let repo = seeded();
        for fragment in ["pika", "PIKA", "ikach"] {
            let found = repo.find_by_name_fragment(fragment).await.unwrap();
            assert_eq!(found.map(|p| p.id), Some(25), "fragment {:?}", fragment);
        }

        let french = repo.find_by_name_fragment("salamÈ").await.unwrap();
        assert_eq!(french.map(|p| p.id), Some(4));

        let japanese = repo.find_by_name_fragment("フシギ").await.unwrap();
        assert_eq!(japanese.map(|p| p.id), Some(1));

        assert!(repo.find_by_name_fragment("mew").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_and_invalid_records() {
        let repo = seeded();

        let err = repo
            .insert(pokemon(25, "Raichu", "Raichu", "ライチュウ"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));

        let err = repo.insert(pokemon(26, "", "Raichu", "ライチュウ")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn insert_assigns_storage_key() {
        let repo = InMemoryPokemonRepository::new();
        let stored = repo
            .insert(pokemon(1, "Bulbasaur", "Bulbizarre", "フシギダネ"))
            .await
            .unwrap();
        assert!(stored.object_id.is_some());
    }

    #[tokio::test]
    async fn update_and_delete_report_absence() {
        let repo = seeded();
        let patch = PokemonPatch {
            image: Some("https://cdn.example/pika.png".to_string()),
            ..Default::default()
        };

        let updated = repo.update_by_id(25, patch.clone()).await.unwrap().unwrap();
        assert_eq!(updated.image, "https://cdn.example/pika.png");
        assert_eq!(updated.name.english, "Pikachu");

        assert!(repo.update_by_id(999, patch).await.unwrap().is_none());

        let deleted = repo.delete_by_id(25).await.unwrap();
        assert_eq!(deleted.map(|p| p.id), Some(25));
        assert!(repo.find_by_id(25).await.unwrap().is_none());
        assert!(repo.delete_by_id(25).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_validates_before_writing() {
        let repo = seeded();
        let patch = PokemonPatch {
            types: Some(vec![]),
            ..Default::default()
        };

        let err = repo.update_by_id(25, patch).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let unchanged = repo.find_by_id(25).await.unwrap().unwrap();
        assert_eq!(unchanged.types, vec!["Normal"]);
    }
}
