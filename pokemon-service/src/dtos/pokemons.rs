use crate::models::{
    default_image_url, default_shiny_image_url, PageWindow, Pokemon, PokemonName,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use service_core::error::AppError;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PokemonResponse {
    pub id: i64,
    pub name: PokemonName,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub base: BTreeMap<String, Number>,
    pub image: String,
    #[serde(rename = "shinyImage")]
    pub shiny_image: String,
}

impl From<Pokemon> for PokemonResponse {
    fn from(pokemon: Pokemon) -> Self {
        Self {
            id: pokemon.id,
            name: pokemon.name,
            types: pokemon.types,
            base: pokemon.base,
            image: pokemon.image,
            shiny_image: pokemon.shiny_image,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(window: &PageWindow, total_items: u64) -> Self {
        Self {
            current_page: window.page,
            total_pages: window.total_pages(total_items),
            total_items,
            items_per_page: window.limit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PokemonListResponse {
    pub pokemons: Vec<PokemonResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedPokemonResponse {
    pub message: String,
    pub pokemon: PokemonResponse,
}

/// Create payload. The service assigns `id`; `image`/`shinyImage` are
/// optional and derived from the id when missing or empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePokemonRequest {
    pub name: Option<PokemonName>,
    #[serde(rename = "type")]
    pub types: Option<Vec<String>>,
    pub base: Option<BTreeMap<String, Number>>,
    pub image: Option<String>,
    #[serde(rename = "shinyImage")]
    pub shiny_image: Option<String>,
}

fn required(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("required");
    error.message = Some(Cow::Borrowed(message));
    error
}

impl CreatePokemonRequest {
    /// Build the record to store under `id`. Missing required fields are
    /// reported together, one entry per field.
    pub fn into_pokemon(self, id: i64, base_url: &str) -> Result<Pokemon, AppError> {
        let mut errors = ValidationErrors::new();
        if self.name.is_none() {
            errors.add("name", required("Name is required"));
        }
        if self.types.is_none() {
            errors.add("type", required("At least one type is required"));
        }

        let (Some(name), Some(types)) = (self.name, self.types) else {
            return Err(AppError::ValidationError(errors));
        };

        Ok(Pokemon {
            object_id: None,
            id,
            name,
            types,
            base: self.base.unwrap_or_default(),
            image: self
                .image
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| default_image_url(base_url, id)),
            shiny_image: self
                .shiny_image
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| default_shiny_image_url(base_url, id)),
        })
    }
}
