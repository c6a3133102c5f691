use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use service_core::error::AppError;
use std::collections::BTreeMap;
use validator::Validate;

/// Language-labelled display names. Languages beyond the three required
/// ones are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct PokemonName {
    #[validate(length(min = 1, message = "English name cannot be empty"))]
    pub english: String,
    #[validate(length(min = 1, message = "French name cannot be empty"))]
    pub french: String,
    #[validate(length(min = 1, message = "Japanese name cannot be empty"))]
    pub japanese: String,
    #[serde(flatten)]
    pub other: BTreeMap<String, String>,
}

impl PokemonName {
    pub fn new(english: &str, french: &str, japanese: &str) -> Self {
        Self {
            english: english.to_string(),
            french: french.to_string(),
            japanese: japanese.to_string(),
            other: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Pokemon {
    /// Storage key. Never exposed to clients; `id` is the public identifier.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    #[validate(range(min = 1, message = "id must be a positive integer"))]
    pub id: i64,
    #[validate(nested)]
    pub name: PokemonName,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "At least one type is required"))]
    pub types: Vec<String>,
    #[serde(default)]
    pub base: BTreeMap<String, Number>,
    #[serde(default)]
    #[validate(length(min = 1, message = "image cannot be empty"))]
    pub image: String,
    #[serde(rename = "shinyImage", default)]
    #[validate(length(min = 1, message = "shinyImage cannot be empty"))]
    pub shiny_image: String,
}

pub fn default_image_url(base_url: &str, id: i64) -> String {
    format!("{}/assets/pokemons/{}.png", base_url, id)
}

pub fn default_shiny_image_url(base_url: &str, id: i64) -> String {
    format!("{}/assets/pokemons/shiny/{}.png", base_url, id)
}

/// Field overwrites for an update. Absent fields are kept; `id` is not
/// part of the payload, so identity can never be reassigned.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PokemonPatch {
    #[serde(default, deserialize_with = "reject_null")]
    #[validate(nested)]
    pub name: Option<PokemonName>,
    #[serde(rename = "type", default, deserialize_with = "reject_null")]
    #[validate(length(min = 1, message = "At least one type is required"))]
    pub types: Option<Vec<String>>,
    #[serde(default, deserialize_with = "reject_null")]
    pub base: Option<BTreeMap<String, Number>>,
    #[serde(default, deserialize_with = "reject_null")]
    #[validate(length(min = 1, message = "image cannot be empty"))]
    pub image: Option<String>,
    #[serde(rename = "shinyImage", default, deserialize_with = "reject_null")]
    #[validate(length(min = 1, message = "shinyImage cannot be empty"))]
    pub shiny_image: Option<String>,
}

impl PokemonPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.types.is_none()
            && self.base.is_none()
            && self.image.is_none()
            && self.shiny_image.is_none()
    }

    pub fn apply_to(&self, pokemon: &mut Pokemon) {
        if let Some(name) = &self.name {
            pokemon.name = name.clone();
        }
        if let Some(types) = &self.types {
            pokemon.types = types.clone();
        }
        if let Some(base) = &self.base {
            pokemon.base = base.clone();
        }
        if let Some(image) = &self.image {
            pokemon.image = image.clone();
        }
        if let Some(shiny_image) = &self.shiny_image {
            pokemon.shiny_image = shiny_image.clone();
        }
    }

    /// Body of a `$set` update holding only the provided fields.
    pub fn to_set_document(&self) -> Result<Document, AppError> {
        let mut set = Document::new();
        if let Some(name) = &self.name {
            set.insert("name", to_bson(name)?);
        }
        if let Some(types) = &self.types {
            set.insert("type", to_bson(types)?);
        }
        if let Some(base) = &self.base {
            set.insert("base", to_bson(base)?);
        }
        if let Some(image) = &self.image {
            set.insert("image", image.as_str());
        }
        if let Some(shiny_image) = &self.shiny_image {
            set.insert("shinyImage", shiny_image.as_str());
        }
        Ok(set)
    }
}

fn to_bson<T: Serialize>(value: &T) -> Result<bson::Bson, AppError> {
    bson::to_bson(value).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to serialize update: {}", e))
    })
}

/// Absent means "leave unchanged"; an explicit `null` would erase a
/// required field, so it is refused at parse time.
fn reject_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)?
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom("required field cannot be null"))
}

/// Leading-integer parse: optional whitespace and sign, then digits.
/// Anything after the digits is ignored; no digits yields `None`.
/// Decimal only: `"0x1A"` is 0, not 26.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }
    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}
