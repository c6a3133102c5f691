use crate::models::parse_leading_int;
use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use service_core::error::AppError;

/// `:id` path segment, parsed by its leading integer.
///
/// A segment with no integer in front (`/pokemons/abc`) yields `None`,
/// which matches no record.
#[derive(Debug, Clone, Copy)]
pub struct PokemonId(pub Option<i64>);

#[async_trait]
impl<S> FromRequestParts<S> for PokemonId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

        let id = parse_leading_int(&raw);
        tracing::Span::current().record("pokemon_id", id);

        Ok(PokemonId(id))
    }
}
