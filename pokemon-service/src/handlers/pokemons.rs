use crate::dtos::{
    CreatePokemonRequest, DeletedPokemonResponse, ListParams, Pagination, PokemonListResponse,
    PokemonResponse,
};
use crate::middleware::{JsonBody, PokemonId};
use crate::models::{PageWindow, PokemonPatch};
use crate::services::record_operation;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

const NOT_FOUND_MESSAGE: &str = "Pokemon not found";

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!(NOT_FOUND_MESSAGE))
}

/// Counts the outcome of one operation and passes the result through.
fn track<T>(operation: &'static str, result: Result<T, AppError>) -> Result<T, AppError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(AppError::NotFound(_)) => "not_found",
        Err(e) if e.status_code().is_client_error() => "rejected",
        Err(_) => "failed",
    };
    record_operation(operation, outcome);
    result
}

#[tracing::instrument(skip(state))]
pub async fn list_pokemons(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PokemonListResponse>, AppError> {
    let result = async {
        let window = PageWindow::from_query(params.page.as_deref());
        let total = state.repo.count().await?;
        let pokemons = state.repo.list(window.skip, window.limit).await?;

        Ok::<_, AppError>(Json(PokemonListResponse {
            pokemons: pokemons.into_iter().map(PokemonResponse::from).collect(),
            pagination: Pagination::new(&window, total),
        }))
    }
    .await;

    track("list", result)
}

#[tracing::instrument(skip(state))]
pub async fn get_pokemon(
    State(state): State<AppState>,
    PokemonId(id): PokemonId,
) -> Result<Json<PokemonResponse>, AppError> {
    let result = async {
        let Some(id) = id else {
            return Err(not_found());
        };

        state
            .repo
            .find_by_id(id)
            .await?
            .map(|pokemon| Json(PokemonResponse::from(pokemon)))
            .ok_or_else(not_found)
    }
    .await;

    track("get", result)
}

#[tracing::instrument(skip(state))]
pub async fn search_pokemon(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PokemonResponse>, AppError> {
    let result = async {
        state
            .repo
            .find_by_name_fragment(&name)
            .await?
            .map(|pokemon| Json(PokemonResponse::from(pokemon)))
            .ok_or_else(not_found)
    }
    .await;

    track("search", result)
}

/// Assigns `max(id) + 1`. Two concurrent creates can race for the same id;
/// the loser is refused by the store's unique index and gets a 400.
#[tracing::instrument(skip(state, request))]
pub async fn create_pokemon(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreatePokemonRequest>,
) -> Result<(StatusCode, Json<PokemonResponse>), AppError> {
    let result = async {
        let next_id = state.repo.find_max_id().await? + 1;
        let pokemon = request.into_pokemon(next_id, &state.config.api.base_url)?;
        let saved = state.repo.insert(pokemon).await?;

        tracing::info!(pokemon_id = saved.id, name = %saved.name.english, "Pokemon created");

        Ok::<_, AppError>((StatusCode::CREATED, Json(PokemonResponse::from(saved))))
    }
    .await
    .map_err(AppError::into_rejected_write);

    track("create", result)
}

#[tracing::instrument(skip(state, patch))]
pub async fn update_pokemon(
    State(state): State<AppState>,
    PokemonId(id): PokemonId,
    JsonBody(patch): JsonBody<PokemonPatch>,
) -> Result<Json<PokemonResponse>, AppError> {
    let result = async {
        let Some(id) = id else {
            return Err(not_found());
        };

        let updated = state
            .repo
            .update_by_id(id, patch)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(pokemon_id = updated.id, "Pokemon updated");

        Ok::<_, AppError>(Json(PokemonResponse::from(updated)))
    }
    .await
    .map_err(AppError::into_rejected_write);

    track("update", result)
}

#[tracing::instrument(skip(state))]
pub async fn delete_pokemon(
    State(state): State<AppState>,
    PokemonId(id): PokemonId,
) -> Result<Json<DeletedPokemonResponse>, AppError> {
    let result = async {
        let Some(id) = id else {
            return Err(not_found());
        };

        let deleted = state.repo.delete_by_id(id).await?.ok_or_else(not_found)?;

        tracing::info!(pokemon_id = deleted.id, "Pokemon deleted");

        Ok::<_, AppError>(Json(DeletedPokemonResponse {
            message: "Pokemon deleted".to_string(),
            pokemon: PokemonResponse::from(deleted),
        }))
    }
    .await;

    track("delete", result)
}
