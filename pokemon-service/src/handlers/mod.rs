pub mod health;
pub mod pokemons;

pub use health::{health_check, index, metrics_endpoint, readiness_check};
pub use pokemons::{
    create_pokemon, delete_pokemon, get_pokemon, list_pokemons, search_pokemon, update_pokemon,
};
