pub mod pokemons;

pub use pokemons::{
    CreatePokemonRequest, DeletedPokemonResponse, ListParams, Pagination, PokemonListResponse,
    PokemonResponse,
};
