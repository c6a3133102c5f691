pub mod json_body;
pub mod pokemon_id;

pub use json_body::JsonBody;
pub use pokemon_id::PokemonId;
