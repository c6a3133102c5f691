pub mod page;
pub mod pokemon;

pub use page::{PageWindow, PAGE_SIZE};
pub use pokemon::{
    default_image_url, default_shiny_image_url, parse_leading_int, Pokemon, PokemonName,
    PokemonPatch,
};
