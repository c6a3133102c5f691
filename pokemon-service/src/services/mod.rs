pub mod database;
pub mod memory;
pub mod metrics;
pub mod repository;

pub use database::{name_fragment_filter, PokemonDb};
pub use memory::InMemoryPokemonRepository;
pub use metrics::{get_metrics, init_metrics, record_operation};
pub use repository::PokemonRepository;
