//! SQLite storage implementation for the provider registry.

mod model;
mod repository;

pub use model::{ProviderChangesetDB, ProviderDB, SelectionDB};
pub use repository::ProviderRepository;
