//! Provider registry - domain models, services, and traits.

mod providers_memory;
mod providers_model;
mod providers_service;
mod providers_traits;

pub use providers_memory::InMemoryProviderRepository;
pub use providers_model::{
    dedupe_services, validate_base_url, validate_name, validate_rate_limit, NewProvider,
    Provider, ProviderFilter, ProviderUpdate, SelectionChange,
};
pub use providers_service::ProviderService;
pub use providers_traits::{ProviderRepositoryTrait, ProviderServiceTrait};
