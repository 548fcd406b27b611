//! Commission pricing - global tiers per service plus per-network and
//! per-disco overrides.

mod commission_memory;
mod commission_model;
mod commission_service;
mod commission_traits;

pub use commission_memory::InMemoryCommissionRepository;
pub use commission_model::{
    compute_price, max_rate, normalize_key, pass_through, CommissionConfig, CommissionRateInput,
    CommissionTier, PriceQuote,
};
pub use commission_service::CommissionService;
pub use commission_traits::{CommissionRepositoryTrait, CommissionServiceTrait};
