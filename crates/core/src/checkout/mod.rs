//! Checkout facade over pricing, routing and execution.

mod checkout_model;
mod checkout_service;

pub use checkout_model::{CheckoutRequest, CheckoutResult, ProviderUsed};
pub use checkout_service::CheckoutService;
