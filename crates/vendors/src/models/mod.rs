//! Vendor-facing models
//!
//! This module contains the data types shared by every vendor integration:
//! - `types` - Type aliases for common identifiers (ProviderId)
//! - `service` - Service categories a vendor can sell (ServiceCategory)
//! - `operation` - The uniform operation/payload/result shape (VendorOperation, VendorPayload, VendorResult)
//! - `credentials` - Opaque credential bundle with a redacting Debug (VendorCredentials)

mod credentials;
mod operation;
mod service;
mod types;

pub use credentials::VendorCredentials;
pub use operation::{TransactionStatus, VendorOperation, VendorPayload, VendorResult};
pub use service::ServiceCategory;
pub use types::ProviderId;
