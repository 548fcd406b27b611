//! Vendor adapter abstractions and implementations.
//!
//! This module contains:
//! - The `VendorAdapter` trait every vendor integration implements
//! - `VendorKind` with the bundled endpoint templates and credential profiles
//! - Concrete adapters for VTPass, Clubkonnect and generic JSON vendors
//! - `VendorAdapters`, the kind-keyed set the execution layer dispatches through
//!
//! Adapters never see the registry. They receive a [`VendorContext`]
//! snapshot per call, so one adapter instance serves every provider of its
//! kind.

mod http;
mod kind;
mod traits;

pub mod clubkonnect;
pub mod custom;
pub mod vtpass;

use std::collections::HashMap;
use std::sync::Arc;

pub use kind::{required_operations, VendorKind};
pub use traits::{VendorAdapter, VendorContext};

use clubkonnect::ClubKonnectAdapter;
use custom::CustomAdapter;
use vtpass::VtPassAdapter;

/// Adapter lookup keyed by [`VendorKind`].
///
/// `with_defaults` installs the bundled adapters; tests replace entries
/// with mocks through [`insert`](Self::insert).
#[derive(Clone, Default)]
pub struct VendorAdapters {
    adapters: HashMap<VendorKind, Arc<dyn VendorAdapter>>,
}

impl VendorAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.insert(Arc::new(VtPassAdapter::new()));
        set.insert(Arc::new(ClubKonnectAdapter::new()));
        set.insert(Arc::new(CustomAdapter::new()));
        set
    }

    /// Install an adapter under the kind it reports.
    pub fn insert(&mut self, adapter: Arc<dyn VendorAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    /// Install an adapter under an explicit kind.
    pub fn insert_for(&mut self, kind: VendorKind, adapter: Arc<dyn VendorAdapter>) {
        self.adapters.insert(kind, adapter);
    }

    pub fn get(&self, kind: VendorKind) -> Option<Arc<dyn VendorAdapter>> {
        self.adapters.get(&kind).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_kind() {
        let set = VendorAdapters::with_defaults();
        for kind in [VendorKind::VtPass, VendorKind::ClubKonnect, VendorKind::Custom] {
            let adapter = set.get(kind).expect("adapter installed");
            assert_eq!(adapter.kind(), kind);
        }
        assert!(VendorAdapters::new().get(VendorKind::VtPass).is_none());
    }
}
