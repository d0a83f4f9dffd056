//! # Facet Host Adapter
//!
//! In-memory address space holding deployed facet code.

use crate::domain::value_objects::Address;
use crate::ports::outbound::{FacetCode, FacetHost};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// In-memory code registry keyed by address.
#[derive(Default)]
pub struct InMemoryFacetHost {
    code: RwLock<HashMap<Address, Arc<dyn FacetCode>>>,
}

impl InMemoryFacetHost {
    /// Create an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `code` at `address`, replacing whatever was there.
    pub fn deploy(&self, address: Address, code: Arc<dyn FacetCode>) {
        debug!(%address, name = code.name(), "Facet code deployed");
        self.code.write().insert(address, code);
    }

    /// Removes the code at `address`. Returns true if there was any.
    pub fn undeploy(&self, address: Address) -> bool {
        self.code.write().remove(&address).is_some()
    }

    /// Number of addresses holding code.
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.read().len()
    }

    /// Returns true if no code is deployed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.read().is_empty()
    }
}

impl FacetHost for InMemoryFacetHost {
    fn code_at(&self, address: Address) -> Option<Arc<dyn FacetCode>> {
        self.code.read().get(&address).cloned()
    }

    fn has_code(&self, address: Address) -> bool {
        self.code.read().contains_key(&address)
    }
}

impl fmt::Debug for InMemoryFacetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code.read();
        f.debug_map()
            .entries(code.iter().map(|(address, facet)| (address, facet.name())))
            .finish()
    }
}
