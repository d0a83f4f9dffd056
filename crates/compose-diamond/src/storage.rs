//! # Facet Storage
//!
//! Typed, namespaced state shared by every facet of one proxy.
//!
//! Each storage struct declares a namespace string; its region id is the
//! keccak-256 hash of that string. A region holds exactly one Rust type, so
//! two facets that agree on a namespace share state, and two facets that
//! disagree on the type behind a namespace fail loudly instead of
//! corrupting each other's fields.
//!
//! The core's own regions (`compose.diamond`, `compose.initializable`) are
//! reserved and cannot be claimed by facets.

use crate::domain::services::namespaces;
use crate::domain::value_objects::{Hash, StorageNamespace};
use crate::errors::DiamondError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// A state struct living in its own namespaced region.
///
/// ```ignore
/// #[derive(Clone, Default)]
/// struct CounterStorage { value: u64 }
///
/// impl Namespaced for CounterStorage {
///     const NAMESPACE: &'static str = "compose.counter";
/// }
/// ```
pub trait Namespaced: Any + Clone + Default + Send + Sync {
    /// Human-readable namespace; hashed into the region id.
    const NAMESPACE: &'static str;

    /// The namespace with its derived id.
    #[must_use]
    fn namespace() -> StorageNamespace {
        StorageNamespace::new(Self::NAMESPACE)
    }
}

trait RegionValue: Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn RegionValue>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone + Send + Sync> RegionValue for T {
    fn clone_box(&self) -> Box<dyn RegionValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Region {
    namespace: StorageNamespace,
    type_id: TypeId,
    value: Box<dyn RegionValue>,
}

impl Clone for Region {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace,
            type_id: self.type_id,
            value: self.value.clone_box(),
        }
    }
}

/// All facet-owned regions of one proxy.
#[derive(Clone, Default)]
pub struct FacetStorage {
    regions: HashMap<Hash, Region>,
}

impl FacetStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the region of `T`, if it was ever written.
    ///
    /// # Errors
    ///
    /// `StorageNamespaceCollision` if the namespace is reserved or holds
    /// another type.
    pub fn get<T: Namespaced>(&self) -> Result<Option<&T>, DiamondError> {
        let namespace = Self::claimable::<T>()?;
        match self.regions.get(&namespace.id) {
            None => Ok(None),
            Some(region) => region
                .value
                .as_any()
                .downcast_ref::<T>()
                .map(Some)
                .ok_or_else(|| collision(namespace)),
        }
    }

    /// Mutable access to the region of `T`, created with `T::default()` on
    /// first use.
    ///
    /// # Errors
    ///
    /// `StorageNamespaceCollision` if the namespace is reserved or holds
    /// another type.
    pub fn get_mut<T: Namespaced>(&mut self) -> Result<&mut T, DiamondError> {
        let namespace = Self::claimable::<T>()?;
        let region = self.regions.entry(namespace.id).or_insert_with(|| Region {
            namespace,
            type_id: TypeId::of::<T>(),
            value: Box::new(T::default()),
        });
        if region.type_id != TypeId::of::<T>() {
            return Err(collision(namespace));
        }
        region
            .value
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| collision(namespace))
    }

    /// Number of regions in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns true if no region was ever written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Namespaces in use, unordered.
    pub fn namespaces(&self) -> impl Iterator<Item = StorageNamespace> + '_ {
        self.regions.values().map(|r| r.namespace)
    }

    fn claimable<T: Namespaced>() -> Result<StorageNamespace, DiamondError> {
        let namespace = T::namespace();
        if is_reserved(namespace.name) {
            return Err(collision(namespace));
        }
        Ok(namespace)
    }
}

impl fmt::Debug for FacetStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.namespaces()).finish()
    }
}

fn is_reserved(name: &str) -> bool {
    name == namespaces::DIAMOND || name == namespaces::INITIALIZABLE
}

fn collision(namespace: StorageNamespace) -> DiamondError {
    DiamondError::StorageNamespaceCollision {
        namespace: namespace.name,
        id: namespace.id,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Counter {
        value: u64,
    }

    impl Namespaced for Counter {
        const NAMESPACE: &'static str = "test.counter";
    }

    #[derive(Clone, Default)]
    struct Impostor {
        _other: String,
    }

    impl Namespaced for Impostor {
        const NAMESPACE: &'static str = "test.counter";
    }

    #[derive(Clone, Default)]
    struct Squatter;

    impl Namespaced for Squatter {
        const NAMESPACE: &'static str = "compose.diamond";
    }

    #[test]
    fn test_lazy_default_and_mutation() {
        let mut storage = FacetStorage::new();
        assert!(storage.get::<Counter>().unwrap().is_none());

        storage.get_mut::<Counter>().unwrap().value = 7;
        assert_eq!(storage.get::<Counter>().unwrap().unwrap().value, 7);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_clone_is_a_snapshot() {
        let mut storage = FacetStorage::new();
        storage.get_mut::<Counter>().unwrap().value = 1;
        let snapshot = storage.clone();

        storage.get_mut::<Counter>().unwrap().value = 2;
        assert_eq!(snapshot.get::<Counter>().unwrap().unwrap().value, 1);
    }

    #[test]
    fn test_type_collision_detected() {
        let mut storage = FacetStorage::new();
        storage.get_mut::<Counter>().unwrap();
        assert!(matches!(
            storage.get_mut::<Impostor>(),
            Err(DiamondError::StorageNamespaceCollision {
                namespace: "test.counter",
                ..
            })
        ));
        assert!(storage.get::<Impostor>().is_err());
    }

    #[test]
    fn test_reserved_namespace_rejected() {
        let mut storage = FacetStorage::new();
        assert!(storage.get_mut::<Squatter>().is_err());
        assert!(storage.is_empty());
    }
}
