//! # Selector Registry
//!
//! Single source of truth mapping selectors to facets.
//!
//! Two indexes are kept in lockstep on every mutation:
//! - `facet_and_position`: selector -> (facet, position)
//! - `selectors`: dense list, `selectors[position] == selector`
//!
//! `insert` only ever appends. `remove` fills the vacated slot with the last
//! selector (swap-and-pop), so removal is O(1) and never leaves gaps.

use crate::domain::entities::{Facet, SelectorEntry};
use crate::domain::value_objects::{Address, Selector};
use crate::errors::RegistryError;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FacetAndPosition {
    facet: Address,
    position: usize,
}

/// Selector -> facet mapping with a dense, swap-and-pop ordered list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorRegistry {
    facet_and_position: HashMap<Selector, FacetAndPosition>,
    selectors: Vec<Selector>,
}

impl SelectorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Facet registered for `selector`, or `None` when unregistered.
    #[must_use]
    pub fn lookup(&self, selector: Selector) -> Option<Address> {
        self.facet_and_position
            .get(&selector)
            .map(|entry| entry.facet)
            .filter(|facet| !facet.is_zero())
    }

    /// Full record for `selector`.
    #[must_use]
    pub fn entry(&self, selector: Selector) -> Option<SelectorEntry> {
        self.facet_and_position
            .get(&selector)
            .map(|entry| SelectorEntry {
                selector,
                facet: entry.facet,
                position: entry.position,
            })
    }

    /// Registers `selector -> facet` at `position`.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if the selector already has a facet
    /// - `NullFacet` if `facet` is the zero address
    /// - `PositionMismatch` unless `position` equals the current length
    pub fn insert(
        &mut self,
        selector: Selector,
        facet: Address,
        position: usize,
    ) -> Result<(), RegistryError> {
        if self.lookup(selector).is_some() {
            return Err(RegistryError::AlreadyRegistered(selector));
        }
        if facet.is_zero() {
            return Err(RegistryError::NullFacet(selector));
        }
        if position != self.selectors.len() {
            return Err(RegistryError::PositionMismatch {
                expected: self.selectors.len(),
                actual: position,
            });
        }

        self.facet_and_position
            .insert(selector, FacetAndPosition { facet, position });
        self.selectors.push(selector);
        Ok(())
    }

    /// Points an existing selector at `new_facet`, leaving its position alone.
    ///
    /// Returns the previous facet.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if the selector has no entry; `NullFacet` if
    /// `new_facet` is the zero address.
    pub fn update_facet(
        &mut self,
        selector: Selector,
        new_facet: Address,
    ) -> Result<Address, RegistryError> {
        if new_facet.is_zero() {
            return Err(RegistryError::NullFacet(selector));
        }
        let entry = self
            .facet_and_position
            .get_mut(&selector)
            .ok_or(RegistryError::NotRegistered(selector))?;
        Ok(std::mem::replace(&mut entry.facet, new_facet))
    }

    /// Deletes the entry for `selector`, moving the last selector into the
    /// vacated slot.
    ///
    /// # Errors
    ///
    /// `NotRegistered` if the selector has no entry.
    pub fn remove(&mut self, selector: Selector) -> Result<SelectorEntry, RegistryError> {
        let removed = self
            .facet_and_position
            .remove(&selector)
            .ok_or(RegistryError::NotRegistered(selector))?;

        let last_position = self.selectors.len() - 1;
        if removed.position != last_position {
            let last_selector = self.selectors[last_position];
            self.selectors[removed.position] = last_selector;
            if let Some(moved) = self.facet_and_position.get_mut(&last_selector) {
                moved.position = removed.position;
            }
        }
        self.selectors.pop();

        Ok(SelectorEntry {
            selector,
            facet: removed.facet,
            position: removed.position,
        })
    }

    // -------------------------------------------------------------------------
    // Loupe reads
    // -------------------------------------------------------------------------

    /// The ordered selector list.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Number of registered selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Iterates entries in list order.
    pub fn entries(&self) -> impl Iterator<Item = SelectorEntry> + '_ {
        self.selectors.iter().filter_map(|s| self.entry(*s))
    }

    /// Facets with their selectors, in first-seen order of the selector list.
    #[must_use]
    pub fn facets(&self) -> Vec<Facet> {
        let mut facets: Vec<Facet> = Vec::new();
        let mut index: HashMap<Address, usize> = HashMap::new();

        for entry in self.entries() {
            let slot = *index.entry(entry.facet).or_insert_with(|| {
                facets.push(Facet {
                    facet_address: entry.facet,
                    function_selectors: Vec::new(),
                });
                facets.len() - 1
            });
            facets[slot].function_selectors.push(entry.selector);
        }

        facets
    }

    /// Distinct facet addresses, in first-seen order.
    #[must_use]
    pub fn facet_addresses(&self) -> Vec<Address> {
        self.facets().into_iter().map(|f| f.facet_address).collect()
    }

    /// Selectors routed to `facet`, in list order.
    #[must_use]
    pub fn facet_function_selectors(&self, facet: Address) -> Vec<Selector> {
        self.entries()
            .filter(|e| e.facet == facet)
            .map(|e| e.selector)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(v: u32) -> Selector {
        Selector::from_u32(v)
    }

    fn facet(b: u8) -> Address {
        Address::from_low_u8(b)
    }

    fn registry_with(selectors: &[u32], f: Address) -> SelectorRegistry {
        let mut reg = SelectorRegistry::new();
        for s in selectors {
            let pos = reg.len();
            reg.insert(sel(*s), f, pos).unwrap();
        }
        reg
    }

    #[test]
    fn test_insert_and_lookup() {
        let reg = registry_with(&[0xaaaa_aaaa, 0xbbbb_bbbb], facet(1));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.lookup(sel(0xaaaa_aaaa)), Some(facet(1)));
        assert_eq!(reg.lookup(sel(0xcccc_cccc)), None);
        assert_eq!(reg.entry(sel(0xbbbb_bbbb)).unwrap().position, 1);
    }

    #[test]
    fn test_insert_rejects_duplicate() {
        let mut reg = registry_with(&[1], facet(1));
        assert_eq!(
            reg.insert(sel(1), facet(2), 1),
            Err(RegistryError::AlreadyRegistered(sel(1)))
        );
        assert_eq!(reg.lookup(sel(1)), Some(facet(1)));
    }

    #[test]
    fn test_insert_only_appends() {
        let mut reg = registry_with(&[1], facet(1));
        assert_eq!(
            reg.insert(sel(2), facet(1), 0),
            Err(RegistryError::PositionMismatch {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_update_facet_keeps_position() {
        let mut reg = registry_with(&[1, 2], facet(1));
        let old = reg.update_facet(sel(1), facet(2)).unwrap();
        assert_eq!(old, facet(1));
        assert_eq!(reg.lookup(sel(1)), Some(facet(2)));
        assert_eq!(reg.entry(sel(1)).unwrap().position, 0);
        assert_eq!(
            reg.update_facet(sel(9), facet(2)),
            Err(RegistryError::NotRegistered(sel(9)))
        );
    }

    #[test]
    fn test_remove_last() {
        let mut reg = registry_with(&[1, 2], facet(1));
        reg.remove(sel(2)).unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.lookup(sel(2)), None);
        assert_eq!(reg.selectors(), &[sel(1)]);
    }

    #[test]
    fn test_remove_first_swaps_last_into_place() {
        let mut reg = registry_with(&[1, 2, 3], facet(1));
        let removed = reg.remove(sel(1)).unwrap();
        assert_eq!(removed.position, 0);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.selectors()[0], sel(3));
        assert_eq!(reg.entry(sel(3)).unwrap().position, 0);
        assert_eq!(reg.entry(sel(2)).unwrap().position, 1);
    }

    #[test]
    fn test_add_then_remove_restores_previous_state() {
        let before = registry_with(&[1, 2, 3], facet(1));
        let mut reg = before.clone();
        let pos = reg.len();
        reg.insert(sel(4), facet(2), pos).unwrap();
        reg.remove(sel(4)).unwrap();
        assert_eq!(reg, before);
    }

    #[test]
    fn test_loupe_groups_by_facet_in_first_seen_order() {
        let mut reg = SelectorRegistry::new();
        reg.insert(sel(1), facet(2), 0).unwrap();
        reg.insert(sel(2), facet(1), 1).unwrap();
        reg.insert(sel(3), facet(2), 2).unwrap();

        assert_eq!(reg.facet_addresses(), vec![facet(2), facet(1)]);
        assert_eq!(reg.facet_function_selectors(facet(2)), vec![sel(1), sel(3)]);

        let facets = reg.facets();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[1].function_selectors, vec![sel(2)]);
    }
}
