//! # Domain Services
//!
//! Pure hashing helpers and the well-known identifiers of the diamond core.
//! These functions are deterministic and have no side effects.

use crate::domain::value_objects::{Hash, Selector, StorageNamespace};
use sha3::{Digest, Keccak256};

// =============================================================================
// HASHING
// =============================================================================

/// Computes the keccak256 hash of data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    Hash::new(hash.into())
}

/// Computes the topic of an event signature, e.g. `"Initialized(uint64)"`.
#[must_use]
pub fn event_topic(signature: &str) -> Hash {
    keccak256(signature.as_bytes())
}

// =============================================================================
// WELL-KNOWN SIGNATURES
// =============================================================================

/// Canonical signatures of the functions, events and errors the core speaks.
pub mod signatures {
    /// The batch-cut entrypoint.
    pub const DIAMOND_CUT: &str = "diamondCut((address,uint8,bytes4[])[],address,bytes)";

    /// Emitted once per successful batch cut.
    pub const DIAMOND_CUT_EVENT: &str = "DiamondCut((address,uint8,bytes4[])[],address,bytes)";

    /// Emitted when the top-level initializer completes.
    pub const INITIALIZED_EVENT: &str = "Initialized(uint64)";
}

/// Selector of the built-in batch-cut entrypoint (`0x1f931c1c`).
#[must_use]
pub fn diamond_cut_selector() -> Selector {
    Selector::from_signature(signatures::DIAMOND_CUT)
}

// =============================================================================
// STORAGE NAMESPACES
// =============================================================================

/// Namespace strings of the core's own storage regions.
pub mod namespaces {
    /// Selector registry.
    pub const DIAMOND: &str = "compose.diamond";

    /// Initializer guard state.
    pub const INITIALIZABLE: &str = "compose.initializable";
}

/// Storage region holding the selector registry.
#[must_use]
pub fn diamond_namespace() -> StorageNamespace {
    StorageNamespace::new(namespaces::DIAMOND)
}

/// Storage region holding the initialization state.
#[must_use]
pub fn initializable_namespace() -> StorageNamespace {
    StorageNamespace::new(namespaces::INITIALIZABLE)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_empty() {
        let hash = keccak256(&[]);
        let expected =
            hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                .unwrap();
        assert_eq!(hash.as_bytes().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_diamond_cut_selector() {
        assert_eq!(diamond_cut_selector(), Selector::from_u32(0x1f93_1c1c));
    }

    #[test]
    fn test_namespaces_are_disjoint() {
        assert_ne!(diamond_namespace().id, initializable_namespace().id);
        assert_eq!(diamond_namespace().name, "compose.diamond");
    }

    #[test]
    fn test_event_topic_matches_keccak() {
        assert_eq!(
            event_topic(signatures::INITIALIZED_EVENT),
            keccak256(b"Initialized(uint64)")
        );
    }
}
