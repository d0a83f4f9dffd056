//! # Domain Invariants
//!
//! Registry invariants that MUST hold after every successful cut batch.
//!
//! - Uniqueness: a selector appears at most once in the ordered list.
//! - Dense list: the list length equals the number of registered selectors.
//! - Back-pointers: `selectors[entry(s).position] == s` for every registered `s`.
//! - No null facets: a registered entry never points at the zero address.

use crate::domain::registry::SelectorRegistry;
use crate::domain::value_objects::Selector;
use std::collections::HashSet;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// No selector appears twice in the ordered list.
#[must_use]
pub fn check_uniqueness_invariant(registry: &SelectorRegistry) -> Option<InvariantViolation> {
    let mut seen = HashSet::with_capacity(registry.len());
    registry
        .selectors()
        .iter()
        .find(|s| !seen.insert(**s))
        .map(|s| InvariantViolation::DuplicateSelector(*s))
}

/// Every listed selector has an entry whose position points back at it.
#[must_use]
pub fn check_back_pointer_invariant(registry: &SelectorRegistry) -> Vec<InvariantViolation> {
    registry
        .selectors()
        .iter()
        .enumerate()
        .filter_map(|(index, selector)| match registry.entry(*selector) {
            None => Some(InvariantViolation::MissingEntry(*selector)),
            Some(entry) if entry.position != index => Some(InvariantViolation::PositionMismatch {
                selector: *selector,
                listed_at: index,
                recorded: entry.position,
            }),
            Some(entry) if entry.facet.is_zero() => {
                Some(InvariantViolation::NullFacet(*selector))
            }
            Some(_) => None,
        })
        .collect()
}

/// The list holds exactly the registered selectors.
#[must_use]
pub fn check_dense_list_invariant(registry: &SelectorRegistry) -> bool {
    registry
        .selectors()
        .iter()
        .filter(|s| registry.lookup(**s).is_some())
        .count()
        == registry.len()
}

/// Check all invariants at once.
#[must_use]
pub fn check_all_invariants(registry: &SelectorRegistry) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if let Some(violation) = check_uniqueness_invariant(registry) {
        violations.push(violation);
    }

    violations.extend(check_back_pointer_invariant(registry));

    if !check_dense_list_invariant(registry) {
        violations.push(InvariantViolation::ListNotDense {
            listed: registry.len(),
        });
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Selector listed more than once.
    DuplicateSelector(Selector),
    /// Selector listed without a registry entry.
    MissingEntry(Selector),
    /// Entry's recorded position disagrees with the list.
    PositionMismatch {
        selector: Selector,
        listed_at: usize,
        recorded: usize,
    },
    /// Entry points at the zero address.
    NullFacet(Selector),
    /// List contains unregistered selectors.
    ListNotDense { listed: usize },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSelector(s) => write!(f, "selector {s} listed more than once"),
            Self::MissingEntry(s) => write!(f, "selector {s} listed without an entry"),
            Self::PositionMismatch {
                selector,
                listed_at,
                recorded,
            } => write!(
                f,
                "selector {selector} listed at {listed_at} but recorded at {recorded}"
            ),
            Self::NullFacet(s) => write!(f, "selector {s} points at the zero address"),
            Self::ListNotDense { listed } => {
                write!(f, "selector list of {listed} holds unregistered selectors")
            }
        }
    }
}

// =============================================================================
// LIMIT CONSTANTS
// =============================================================================

/// Hard limits of the diamond core.
pub mod limits {
    /// Maximum nesting of calls back into the proxy.
    pub const MAX_CALL_DEPTH: u16 = 1024;

    /// Maximum registered selectors (capacity of a 16-bit position index).
    pub const MAX_SELECTORS: usize = 1 << 16;

    /// Default time a request may wait for the proxy, in milliseconds.
    pub const REQUEST_TIMEOUT_MS: u64 = 5_000;
}

// =============================================================================
// TESTS
// =============================================================================
