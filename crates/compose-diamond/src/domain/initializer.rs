//! # Initializer Guard
//!
//! One-shot gate around the proxy's setup routine, modeled as a three-state
//! machine:
//!
//! ```text
//!   Uninitialized --enter(top-level)--> Initializing --exit(top-level)--> Initialized
//!                                          |    ^                            |
//!                                enter(nested) / exit(nested)      enter(construction)
//!                                          no transition             back to Initializing
//! ```
//!
//! Only the outermost scope flips `initializing` back off and yields the
//! version to announce. Any other entry fails with `InvalidInitialization`.

use crate::errors::DiamondError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Version stamped by the one-shot initializer.
pub const INITIAL_VERSION: u64 = 1;

/// Setup lifecycle of the proxy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializationState {
    /// Never initialized (`version == 0`).
    #[default]
    Uninitialized,
    /// A top-level initialization is in progress.
    Initializing {
        /// Version being initialized.
        version: u64,
    },
    /// Setup has completed.
    Initialized {
        /// Version reached.
        version: u64,
    },
}

/// How a guarded scope was entered. Handed back to [`InitializationState::exit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum InitScope {
    /// Outermost scope; owns the `Initializing -> Initialized` transition.
    TopLevel,
    /// Re-entry while already initializing.
    Nested,
}

impl InitializationState {
    /// The initialized version (0 = never initialized).
    #[must_use]
    pub fn version(&self) -> u64 {
        match self {
            Self::Uninitialized => 0,
            Self::Initializing { version } | Self::Initialized { version } => *version,
        }
    }

    /// True only during the dynamic extent of a top-level initialization.
    #[must_use]
    pub fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing { .. })
    }

    /// Enters a guarded scope.
    ///
    /// `in_construction` must be true only while the proxy is still in its
    /// deployment phase (its own code is not yet observable).
    ///
    /// Entering while already `Initializing` is always admitted as a nested
    /// scope, so an initializer may apply a cut whose own initializer is
    /// guarded too.
    ///
    /// # Errors
    ///
    /// `InvalidInitialization` when already initialized outside construction.
    pub fn enter(&mut self, in_construction: bool) -> Result<InitScope, DiamondError> {
        match *self {
            Self::Uninitialized => {
                *self = Self::Initializing {
                    version: INITIAL_VERSION,
                };
                debug!(version = INITIAL_VERSION, "Initializer entered");
                Ok(InitScope::TopLevel)
            }
            Self::Initializing { .. } => Ok(InitScope::Nested),
            Self::Initialized { version } if version == INITIAL_VERSION && in_construction => {
                *self = Self::Initializing { version };
                debug!(version, "Initializer re-entered during construction");
                Ok(InitScope::TopLevel)
            }
            Self::Initialized { .. } => Err(DiamondError::InvalidInitialization),
        }
    }

    /// Leaves a guarded scope.
    ///
    /// Returns the version to announce when the outermost scope completes.
    pub fn exit(&mut self, scope: InitScope) -> Option<u64> {
        match (scope, *self) {
            (InitScope::TopLevel, Self::Initializing { version }) => {
                *self = Self::Initialized { version };
                Some(version)
            }
            _ => None,
        }
    }

    /// Fails unless an initialization is in progress.
    ///
    /// # Errors
    ///
    /// `NotInitializing` outside the extent of an initializer.
    pub fn require_initializing(&self) -> Result<(), DiamondError> {
        if self.is_initializing() {
            Ok(())
        } else {
            Err(DiamondError::NotInitializing)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_setup_path() {
        let mut state = InitializationState::default();
        assert_eq!(state.version(), 0);

        let scope = state.enter(false).unwrap();
        assert_eq!(scope, InitScope::TopLevel);
        assert!(state.is_initializing());
        assert_eq!(state.version(), 1);

        assert_eq!(state.exit(scope), Some(1));
        assert_eq!(state, InitializationState::Initialized { version: 1 });
    }

    #[test]
    fn test_second_top_level_call_rejected() {
        let mut state = InitializationState::default();
        let scope = state.enter(false).unwrap();
        let _ = state.exit(scope);

        assert_eq!(state.enter(false), Err(DiamondError::InvalidInitialization));
        assert_eq!(state.enter(false), Err(DiamondError::InvalidInitialization));
        assert_eq!(state, InitializationState::Initialized { version: 1 });
    }

    #[test]
    fn test_nested_scope_does_not_transition() {
        let mut state = InitializationState::default();
        let outer = state.enter(false).unwrap();
        let inner = state.enter(false).unwrap();
        assert_eq!(inner, InitScope::Nested);

        assert_eq!(state.exit(inner), None);
        assert!(state.is_initializing());

        assert_eq!(state.exit(outer), Some(1));
        assert!(!state.is_initializing());
    }

    #[test]
    fn test_construction_allowance() {
        let mut state = InitializationState::Initialized { version: 1 };
        let scope = state.enter(true).unwrap();
        assert_eq!(scope, InitScope::TopLevel);
        assert_eq!(state.exit(scope), Some(1));

        // Once deployed the allowance no longer applies
        assert_eq!(state.enter(false), Err(DiamondError::InvalidInitialization));
    }

    #[test]
    fn test_require_initializing() {
        let mut state = InitializationState::default();
        assert_eq!(state.require_initializing(), Err(DiamondError::NotInitializing));
        let scope = state.enter(false).unwrap();
        assert!(state.require_initializing().is_ok());
        let _ = state.exit(scope);
        assert_eq!(state.require_initializing(), Err(DiamondError::NotInitializing));
    }
}
