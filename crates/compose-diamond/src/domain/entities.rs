//! # Core Domain Entities
//!
//! Commands, registry records, events and configuration of the diamond core.

use crate::domain::abi::{self, Token};
use crate::domain::services::{event_topic, signatures};
use crate::domain::value_objects::{Address, Bytes, Hash, Selector, U256};
use crate::errors::AbiError;
use serde::{Deserialize, Serialize};

// =============================================================================
// FACET CUT (command)
// =============================================================================

/// The mutation a [`FacetCut`] requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FacetCutAction {
    /// Register new selectors.
    Add = 0,
    /// Point existing selectors at another facet.
    Replace = 1,
    /// Unregister selectors.
    Remove = 2,
}

impl TryFrom<u8> for FacetCutAction {
    type Error = AbiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Add),
            1 => Ok(Self::Replace),
            2 => Ok(Self::Remove),
            other => Err(AbiError::InvalidCutAction(other)),
        }
    }
}

/// A single requested registry mutation.
///
/// Ephemeral: it only exists for the duration of one cut batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCut {
    /// Facet the selectors should point at (zero for `Remove`).
    pub facet_address: Address,
    /// Requested action.
    pub action: FacetCutAction,
    /// Selectors the action applies to.
    pub function_selectors: Vec<Selector>,
}

impl FacetCut {
    /// An `Add` cut.
    #[must_use]
    pub fn add(facet: Address, selectors: Vec<Selector>) -> Self {
        Self {
            facet_address: facet,
            action: FacetCutAction::Add,
            function_selectors: selectors,
        }
    }

    /// A `Replace` cut.
    #[must_use]
    pub fn replace(facet: Address, selectors: Vec<Selector>) -> Self {
        Self {
            facet_address: facet,
            action: FacetCutAction::Replace,
            function_selectors: selectors,
        }
    }

    /// A `Remove` cut. The facet address is the zero address by convention.
    #[must_use]
    pub fn remove(selectors: Vec<Selector>) -> Self {
        Self {
            facet_address: Address::ZERO,
            action: FacetCutAction::Remove,
            function_selectors: selectors,
        }
    }

    /// A `Remove` cut naming an explicit facet address.
    ///
    /// Only the zero address is accepted by the cut processor; anything else
    /// is rejected with `RemoveFacetAddressMustBeZeroAddress`.
    #[must_use]
    pub fn remove_from(facet: Address, selectors: Vec<Selector>) -> Self {
        Self {
            facet_address: facet,
            action: FacetCutAction::Remove,
            function_selectors: selectors,
        }
    }
}

// =============================================================================
// REGISTRY RECORDS
// =============================================================================

/// One registered function selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorEntry {
    /// The dispatch key.
    pub selector: Selector,
    /// Facet implementing it.
    pub facet: Address,
    /// Index into the ordered selector list.
    pub position: usize,
}

/// A facet together with the selectors currently routed to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// Facet address.
    pub facet_address: Address,
    /// Selectors in registry order.
    pub function_selectors: Vec<Selector>,
}

// =============================================================================
// MESSAGE
// =============================================================================

/// An incoming call as seen by the proxy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Immediate caller.
    pub caller: Address,
    /// Value attached to the call.
    pub value: U256,
    /// Full call payload, selector included.
    pub calldata: Bytes,
}

impl Message {
    /// A call carrying `calldata` and no value.
    #[must_use]
    pub fn new(caller: Address, calldata: impl Into<Bytes>) -> Self {
        Self {
            caller,
            value: U256::zero(),
            calldata: calldata.into(),
        }
    }

    /// A bare value transfer with no payload.
    #[must_use]
    pub fn transfer(caller: Address, value: U256) -> Self {
        Self {
            caller,
            value,
            calldata: Bytes::new(),
        }
    }

    /// Selector of the payload (zero-padded if shorter than four bytes).
    #[must_use]
    pub fn selector(&self) -> Selector {
        Selector::from_calldata(self.calldata.as_slice())
    }

    /// Returns true for a bare value transfer.
    #[must_use]
    pub fn is_transfer(&self) -> bool {
        self.calldata.is_empty()
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Notifications emitted by the core.
///
/// Events are journaled with the enclosing unit of work: a reverted call
/// emits nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiamondEvent {
    /// A cut batch was applied.
    DiamondCut {
        /// The full cut list, in submission order.
        cuts: Vec<FacetCut>,
        /// Initializer target (zero when none).
        init: Address,
        /// Initializer payload.
        calldata: Bytes,
    },
    /// The top-level initializer completed.
    Initialized {
        /// Version stamp.
        version: u64,
    },
}

impl DiamondEvent {
    /// Topic 0 of the encoded log.
    #[must_use]
    pub fn topic(&self) -> Hash {
        match self {
            Self::DiamondCut { .. } => event_topic(signatures::DIAMOND_CUT_EVENT),
            Self::Initialized { .. } => event_topic(signatures::INITIALIZED_EVENT),
        }
    }

    /// ABI-encoded log data.
    #[must_use]
    pub fn encode_data(&self) -> Bytes {
        match self {
            Self::DiamondCut {
                cuts,
                init,
                calldata,
            } => Bytes::from(abi::encode_diamond_cut_args(cuts, *init, calldata.as_slice())),
            Self::Initialized { version } => {
                Bytes::from(abi::encode(&[Token::Uint(U256::from(*version))]))
            }
        }
    }
}

// =============================================================================
// CALL OUTCOME
// =============================================================================

/// Result of a successful top-level call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOutcome {
    /// Return data, verbatim from the facet.
    pub output: Bytes,
    /// Events emitted by the call, in order.
    pub events: Vec<DiamondEvent>,
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Diamond configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiamondConfig {
    /// Maximum nesting of calls back into the proxy.
    pub max_call_depth: u16,
    /// Maximum number of registered selectors.
    pub max_selectors: usize,
    /// Only the owner may submit a batch cut through the entrypoint.
    pub enforce_owner: bool,
}

impl Default for DiamondConfig {
    fn default() -> Self {
        Self {
            max_call_depth: crate::domain::invariants::limits::MAX_CALL_DEPTH,
            max_selectors: crate::domain::invariants::limits::MAX_SELECTORS,
            enforce_owner: true,
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
    fn test_cut_action_from_u8() {
        assert_eq!(FacetCutAction::try_from(0).unwrap(), FacetCutAction::Add);
        assert_eq!(FacetCutAction::try_from(2).unwrap(), FacetCutAction::Remove);
        assert!(matches!(
            FacetCutAction::try_from(7),
            Err(AbiError::InvalidCutAction(7))
        ));
    }

    #[test]
    fn test_remove_cut_uses_zero_address() {
        let cut = FacetCut::remove(vec![Selector::from_u32(1)]);
        assert!(cut.facet_address.is_zero());
        assert_eq!(cut.action, FacetCutAction::Remove);
    }

    #[test]
    fn test_message_selector_and_transfer() {
        let msg = Message::new(Address::from_low_u8(1), vec![0xaa, 0xbb, 0xcc, 0xdd, 0x01]);
        assert_eq!(msg.selector(), Selector::from_u32(0xaabb_ccdd));
        assert!(!msg.is_transfer());

        let transfer = Message::transfer(Address::from_low_u8(1), U256::from(5));
        assert!(transfer.is_transfer());
    }

    #[test]
    fn test_initialized_event_encoding() {
        let event = DiamondEvent::Initialized { version: 1 };
        let data = event.encode_data();
        assert_eq!(data.len(), 32);
        assert_eq!(data.as_slice()[31], 1);
        assert_eq!(event.topic(), event_topic("Initialized(uint64)"));
    }

    #[test]
    fn test_diamond_config_default() {
        let config = DiamondConfig::default();
        assert_eq!(config.max_call_depth, 1024);
        assert_eq!(config.max_selectors, 65_536);
        assert!(config.enforce_owner);
    }
}
