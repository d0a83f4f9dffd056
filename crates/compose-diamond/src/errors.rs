//! # Error Types
//!
//! All error types of the diamond core.
//!
//! Every [`DiamondError`] is fatal for the enclosing unit of work: the
//! proxy discards all state changes made since the unit began and surfaces
//! the error to the original caller. On the wire each variant is a Solidity
//! custom error (`revert_data()`), so tooling can match on it.

use crate::domain::abi::{self, Token};
use crate::domain::value_objects::{Address, Bytes, Hash, Selector, U256};
use thiserror::Error;

// =============================================================================
// DIAMOND ERRORS
// =============================================================================

/// Failures of the cut processor, initializer guard and dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiamondError {
    /// A cut carried an empty selector list.
    #[error("no selectors provided for facet {facet:?}")]
    NoSelectorsProvidedForFacet { facet: Address },

    /// The facet (or initializer target) has no executable code.
    #[error("no bytecode at address {address:?}")]
    NoBytecodeAtAddress { address: Address },

    /// Add of a selector that is already registered.
    #[error("cannot add function {selector} that already exists")]
    CannotAddFunctionToDiamondThatAlreadyExists { selector: Selector },

    /// Replace of a selector owned by the proxy itself.
    #[error("cannot replace immutable function {selector}")]
    CannotReplaceImmutableFunction { selector: Selector },

    /// Replace pointing a selector at the facet it already uses.
    #[error("cannot replace function {selector} with the same function from the same facet")]
    CannotReplaceFunctionWithTheSameFunctionFromTheSameFacet { selector: Selector },

    /// Replace of an unregistered selector.
    #[error("cannot replace function {selector} that does not exist")]
    CannotReplaceFunctionThatDoesNotExists { selector: Selector },

    /// Remove cut naming a facet other than the zero address.
    #[error("remove facet address must be zero address, got {facet:?}")]
    RemoveFacetAddressMustBeZeroAddress { facet: Address },

    /// Remove of an unregistered selector.
    #[error("cannot remove function {selector} that does not exist")]
    CannotRemoveFunctionThatDoesNotExist { selector: Selector },

    /// Remove of a selector owned by the proxy itself.
    #[error("cannot remove immutable function {selector}")]
    CannotRemoveImmutableFunction { selector: Selector },

    /// The registry is full.
    #[error("selector capacity exceeded: max {max}")]
    SelectorCapacityExceeded { max: usize },

    /// The post-cut initializer call failed.
    ///
    /// `reason` holds the callee's failure payload when it produced one.
    #[error("initialization function {init:?} reverted")]
    InitializationFunctionReverted {
        init: Address,
        calldata: Bytes,
        reason: Option<Bytes>,
    },

    /// Initializer entered when already initialized.
    #[error("invalid initialization")]
    InvalidInitialization,

    /// Initializing-only routine called outside an initializer.
    #[error("not initializing")]
    NotInitializing,

    /// No facet registered for the selector.
    #[error("function {selector} does not exist")]
    FunctionDoesNotExist { selector: Selector },

    /// A facet failed; its payload is relayed verbatim.
    #[error("facet reverted: {0:?}")]
    FacetReverted(Bytes),

    /// Batch cut submitted by someone other than the owner.
    #[error("unauthorized caller {caller:?}")]
    Unauthorized { caller: Address },

    /// Too many nested calls into the proxy.
    #[error("call depth exceeded: {depth} > {max}")]
    CallDepthExceeded { depth: u16, max: u16 },

    /// Two storage types claimed the same namespace.
    #[error("storage namespace collision: {namespace}")]
    StorageNamespaceCollision { namespace: &'static str, id: Hash },

    /// Call payload could not be decoded.
    #[error("invalid calldata: {0}")]
    InvalidCalldata(#[from] AbiError),
}

impl DiamondError {
    /// Canonical Solidity signature of the custom error, if it has one.
    #[must_use]
    pub fn signature(&self) -> Option<&'static str> {
        let sig = match self {
            Self::NoSelectorsProvidedForFacet { .. } => "NoSelectorsProvidedForFacet(address)",
            Self::NoBytecodeAtAddress { .. } => "NoBytecodeAtAddress(address)",
            Self::CannotAddFunctionToDiamondThatAlreadyExists { .. } => {
                "CannotAddFunctionToDiamondThatAlreadyExists(bytes4)"
            }
            Self::CannotReplaceImmutableFunction { .. } => "CannotReplaceImmutableFunction(bytes4)",
            Self::CannotReplaceFunctionWithTheSameFunctionFromTheSameFacet { .. } => {
                "CannotReplaceFunctionWithTheSameFunctionFromTheSameFacet(bytes4)"
            }
            Self::CannotReplaceFunctionThatDoesNotExists { .. } => {
                "CannotReplaceFunctionThatDoesNotExists(bytes4)"
            }
            Self::RemoveFacetAddressMustBeZeroAddress { .. } => {
                "RemoveFacetAddressMustBeZeroAddress(address)"
            }
            Self::CannotRemoveFunctionThatDoesNotExist { .. } => {
                "CannotRemoveFunctionThatDoesNotExist(bytes4)"
            }
            Self::CannotRemoveImmutableFunction { .. } => "CannotRemoveImmutableFunction(bytes4)",
            Self::SelectorCapacityExceeded { .. } => "SelectorCapacityExceeded(uint256)",
            Self::InitializationFunctionReverted { .. } => {
                "InitializationFunctionReverted(address,bytes)"
            }
            Self::InvalidInitialization => "InvalidInitialization()",
            Self::NotInitializing => "NotInitializing()",
            Self::FunctionDoesNotExist { .. } => "FunctionDoesNotExist(bytes4)",
            Self::Unauthorized { .. } => "Unauthorized(address)",
            Self::StorageNamespaceCollision { .. } => "StorageNamespaceCollision(bytes32)",
            // Relayed payloads and host-level aborts carry no custom error.
            Self::FacetReverted(_) | Self::CallDepthExceeded { .. } | Self::InvalidCalldata(_) => {
                return None
            }
        };
        Some(sig)
    }

    /// Revert payload seen by the caller.
    ///
    /// Facet failures and bubbled initializer failures are returned byte for
    /// byte; every other kind is its ABI-encoded custom error.
    #[must_use]
    pub fn revert_data(&self) -> Bytes {
        match self {
            Self::FacetReverted(payload) => return payload.clone(),
            Self::InitializationFunctionReverted {
                reason: Some(reason),
                ..
            } if !reason.is_empty() => return reason.clone(),
            _ => {}
        }

        let Some(signature) = self.signature() else {
            return Bytes::new();
        };

        let args = match self {
            Self::NoSelectorsProvidedForFacet { facet }
            | Self::RemoveFacetAddressMustBeZeroAddress { facet } => vec![Token::Address(*facet)],
            Self::NoBytecodeAtAddress { address } => vec![Token::Address(*address)],
            Self::Unauthorized { caller } => vec![Token::Address(*caller)],
            Self::CannotAddFunctionToDiamondThatAlreadyExists { selector }
            | Self::CannotReplaceImmutableFunction { selector }
            | Self::CannotReplaceFunctionWithTheSameFunctionFromTheSameFacet { selector }
            | Self::CannotReplaceFunctionThatDoesNotExists { selector }
            | Self::CannotRemoveFunctionThatDoesNotExist { selector }
            | Self::CannotRemoveImmutableFunction { selector }
            | Self::FunctionDoesNotExist { selector } => {
                vec![Token::FixedBytes(selector.0.to_vec())]
            }
            Self::SelectorCapacityExceeded { max } => vec![Token::Uint(U256::from(*max))],
            Self::InitializationFunctionReverted { init, calldata, .. } => vec![
                Token::Address(*init),
                Token::Bytes(calldata.as_slice().to_vec()),
            ],
            Self::StorageNamespaceCollision { id, .. } => vec![Token::FixedBytes(id.0.to_vec())],
            _ => Vec::new(),
        };

        let mut out = Selector::from_signature(signature).0.to_vec();
        out.extend(abi::encode(&args));
        Bytes::from(out)
    }

    /// Returns true if the failure came from facet code rather than the core.
    #[must_use]
    pub fn is_facet_failure(&self) -> bool {
        matches!(self, Self::FacetReverted(_))
    }
}

// =============================================================================
// REVERT PAYLOAD
// =============================================================================

/// Failure payload returned by facet code.
///
/// Facets that propagate a core error with `?` produce the same bytes the
/// proxy would have returned for it.
#[derive(Debug, Error, Clone, PartialEq, Eq, Default)]
#[error("revert: {0:?}")]
pub struct Revert(pub Bytes);

impl Revert {
    /// A revert with no payload.
    #[must_use]
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    /// A revert carrying `payload`.
    #[must_use]
    pub fn with_payload(payload: impl Into<Bytes>) -> Self {
        Self(payload.into())
    }
}

impl From<DiamondError> for Revert {
    fn from(err: DiamondError) -> Self {
        Self(err.revert_data())
    }
}

// =============================================================================
// REGISTRY ERRORS
// =============================================================================

/// Low-level registry safeguards.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Selector already has a facet.
    #[error("selector {0} already registered")]
    AlreadyRegistered(Selector),

    /// Selector has no entry.
    #[error("selector {0} not registered")]
    NotRegistered(Selector),

    /// Entry would point at the zero address.
    #[error("selector {0} cannot point at the zero address")]
    NullFacet(Selector),

    /// Insert did not append.
    #[error("insert position mismatch: expected {expected}, got {actual}")]
    PositionMismatch { expected: usize, actual: usize },
}

// =============================================================================
// ABI ERRORS
// =============================================================================

/// ABI decoding failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// Read past the end of the buffer.
    #[error("out of bounds read at offset {offset} (buffer {len} bytes)")]
    OutOfBounds { offset: usize, len: usize },

    /// Offset or length word does not fit in memory.
    #[error("offset overflow at {offset}")]
    OffsetOverflow { offset: usize },

    /// Non-zero padding bytes.
    #[error("dirty padding at offset {offset}")]
    DirtyPadding { offset: usize },

    /// Integer wider than its declared type.
    #[error("value at offset {offset} exceeds uint{bits}")]
    ValueOutOfRange { offset: usize, bits: usize },

    /// Decoded values do not match the expected shape.
    #[error("unexpected value shape")]
    UnexpectedShape,

    /// Cut action outside `Add | Replace | Remove`.
    #[error("invalid facet cut action: {0}")]
    InvalidCutAction(u8),
}

// =============================================================================
// HOST / SERVICE ERRORS
// =============================================================================

/// Errors from the service layer.
#[derive(Debug, Error, Clone)]
pub enum ServiceError {
    /// The proxy did not become available in time.
    #[error("request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Payload serialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// No handler for the topic.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
}

/// Errors from telemetry setup.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber could not be installed.
    #[error("tracing init failed: {0}")]
    TracerInit(String),
}

// =============================================================================
// TESTS
// =============================================================================
