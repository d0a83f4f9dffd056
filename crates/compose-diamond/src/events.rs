//! # Event Schema
//!
//! Request/response payloads of the diamond service and the topics they
//! travel under. Payloads carry no identity beyond the declared `caller`;
//! every request/response pair is matched by a `correlation_id` held in
//! the transport envelope.
//!
//! | Topic | Payload |
//! |-------|---------|
//! | `diamond.cut.request` | [`DiamondCutRequestPayload`] |
//! | `diamond.cut.response` | [`DiamondCutResponsePayload`] |
//! | `diamond.call.request` | [`CallRequestPayload`] |
//! | `diamond.call.response` | [`CallResponsePayload`] |
//! | `diamond.loupe.request` | [`LoupeRequestPayload`] |
//! | `diamond.loupe.response` | [`LoupeResponsePayload`] |

use crate::domain::entities::{DiamondEvent, Facet, FacetCut};
use crate::domain::value_objects::{Address, Bytes, Hash, Selector, U256};
use crate::errors::DiamondError;
use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND EVENTS
// =============================================================================

/// Request to apply a batch of cuts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiamondCutRequestPayload {
    /// Account submitting the batch.
    pub caller: Address,
    /// Cuts in submission order.
    pub cuts: Vec<FacetCut>,
    /// Initializer target (zero for none).
    pub init: Address,
    /// Initializer payload.
    pub calldata: Bytes,
}

/// Request to route a call through the proxy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRequestPayload {
    /// Immediate caller.
    pub caller: Address,
    /// Attached value.
    #[serde(default)]
    pub value: U256,
    /// Full payload, selector included. Empty for a bare transfer.
    pub calldata: Bytes,
}

/// Loupe queries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum LoupeRequestPayload {
    /// All facets with their selectors.
    Facets,
    /// Facet routing one selector.
    FacetAddress {
        selector: Selector,
    },
    /// Selectors routed to one facet.
    FacetFunctionSelectors {
        facet: Address,
    },
}

// =============================================================================
// OUTBOUND EVENTS
// =============================================================================

/// Reverted unit of work, as reported to the requester.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertPayload {
    /// Error name, e.g. `FunctionDoesNotExist`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Data a caller would observe (ABI-encoded custom error or the
    /// facet's own payload).
    pub data: Bytes,
}

impl From<&DiamondError> for RevertPayload {
    fn from(err: &DiamondError) -> Self {
        Self {
            error: err
                .signature()
                .and_then(|s| s.split('(').next())
                .unwrap_or("Revert")
                .to_string(),
            message: err.to_string(),
            data: err.revert_data(),
        }
    }
}

/// An encoded log: topic 0 plus ABI data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPayload {
    pub topic: Hash,
    pub data: Bytes,
}

impl From<&DiamondEvent> for LogPayload {
    fn from(event: &DiamondEvent) -> Self {
        Self {
            topic: event.topic(),
            data: event.encode_data(),
        }
    }
}

/// Outcome of a batch cut.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiamondCutResponsePayload {
    pub success: bool,
    /// Events emitted (empty on failure).
    pub events: Vec<DiamondEvent>,
    /// Set when the batch was rejected.
    pub revert: Option<RevertPayload>,
}

/// Outcome of a routed call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallResponsePayload {
    pub success: bool,
    /// Return data, verbatim from the facet.
    pub output: Bytes,
    /// Events emitted (empty on failure).
    pub events: Vec<DiamondEvent>,
    /// Set when the call reverted.
    pub revert: Option<RevertPayload>,
}

/// Loupe answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoupeResponsePayload {
    Facets(Vec<Facet>),
    FacetAddress(Option<Address>),
    FacetFunctionSelectors(Vec<Selector>),
}

// =============================================================================
// EVENT BUS TOPICS
// =============================================================================

/// Topics of the diamond service.
pub mod topics {
    /// Batch-cut requests.
    pub const DIAMOND_CUT_REQUEST: &str = "diamond.cut.request";

    /// Batch-cut responses.
    pub const DIAMOND_CUT_RESPONSE: &str = "diamond.cut.response";

    /// Routed call requests.
    pub const CALL_REQUEST: &str = "diamond.call.request";

    /// Routed call responses.
    pub const CALL_RESPONSE: &str = "diamond.call.response";

    /// Loupe queries.
    pub const LOUPE_REQUEST: &str = "diamond.loupe.request";

    /// Loupe answers.
    pub const LOUPE_RESPONSE: &str = "diamond.loupe.response";

    /// Committed `DiamondCut` events.
    pub const DIAMOND_CUT: &str = "diamond.events.cut";

    /// Committed `Initialized` events.
    pub const INITIALIZED: &str = "diamond.events.initialized";

    /// Dead letter queue for undecodable requests.
    pub const DLQ: &str = "dlq.diamond";

    /// Topic a committed event is published under.
    #[must_use]
    pub fn for_event(event: &crate::domain::entities::DiamondEvent) -> &'static str {
        match event {
            crate::domain::entities::DiamondEvent::DiamondCut { .. } => DIAMOND_CUT,
            crate::domain::entities::DiamondEvent::Initialized { .. } => INITIALIZED,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
