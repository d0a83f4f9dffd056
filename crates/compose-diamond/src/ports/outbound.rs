//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the diamond depends on:
//! - `FacetCode`: a unit of executable code invoked in delegated context
//! - `FacetHost`: resolves an address to the code deployed there
//! - `EventSink`: receives committed events
//!
//! The core never interprets what a facet does. It only needs to know
//! whether an address holds code and how to hand a call to it.

use crate::context::ExecutionContext;
use crate::domain::entities::DiamondEvent;
use crate::domain::value_objects::{Address, Bytes, Selector};
use crate::errors::Revert;
use std::sync::Arc;

// =============================================================================
// FACET CODE
// =============================================================================

/// Executable code of a facet.
///
/// `invoke` runs "as" the proxy: `ctx` exposes the proxy's storage,
/// address and the original message, never the facet's own.
pub trait FacetCode: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str {
        "facet"
    }

    /// Selectors this facet wants registered.
    ///
    /// Off-band enumeration for deployers; the core never calls it during
    /// dispatch.
    fn selectors(&self) -> Vec<Selector> {
        Vec::new()
    }

    /// Handles a call routed to this facet.
    ///
    /// The full payload, selector included, is `ctx.calldata()`.
    ///
    /// # Errors
    ///
    /// A [`Revert`] whose payload is relayed to the caller unchanged.
    fn invoke(&self, ctx: &mut ExecutionContext<'_>) -> Result<Bytes, Revert>;
}

// =============================================================================
// FACET HOST
// =============================================================================

/// Address space the proxy delegates into.
pub trait FacetHost: Send + Sync {
    /// Code deployed at `address`, if any.
    fn code_at(&self, address: Address) -> Option<Arc<dyn FacetCode>>;

    /// Returns true if `address` holds executable code.
    fn has_code(&self, address: Address) -> bool {
        self.code_at(address).is_some()
    }
}

// =============================================================================
// EVENT SINK
// =============================================================================

/// Where committed events are published.
///
/// Only events of successful units of work ever reach a sink.
pub trait EventSink: Send + Sync {
    /// Publishes one event under `topic`.
    fn publish(&self, topic: &str, event: &DiamondEvent);
}
