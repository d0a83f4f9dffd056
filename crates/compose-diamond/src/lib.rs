//! # Compose Diamond - Modular Proxy Core
//!
//! **Standard:** ERC-2535 Diamonds, multi-facet proxy
//! **Status:** Core complete (registry, cuts, initializer guard, dispatcher)
//!
//! ## Purpose
//!
//! A diamond is a single proxy whose public surface is assembled from
//! independently deployed facets. Each call is routed by its 4-byte selector
//! to the facet registered for it and executed in delegated context, against
//! the proxy's own storage and identity. The selector table is mutated only
//! through atomic batch cuts.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Selector uniqueness | `domain/invariants.rs` - `check_uniqueness_invariant()` |
//! | Back-pointer consistency | `domain/invariants.rs` - `check_back_pointer_invariant()` |
//! | Dense selector list | `domain/invariants.rs` - `check_dense_list_invariant()` |
//! | Batch atomicity | `domain/cut.rs` - `CutProcessor::apply()` stages on a copy |
//! | Unit-of-work rollback | `diamond.rs` - `Diamond::transact()` |
//! | Immutable functions | `domain/cut.rs` - replace/remove rules |
//! | One-shot initializer | `domain/initializer.rs` - `InitializationState::enter()` |
//! | Dispatch transparency | `diamond.rs` - `Diamond::delegate()` relays bytes verbatim |
//!
//! ## Safety Limits
//!
//! | Limit | Value | Purpose |
//! |-------|-------|---------|
//! | `max_call_depth` | 1024 | Bound re-entrant calls into the proxy |
//! | `max_selectors` | 65 536 | Capacity of a 16-bit position index |
//! | `request_timeout` | 5 seconds | Service lock acquisition |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Selector Registry | `domain/registry.rs` | selector -> (facet, position) plus dense list |
//! | Cut Processor | `domain/cut.rs` | Add / Replace / Remove batches |
//! | Initializer Guard | `domain/initializer.rs` | One-shot, re-entrancy tolerant setup |
//! | Dispatcher | `diamond.rs` | Routing and the transactional boundary |
//! | Execution Context | `context.rs` | What facets see while running |
//! | Facet Storage | `storage.rs` | Typed namespaced regions |
//! | ABI codec | `domain/abi.rs` | `diamondCut` calldata, events, custom errors |
//!
//! ## Usage Example
//!
//! ```ignore
//! use compose_diamond::prelude::*;
//!
//! let host = Arc::new(InMemoryFacetHost::new());
//! host.deploy(counter_address, Arc::new(CounterFacet));
//!
//! let args = DiamondArgs::new(diamond_address, owner)
//!     .with_cuts(vec![FacetCut::add(counter_address, CounterFacet.selectors())]);
//! let (mut diamond, _) = Diamond::deploy(args, host, DiamondConfig::default())?;
//!
//! let outcome = diamond.call(Message::new(user, increment_calldata))?;
//! ```

// Crate-level lints
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod context;
pub mod diamond;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;
pub mod storage;
pub mod telemetry;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        CallOutcome, DiamondConfig, DiamondEvent, Facet, FacetCut, FacetCutAction, Message,
        SelectorEntry,
    };

    // Value objects
    pub use crate::domain::value_objects::{Address, Bytes, Hash, Selector, StorageNamespace, U256};

    // Domain services
    pub use crate::domain::services::{diamond_cut_selector, event_topic, keccak256, signatures};

    // Core components
    pub use crate::domain::cut::{apply_cuts, CutProcessor, CutSummary};
    pub use crate::domain::initializer::{InitScope, InitializationState};
    pub use crate::domain::registry::SelectorRegistry;

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, limits, InvariantCheckResult, InvariantViolation,
    };

    // Proxy
    pub use crate::context::ExecutionContext;
    pub use crate::diamond::{Diamond, DiamondArgs, Phase};
    pub use crate::storage::{FacetStorage, Namespaced};

    // Ports
    pub use crate::ports::inbound::{ApiResult, DiamondApi};
    pub use crate::ports::outbound::{EventSink, FacetCode, FacetHost};

    // Events
    pub use crate::events::{
        topics, CallRequestPayload, CallResponsePayload, DiamondCutRequestPayload,
        DiamondCutResponsePayload, LogPayload, LoupeRequestPayload, LoupeResponsePayload,
        RevertPayload,
    };

    // Errors
    pub use crate::errors::{AbiError, DiamondError, RegistryError, Revert, ServiceError};

    // Adapters
    pub use crate::adapters::{DiamondEventHandler, FnFacet, InMemoryEventLog, InMemoryFacetHost};

    // Service
    pub use crate::config::{ServiceConfig, TelemetryConfig};
    pub use crate::service::{create_test_service, DiamondService, ServiceStats};

    pub use std::sync::Arc;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// TESTS
// =============================================================================
