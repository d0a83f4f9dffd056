//! # Driving Ports (API - Inbound)
//!
//! The surface the proxy exposes to deployers and callers.
//!
//! - Batch-cut entrypoint
//! - Generic dispatch (the proxy's whole public API is whatever selectors
//!   are registered)
//! - Loupe reads

use crate::domain::entities::{CallOutcome, Facet, FacetCut, Message};
use crate::domain::value_objects::{Address, Bytes, Selector};
use crate::errors::{DiamondError, ServiceError};
use async_trait::async_trait;

/// Result type of the inbound API: the outer layer fails on transport
/// problems, the inner one on proxy-level reverts.
pub type ApiResult<T> = Result<Result<T, DiamondError>, ServiceError>;

/// Public API of a diamond proxy.
#[async_trait]
pub trait DiamondApi: Send + Sync {
    /// Applies a batch of cuts, then runs the optional initializer.
    ///
    /// All or nothing: a failure anywhere discards every effect.
    async fn diamond_cut(
        &self,
        caller: Address,
        cuts: Vec<FacetCut>,
        init: Address,
        calldata: Bytes,
    ) -> ApiResult<CallOutcome>;

    /// Routes a call to the facet registered for its selector.
    async fn call(&self, message: Message) -> ApiResult<CallOutcome>;

    /// All facets with their selectors.
    async fn facets(&self) -> Result<Vec<Facet>, ServiceError>;

    /// Facet registered for `selector`.
    async fn facet_address(&self, selector: Selector) -> Result<Option<Address>, ServiceError>;
}
