//! # Closure Facet
//!
//! Facet code backed by a plain function. Handy for small facets, test
//! doubles and initializer contracts.

use crate::context::ExecutionContext;
use crate::domain::value_objects::{Bytes, Selector};
use crate::errors::Revert;
use crate::ports::outbound::FacetCode;
use std::fmt;

type Handler = dyn Fn(&mut ExecutionContext<'_>) -> Result<Bytes, Revert> + Send + Sync;

/// A facet whose `invoke` is a closure.
pub struct FnFacet {
    name: String,
    selectors: Vec<Selector>,
    handler: Box<Handler>,
}

impl FnFacet {
    pub fn new<F>(name: impl Into<String>, selectors: Vec<Selector>, handler: F) -> Self
    where
        F: Fn(&mut ExecutionContext<'_>) -> Result<Bytes, Revert> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            selectors,
            handler: Box::new(handler),
        }
    }
}

impl FacetCode for FnFacet {
    fn name(&self) -> &str {
        &self.name
    }

    fn selectors(&self) -> Vec<Selector> {
        self.selectors.clone()
    }

    fn invoke(&self, ctx: &mut ExecutionContext<'_>) -> Result<Bytes, Revert> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for FnFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFacet")
            .field("name", &self.name)
            .field("selectors", &self.selectors)
            .finish_non_exhaustive()
    }
}
