//! # Execution Context
//!
//! What facet code sees while it runs in delegated context: the proxy's
//! identity, the original message, the proxy's storage, and a handful of
//! core modules (nested calls, internal cuts, the initializer guard).
//!
//! Every operation that can fail after mutating state checkpoints first and
//! restores on failure, so a facet that catches an error keeps a
//! consistent view.

use crate::diamond::Diamond;
use crate::domain::entities::{DiamondEvent, FacetCut, Message};
use crate::domain::initializer::InitializationState;
use crate::domain::registry::SelectorRegistry;
use crate::domain::value_objects::{Address, Bytes, Selector, U256};
use crate::errors::{DiamondError, Revert};
use crate::storage::Namespaced;
use tracing::info;

/// Delegated execution frame.
pub struct ExecutionContext<'a> {
    diamond: &'a mut Diamond,
    message: Message,
    depth: u16,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(diamond: &'a mut Diamond, message: Message, depth: u16) -> Self {
        Self {
            diamond,
            message,
            depth,
        }
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// The proxy's address, never the facet's.
    #[must_use]
    pub fn address(&self) -> Address {
        self.diamond.address()
    }

    /// Immediate caller of the proxy.
    #[must_use]
    pub fn caller(&self) -> Address {
        self.message.caller
    }

    /// Value attached to the call.
    #[must_use]
    pub fn value(&self) -> U256 {
        self.message.value
    }

    /// Full payload, selector included.
    #[must_use]
    pub fn calldata(&self) -> &[u8] {
        self.message.calldata.as_slice()
    }

    /// Payload after the selector.
    #[must_use]
    pub fn args(&self) -> &[u8] {
        self.calldata().get(4..).unwrap_or(&[])
    }

    #[must_use]
    pub fn selector(&self) -> Selector {
        self.message.selector()
    }

    /// Nesting depth of this frame (0 for a top-level call).
    #[must_use]
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// True while the proxy is still being deployed.
    #[must_use]
    pub fn in_construction(&self) -> bool {
        !self.diamond.is_deployed()
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Mutable access to a namespaced region of the proxy's storage.
    ///
    /// # Errors
    ///
    /// `StorageNamespaceCollision` for a reserved namespace or a type
    /// mismatch.
    pub fn storage<T: Namespaced>(&mut self) -> Result<&mut T, DiamondError> {
        self.diamond.state.storage.get_mut::<T>()
    }

    /// Copy of a namespaced region, default if never written.
    ///
    /// # Errors
    ///
    /// Same as [`Self::storage`].
    pub fn read<T: Namespaced>(&self) -> Result<T, DiamondError> {
        Ok(self
            .diamond
            .state
            .storage
            .get::<T>()?
            .cloned()
            .unwrap_or_default())
    }

    /// The selector registry (read-only).
    #[must_use]
    pub fn registry(&self) -> &SelectorRegistry {
        self.diamond.registry()
    }

    #[must_use]
    pub fn initialization_state(&self) -> InitializationState {
        self.diamond.state.init
    }

    /// Appends an event to the current unit of work.
    pub fn emit(&mut self, event: DiamondEvent) {
        self.diamond.state.events.push(event);
    }

    // =========================================================================
    // Core modules
    // =========================================================================

    /// Calls back into the proxy as an external call from the proxy itself.
    ///
    /// # Errors
    ///
    /// The nested call's failure; its effects are discarded.
    pub fn call(&mut self, calldata: impl Into<Bytes>) -> Result<Bytes, DiamondError> {
        let message = Message::new(self.address(), calldata);
        let depth = self.depth.saturating_add(1);
        let checkpoint = self.diamond.snapshot();
        self.diamond.execute(message, depth).inspect_err(|_| {
            self.diamond.restore(checkpoint);
        })
    }

    /// Applies a cut batch from inside a facet, without the owner gate of
    /// the external entrypoint.
    ///
    /// # Errors
    ///
    /// Any cut or initializer failure; the batch is discarded.
    pub fn diamond_cut(
        &mut self,
        cuts: &[FacetCut],
        init: Address,
        calldata: &[u8],
    ) -> Result<(), DiamondError> {
        let caller = self.caller();
        let depth = self.depth;
        let checkpoint = self.diamond.snapshot();
        self.diamond
            .apply_diamond_cut(caller, cuts, init, calldata, depth)
            .inspect_err(|_| {
                self.diamond.restore(checkpoint);
            })
    }

    /// Runs `body` under the one-shot initializer guard.
    ///
    /// The outermost scope stamps version 1 and emits `Initialized(1)` on
    /// success. Nested scopes run freely. During construction the guard may
    /// be re-entered even if setup already completed.
    ///
    /// # Errors
    ///
    /// `InvalidInitialization` once initialized (outside construction), or
    /// the body's revert; in both cases nothing is kept.
    pub fn initializer<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, Revert>,
    ) -> Result<T, Revert> {
        let checkpoint = self.diamond.snapshot();
        let in_construction = self.in_construction();
        let scope = self.diamond.state.init.enter(in_construction)?;

        match body(self) {
            Ok(value) => {
                if let Some(version) = self.diamond.state.init.exit(scope) {
                    info!(version, "Diamond initialized");
                    self.emit(DiamondEvent::Initialized { version });
                }
                Ok(value)
            }
            Err(revert) => {
                self.diamond.restore(checkpoint);
                Err(revert)
            }
        }
    }

    /// Fails unless an initialization is in progress.
    ///
    /// # Errors
    ///
    /// `NotInitializing`.
    pub fn only_initializing(&self) -> Result<(), DiamondError> {
        self.diamond.state.init.require_initializing()
    }
}
