//! # Diamond
//!
//! The proxy itself. Owns the selector registry, the initialization state
//! and all facet storage, and routes every call to the facet registered for
//! its selector.
//!
//! ## Transactional boundary
//!
//! Every top-level call is one unit of work. The state is checkpointed on
//! entry and restored on any failure, so a rejected cut batch, a failing
//! initializer or a reverting facet leaves nothing behind, including
//! emitted events. Nested calls made by facets through their
//! [`ExecutionContext`] checkpoint the same way.
//!
//! ## Dispatch order
//!
//! 1. Empty payload: bare value transfer, accepted without resolution.
//! 2. `diamondCut` selector: built-in batch-cut entrypoint.
//! 3. Registry lookup; unknown selector fails with `FunctionDoesNotExist`.
//! 4. Selector owned by the proxy: built-in code.
//! 5. Otherwise: delegated call into the facet.

use crate::context::ExecutionContext;
use crate::domain::abi;
use crate::domain::cut::apply_cuts;
use crate::domain::entities::{
    CallOutcome, DiamondConfig, DiamondEvent, Facet, FacetCut, Message, SelectorEntry,
};
use crate::domain::initializer::InitializationState;
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::registry::SelectorRegistry;
use crate::domain::services::diamond_cut_selector;
use crate::domain::value_objects::{Address, Bytes, Selector, U256};
use crate::errors::{DiamondError, Revert};
use crate::ports::outbound::{FacetCode, FacetHost};
use crate::storage::FacetStorage;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

// =============================================================================
// DEPLOYMENT
// =============================================================================

/// Deployment parameters.
#[derive(Clone, Default)]
pub struct DiamondArgs {
    /// Address the proxy is deployed at.
    pub address: Address,
    /// Account allowed to submit batch cuts.
    pub owner: Address,
    /// Initial cut batch.
    pub cuts: Vec<FacetCut>,
    /// Initializer target for the initial batch (zero for none).
    pub init: Address,
    /// Initializer payload.
    pub init_calldata: Bytes,
    /// The proxy's own code, serving its immutable selectors.
    pub builtin: Option<Arc<dyn FacetCode>>,
    /// Selectors registered as immutable, pointing at the proxy itself.
    pub immutable_selectors: Vec<Selector>,
}

impl DiamondArgs {
    /// Minimal arguments: an address and an owner.
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            ..Self::default()
        }
    }

    /// Sets the initial cut batch.
    #[must_use]
    pub fn with_cuts(mut self, cuts: Vec<FacetCut>) -> Self {
        self.cuts = cuts;
        self
    }

    /// Sets the initializer of the initial batch.
    #[must_use]
    pub fn with_init(mut self, init: Address, calldata: impl Into<Bytes>) -> Self {
        self.init = init;
        self.init_calldata = calldata.into();
        self
    }

    /// Installs built-in code and registers its selectors as immutable.
    #[must_use]
    pub fn with_builtin(mut self, code: Arc<dyn FacetCode>, selectors: Vec<Selector>) -> Self {
        self.builtin = Some(code);
        self.immutable_selectors = selectors;
        self
    }
}

/// Lifecycle phase of the proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Deployment is running; the proxy's own code is not observable yet.
    Constructing,
    /// Deployment finished.
    Deployed,
}

// =============================================================================
// STATE
// =============================================================================

/// Everything a unit of work may change. Cloned as a checkpoint.
#[derive(Clone, Debug, Default)]
pub(crate) struct DiamondState {
    /// `compose.diamond`
    pub(crate) registry: SelectorRegistry,
    /// `compose.initializable`
    pub(crate) init: InitializationState,
    /// Facet-owned regions.
    pub(crate) storage: FacetStorage,
    /// Value received so far.
    pub(crate) balance: U256,
    /// Events journaled by the current unit of work.
    pub(crate) events: Vec<DiamondEvent>,
}

// =============================================================================
// DIAMOND
// =============================================================================

/// A diamond proxy.
pub struct Diamond {
    address: Address,
    owner: Address,
    host: Arc<dyn FacetHost>,
    builtin: Option<Arc<dyn FacetCode>>,
    config: DiamondConfig,
    phase: Phase,
    pub(crate) state: DiamondState,
}

impl Diamond {
    /// Deploys a proxy.
    ///
    /// Registers the built-in selectors (the batch-cut entrypoint and
    /// `args.immutable_selectors`) as immutable, then applies the initial cut
    /// batch and initializer inside the construction phase.
    ///
    /// # Errors
    ///
    /// Any cut or initializer failure; nothing is deployed in that case.
    pub fn deploy(
        args: DiamondArgs,
        host: Arc<dyn FacetHost>,
        config: DiamondConfig,
    ) -> Result<(Self, CallOutcome), DiamondError> {
        let mut diamond = Self {
            address: args.address,
            owner: args.owner,
            host,
            builtin: args.builtin,
            config,
            phase: Phase::Constructing,
            state: DiamondState::default(),
        };

        let mut immutable = vec![diamond_cut_selector()];
        immutable.extend(args.immutable_selectors);

        let outcome = diamond.transact(|d| {
            for selector in immutable {
                let position = d.state.registry.len();
                d.state
                    .registry
                    .insert(selector, d.address, position)
                    .map_err(|_| DiamondError::CannotAddFunctionToDiamondThatAlreadyExists {
                        selector,
                    })?;
            }
            if !args.cuts.is_empty() || !args.init.is_zero() {
                d.apply_diamond_cut(
                    args.owner,
                    &args.cuts,
                    args.init,
                    args.init_calldata.as_slice(),
                    0,
                )?;
            }
            Ok(Bytes::new())
        })?;

        diamond.phase = Phase::Deployed;
        info!(
            address = %diamond.address,
            owner = %diamond.owner,
            selectors = diamond.state.registry.len(),
            "Diamond deployed"
        );
        Ok((diamond, outcome))
    }

    // -------------------------------------------------------------------------
    // Entrypoints
    // -------------------------------------------------------------------------

    /// Handles an external call.
    ///
    /// # Errors
    ///
    /// The failure of the unit of work; all of its effects are discarded.
    pub fn call(&mut self, message: Message) -> Result<CallOutcome, DiamondError> {
        self.transact(|d| d.execute(message, 0))
    }

    /// Typed batch-cut entrypoint, equivalent to calling `diamondCut`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for a non-owner caller, any cut validation failure,
    /// or `InitializationFunctionReverted`. The batch is all or nothing.
    pub fn diamond_cut(
        &mut self,
        caller: Address,
        cuts: &[FacetCut],
        init: Address,
        calldata: &[u8],
    ) -> Result<CallOutcome, DiamondError> {
        self.transact(|d| {
            d.check_owner(caller)?;
            d.apply_diamond_cut(caller, cuts, init, calldata, 0)?;
            Ok(Bytes::new())
        })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The proxy's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The owner allowed to submit cuts.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true once deployment finished.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.phase == Phase::Deployed
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &DiamondConfig {
        &self.config
    }

    /// The selector registry.
    #[must_use]
    pub fn registry(&self) -> &SelectorRegistry {
        &self.state.registry
    }

    /// Initializer guard state.
    #[must_use]
    pub fn initialization_state(&self) -> InitializationState {
        self.state.init
    }

    /// Facet-owned storage.
    #[must_use]
    pub fn storage(&self) -> &FacetStorage {
        &self.state.storage
    }

    /// Value received by the proxy.
    #[must_use]
    pub fn balance(&self) -> U256 {
        self.state.balance
    }

    /// Facet registered for `selector`.
    #[must_use]
    pub fn facet_address(&self, selector: Selector) -> Option<Address> {
        self.state.registry.lookup(selector)
    }

    /// Registry record for `selector`.
    #[must_use]
    pub fn selector_entry(&self, selector: Selector) -> Option<SelectorEntry> {
        self.state.registry.entry(selector)
    }

    /// All facets with their selectors.
    #[must_use]
    pub fn facets(&self) -> Vec<Facet> {
        self.state.registry.facets()
    }

    /// Distinct facet addresses.
    #[must_use]
    pub fn facet_addresses(&self) -> Vec<Address> {
        self.state.registry.facet_addresses()
    }

    /// Selectors routed to `facet`.
    #[must_use]
    pub fn facet_function_selectors(&self, facet: Address) -> Vec<Selector> {
        self.state.registry.facet_function_selectors(facet)
    }

    /// Checks the registry invariants.
    #[must_use]
    pub fn check_invariants(&self) -> InvariantCheckResult {
        check_all_invariants(&self.state.registry)
    }

    // -------------------------------------------------------------------------
    // Internals shared with ExecutionContext
    // -------------------------------------------------------------------------

    pub(crate) fn snapshot(&self) -> DiamondState {
        self.state.clone()
    }

    pub(crate) fn restore(&mut self, checkpoint: DiamondState) {
        self.state = checkpoint;
    }

    /// Runs `f` as one unit of work, draining its events on success.
    fn transact(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Bytes, DiamondError>,
    ) -> Result<CallOutcome, DiamondError> {
        let checkpoint = self.snapshot();
        match f(self) {
            Ok(output) => Ok(CallOutcome {
                output,
                events: std::mem::take(&mut self.state.events),
            }),
            Err(err) => {
                debug!(error = %err, "Unit of work reverted");
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    /// Executes one call frame. The caller owns the checkpoint.
    pub(crate) fn execute(&mut self, message: Message, depth: u16) -> Result<Bytes, DiamondError> {
        self.check_depth(depth)?;

        self.state.balance = self.state.balance.saturating_add(message.value);

        if message.is_transfer() {
            debug!(caller = %message.caller, value = %message.value, "Value received");
            return Ok(Bytes::new());
        }

        let selector = message.selector();
        if selector == diamond_cut_selector() {
            return self.diamond_cut_entrypoint(&message, depth);
        }

        let Some(facet) = self.state.registry.lookup(selector) else {
            debug!(%selector, "Function does not exist");
            return Err(DiamondError::FunctionDoesNotExist { selector });
        };

        if facet == self.address && self.builtin.is_none() {
            return Err(DiamondError::FunctionDoesNotExist { selector });
        }

        self.delegate(facet, message, depth)
    }

    /// Runs `facet`'s code against this proxy's state.
    pub(crate) fn delegate(
        &mut self,
        facet: Address,
        message: Message,
        depth: u16,
    ) -> Result<Bytes, DiamondError> {
        self.check_depth(depth)?;
        let Some(code) = self.resolve_code(facet) else {
            warn!(%facet, "Delegated call into an address without code");
            return Ok(Bytes::new());
        };

        debug!(facet = %facet, name = code.name(), selector = %message.selector(), depth, "Delegating call");
        let mut ctx = ExecutionContext::new(self, message, depth);
        code.invoke(&mut ctx)
            .map_err(|Revert(payload)| DiamondError::FacetReverted(payload))
    }

    /// Every frame entering facet code is bounded, including initializer
    /// frames opened by nested cuts.
    fn check_depth(&self, depth: u16) -> Result<(), DiamondError> {
        if depth > self.config.max_call_depth {
            debug!(depth, max = self.config.max_call_depth, "Call depth exceeded");
            return Err(DiamondError::CallDepthExceeded {
                depth,
                max: self.config.max_call_depth,
            });
        }
        Ok(())
    }

    fn resolve_code(&self, address: Address) -> Option<Arc<dyn FacetCode>> {
        if address == self.address {
            self.builtin.clone()
        } else {
            self.host.code_at(address)
        }
    }

    /// Whether `address` holds code. The proxy itself has none while it is
    /// being constructed.
    pub(crate) fn has_code(&self, address: Address) -> bool {
        if address == self.address {
            self.is_deployed()
        } else {
            self.host.has_code(address)
        }
    }

    fn check_owner(&self, caller: Address) -> Result<(), DiamondError> {
        if self.config.enforce_owner && self.is_deployed() && caller != self.owner {
            warn!(%caller, "Unauthorized diamond cut");
            return Err(DiamondError::Unauthorized { caller });
        }
        Ok(())
    }

    fn diamond_cut_entrypoint(&mut self, message: &Message, depth: u16) -> Result<Bytes, DiamondError> {
        self.check_owner(message.caller)?;
        let args = message.calldata.as_slice().get(4..).unwrap_or(&[]);
        let (cuts, init, calldata) = abi::decode_diamond_cut_args(args)?;
        self.apply_diamond_cut(message.caller, &cuts, init, calldata.as_slice(), depth)?;
        Ok(Bytes::new())
    }

    /// Applies a batch, announces it, then runs the initializer.
    pub(crate) fn apply_diamond_cut(
        &mut self,
        caller: Address,
        cuts: &[FacetCut],
        init: Address,
        calldata: &[u8],
        depth: u16,
    ) -> Result<(), DiamondError> {
        let host = Arc::clone(&self.host);
        let me = self.address;
        let deployed = self.is_deployed();
        let has_code = |address: Address| {
            if address == me {
                deployed
            } else {
                host.has_code(address)
            }
        };

        let summary = apply_cuts(
            &mut self.state.registry,
            me,
            self.config.max_selectors,
            has_code,
            cuts,
        )?;

        info!(
            cuts = cuts.len(),
            added = summary.added,
            replaced = summary.replaced,
            removed = summary.removed,
            init = %init,
            "Diamond cut applied"
        );

        self.state.events.push(DiamondEvent::DiamondCut {
            cuts: cuts.to_vec(),
            init,
            calldata: Bytes::from_slice(calldata),
        });

        self.initialize_diamond_cut(caller, init, calldata, depth)
    }

    fn initialize_diamond_cut(
        &mut self,
        caller: Address,
        init: Address,
        calldata: &[u8],
        depth: u16,
    ) -> Result<(), DiamondError> {
        if init.is_zero() {
            return Ok(());
        }
        if !self.has_code(init) {
            return Err(DiamondError::NoBytecodeAtAddress { address: init });
        }

        let message = Message::new(caller, Bytes::from_slice(calldata));
        let result = if init == self.address {
            self.execute(message, depth.saturating_add(1))
        } else {
            self.delegate(init, message, depth.saturating_add(1))
        };

        result.map(|_| ()).map_err(|err| {
            warn!(%init, error = %err, "Initializer reverted");
            let payload = err.revert_data();
            DiamondError::InitializationFunctionReverted {
                init,
                calldata: Bytes::from_slice(calldata),
                reason: (!payload.is_empty()).then_some(payload),
            }
        })
    }
}

impl fmt::Debug for Diamond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diamond")
            .field("address", &self.address)
            .field("owner", &self.owner)
            .field("phase", &self.phase)
            .field("selectors", &self.state.registry.len())
            .field("init", &self.state.init)
            .field("storage", &self.state.storage)
            .finish_non_exhaustive()
    }
}
