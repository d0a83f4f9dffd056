//! # Cut Processor
//!
//! Validates and applies an ordered batch of [`FacetCut`]s against a
//! [`SelectorRegistry`].
//!
//! Cuts are evaluated in batch order, selector by selector. The batch is
//! staged on a copy of the registry and committed only when every cut
//! succeeds, so a rejected batch leaves the registry untouched.
//!
//! | Action | Rejected when |
//! |--------|---------------|
//! | Add | no selectors, facet has no code, selector taken |
//! | Replace | no selectors, facet has no code, selector immutable, same facet, selector unregistered |
//! | Remove | no selectors, facet not zero, selector unregistered, selector immutable |

use crate::domain::entities::{FacetCut, FacetCutAction};
use crate::domain::invariants::check_all_invariants;
use crate::domain::registry::SelectorRegistry;
use crate::domain::value_objects::{Address, Selector};
use crate::errors::DiamondError;
use tracing::debug;

/// Counts of what a batch changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CutSummary {
    /// Selectors added.
    pub added: usize,
    /// Selectors re-pointed.
    pub replaced: usize,
    /// Selectors removed.
    pub removed: usize,
}

/// Applies cut batches on behalf of one proxy.
pub struct CutProcessor<'a, F> {
    /// The proxy's own address. Selectors pointing here are immutable.
    diamond: Address,
    /// Whether an address currently holds executable code.
    has_code: F,
    /// Registry capacity.
    max_selectors: usize,
    staged: SelectorRegistry,
    summary: CutSummary,
    target: &'a mut SelectorRegistry,
}

impl<'a, F> CutProcessor<'a, F>
where
    F: Fn(Address) -> bool,
{
    /// Creates a processor staging changes for `registry`.
    pub fn new(
        registry: &'a mut SelectorRegistry,
        diamond: Address,
        max_selectors: usize,
        has_code: F,
    ) -> Self {
        Self {
            diamond,
            has_code,
            max_selectors,
            staged: registry.clone(),
            summary: CutSummary::default(),
            target: registry,
        }
    }

    /// Applies every cut, committing only if all succeed.
    ///
    /// # Errors
    ///
    /// The first validation failure, in batch order. The registry is
    /// unchanged when an error is returned.
    pub fn apply(mut self, cuts: &[FacetCut]) -> Result<CutSummary, DiamondError> {
        for cut in cuts {
            if cut.function_selectors.is_empty() {
                return Err(DiamondError::NoSelectorsProvidedForFacet {
                    facet: cut.facet_address,
                });
            }
            match cut.action {
                FacetCutAction::Add => self.add(cut.facet_address, &cut.function_selectors)?,
                FacetCutAction::Replace => {
                    self.replace(cut.facet_address, &cut.function_selectors)?;
                }
                FacetCutAction::Remove => {
                    self.remove(cut.facet_address, &cut.function_selectors)?;
                }
            }
        }

        debug_assert!(check_all_invariants(&self.staged).is_valid());
        *self.target = self.staged;
        Ok(self.summary)
    }

    fn require_code(&self, facet: Address) -> Result<(), DiamondError> {
        if (self.has_code)(facet) {
            Ok(())
        } else {
            Err(DiamondError::NoBytecodeAtAddress { address: facet })
        }
    }

    fn add(&mut self, facet: Address, selectors: &[Selector]) -> Result<(), DiamondError> {
        self.require_code(facet)?;

        for &selector in selectors {
            if self.staged.lookup(selector).is_some() {
                return Err(DiamondError::CannotAddFunctionToDiamondThatAlreadyExists {
                    selector,
                });
            }
            if self.staged.len() >= self.max_selectors {
                return Err(DiamondError::SelectorCapacityExceeded {
                    max: self.max_selectors,
                });
            }
            let position = self.staged.len();
            self.staged
                .insert(selector, facet, position)
                .map_err(|_| DiamondError::CannotAddFunctionToDiamondThatAlreadyExists {
                    selector,
                })?;
            self.summary.added += 1;
        }

        debug!(facet = %facet, count = selectors.len(), "Added selectors");
        Ok(())
    }

    fn replace(&mut self, facet: Address, selectors: &[Selector]) -> Result<(), DiamondError> {
        self.require_code(facet)?;

        for &selector in selectors {
            let current = self.staged.lookup(selector);
            if current == Some(self.diamond) {
                return Err(DiamondError::CannotReplaceImmutableFunction { selector });
            }
            if current == Some(facet) {
                return Err(
                    DiamondError::CannotReplaceFunctionWithTheSameFunctionFromTheSameFacet {
                        selector,
                    },
                );
            }
            if current.is_none() {
                return Err(DiamondError::CannotReplaceFunctionThatDoesNotExists { selector });
            }
            self.staged
                .update_facet(selector, facet)
                .map_err(|_| DiamondError::CannotReplaceFunctionThatDoesNotExists { selector })?;
            self.summary.replaced += 1;
        }

        debug!(facet = %facet, count = selectors.len(), "Replaced selectors");
        Ok(())
    }

    fn remove(&mut self, facet: Address, selectors: &[Selector]) -> Result<(), DiamondError> {
        if !facet.is_zero() {
            return Err(DiamondError::RemoveFacetAddressMustBeZeroAddress { facet });
        }

        for &selector in selectors {
            match self.staged.lookup(selector) {
                None => {
                    return Err(DiamondError::CannotRemoveFunctionThatDoesNotExist { selector })
                }
                Some(current) if current == self.diamond => {
                    return Err(DiamondError::CannotRemoveImmutableFunction { selector })
                }
                Some(_) => {}
            }
            self.staged
                .remove(selector)
                .map_err(|_| DiamondError::CannotRemoveFunctionThatDoesNotExist { selector })?;
            self.summary.removed += 1;
        }

        debug!(count = selectors.len(), "Removed selectors");
        Ok(())
    }
}

/// Applies `cuts` to `registry` atomically.
///
/// Convenience wrapper over [`CutProcessor`].
///
/// # Errors
///
/// See [`CutProcessor::apply`].
pub fn apply_cuts<F>(
    registry: &mut SelectorRegistry,
    diamond: Address,
    max_selectors: usize,
    has_code: F,
    cuts: &[FacetCut],
) -> Result<CutSummary, DiamondError>
where
    F: Fn(Address) -> bool,
{
    CutProcessor::new(registry, diamond, max_selectors, has_code).apply(cuts)
}

// =============================================================================
// TESTS
// =============================================================================
