//! # Domain Layer (Inner Hexagon)
//!
//! Pure logic of the diamond core: selector registry, cut processor,
//! initializer guard, invariants and the ABI codec.
//! NO I/O, NO async.

pub mod abi;
pub mod cut;
pub mod entities;
pub mod initializer;
pub mod invariants;
pub mod registry;
pub mod services;
pub mod value_objects;

pub use cut::*;
pub use entities::*;
pub use initializer::*;
pub use invariants::*;
pub use registry::*;
pub use services::*;
pub use value_objects::*;
