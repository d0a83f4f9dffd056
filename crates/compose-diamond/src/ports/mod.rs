//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions at the seams of the diamond core.
//!
//! - **Driving Ports (Inbound)**: `DiamondApi`
//! - **Driven Ports (Outbound)**: `FacetHost`, `FacetCode`, `EventSink`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
