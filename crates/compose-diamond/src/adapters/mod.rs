//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports, plus the JSON event
//! handler sitting in front of the service.

pub mod event_handler;
pub mod event_log;
pub mod facet_host;
pub mod fn_facet;

pub use event_handler::*;
pub use event_log::*;
pub use facet_host::*;
pub use fn_facet::*;
