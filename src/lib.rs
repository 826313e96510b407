//! JustMaple client core
//!
//! Mirrors the authoritative tables into local entity views, tracks which
//! entities the local player owns, and streams player input back to the
//! server at a fixed cadence.

pub mod config;
pub mod net;
pub mod session;
pub mod util;
pub mod world;

pub use config::Config;
pub use session::SessionCoordinator;
