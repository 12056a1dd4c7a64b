//! Request handlers
//!
//! Thin adapters over the workflow services in `wishbox-common`; no business
//! logic lives here.

pub mod health;
pub mod settings;
pub mod submissions;
