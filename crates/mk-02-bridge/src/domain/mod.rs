//! # Domain Layer
//!
//! Error taxonomy, configuration, negotiation rules, the pending-request
//! table and local input checks.

pub mod config;
pub mod errors;
pub mod negotiation;
pub mod pending;
pub mod validation;
