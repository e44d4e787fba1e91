//! # Adapters Module
//!
//! Infrastructure adapters implementing the outbound ports.

pub mod attestation;
pub mod descriptor;
pub mod event_pump;
pub mod registry;
pub mod transport;
pub mod wagmi;
