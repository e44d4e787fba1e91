//! # Adapters Module
//!
//! Default implementations of the outbound ports.

pub mod clock;
pub mod ownership;
