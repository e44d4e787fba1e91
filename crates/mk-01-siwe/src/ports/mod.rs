//! # Ports Layer
//!
//! - **Inbound (Driving)**: API that callers use
//! - **Outbound (Driven)**: clock and ownership lookups this crate needs

pub mod inbound;
pub mod outbound;
