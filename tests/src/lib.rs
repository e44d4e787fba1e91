//! # MiniKit Bridge Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs              # Simulated native host, in-memory wallet
//! └── integration/
//!     ├── native_flows.rs     # Bridge ↔ simulated host over the bus
//!     └── fallback_flows.rs   # Plain-browser flows through fallback adapters
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mk-tests
//! cargo test -p mk-tests integration::native_flows
//! ```

pub mod integration;
pub mod support;
