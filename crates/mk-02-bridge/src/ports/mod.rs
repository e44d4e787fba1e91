//! # Ports Layer
//!
//! - **Inbound (Driving)**: [`inbound::BridgeApi`], what mini-app code calls
//! - **Outbound (Driven)**: native channel, host descriptor, fallback
//!   adapters and the wallet/proof services behind them

pub mod inbound;
pub mod outbound;
