//! Cross-crate integration flows.

mod fallback_flows;
mod native_flows;
