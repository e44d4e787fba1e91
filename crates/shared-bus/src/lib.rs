//! # Shared Bus - Subscription Bus for Host Events
//!
//! The native host never returns values: every response and every
//! unsolicited notification arrives as a named event. This crate is the
//! process-wide pub/sub those events travel through.
//!
//! ```text
//! ┌──────────────┐   publish(name, payload)   ┌──────────────────┐
//! │  Host Event  │ ─────────────────────────→ │ Subscription Bus │
//! │    Pump      │                            │                  │
//! └──────────────┘                            └────────┬─────────┘
//!                                                      │ in registration order
//!                           ┌──────────────────────────┼──────────────────────┐
//!                           ↓                          ↓                      ↓
//!                 [Correlation Engine]         [App listener]         [App listener]
//! ```
//!
//! ## Dispatch Rules
//!
//! - Listeners run synchronously, in registration order.
//! - A listener that fails (returns an error or panics) is logged and skipped;
//!   the remaining listeners still run.
//! - Any number of listeners may share one event name.

pub mod publisher;
pub mod subscriber;

pub use publisher::{EventPublisher, SubscriptionBus};
pub use subscriber::{Listener, ListenerError, Subscription};
