//! # Domain Layer
//!
//! Message format, field validation and signature recovery.
//! No I/O; time is passed in by the caller.

pub mod ecdsa;
pub mod entities;
pub mod errors;
pub mod message;
pub mod validation;
