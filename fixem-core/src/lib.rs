//! Shared error, order, and store types for the FixEm FIX 4.2 emulator.
//!
//! This crate has no network or scenario logic of its own; it is the
//! common ground every other crate in the workspace builds on, the way
//! `alpaca-base` underlies the teacher's HTTP/WebSocket/FIX client crates.

/// Shared error type and result alias.
pub mod error;
/// Order record and lifecycle enums.
pub mod order;
/// Process-wide, mutex-guarded order store.
pub mod store;

pub use error::{FixemError, Result};
pub use order::{ExecType, OrdStatus, OrdType, OrderRecord, OrderSide};
pub use store::OrderStore;
