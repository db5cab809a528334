//! Per-connection FIX session and order-lifecycle state machine (C6) for
//! the FixEm FIX 4.2 emulator: the message loop that dispatches Logon,
//! Heartbeat, Logout, NewOrderSingle, OrderCancelRequest, and
//! OrderCancelReplaceRequest, and that drives the scenario engine after
//! order acceptance.

/// Frame extraction from a growing read buffer.
pub mod framing;
/// Session handler: the per-connection state machine.
pub mod handler;
/// Outbound sequence counter and session identity.
pub mod state;

pub use handler::SessionHandler;
pub use state::{OutboundSeq, SessionIdentity};
