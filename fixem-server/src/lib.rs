//! TCP acceptor (C7) for the FixEm FIX 4.2 emulator: one blocking
//! `TcpListener` per configured session, one OS thread per accepted
//! connection.

/// Listener bind/accept loop and per-connection thread spawning.
pub mod acceptor;

pub use acceptor::FixAcceptor;
