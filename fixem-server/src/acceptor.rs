//! TCP acceptor (C7): binds one listening socket per configured session and
//! spawns a blocking `SessionHandler` thread per accepted connection.
//!
//! Grounded on the original emulator's `FixEmulatorServer.Start`/
//! `HandleClient` accept loop, replacing its single global buffer/thread
//! pair with one `std::net::TcpListener` per session and an `OrderStore`
//! shared by every connection that listener ever accepts.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use fixem_config::{BehaviorLibrary, SessionBundle};
use fixem_core::{OrderStore, Result};
use fixem_scenario::RuleMatcher;
use fixem_session::{SessionHandler, SessionIdentity};

/// One bound, running session acceptor.
pub struct FixAcceptor {
    listener: TcpListener,
    identity: SessionIdentity,
    rule_matcher: Arc<RuleMatcher>,
    behaviors: Arc<BehaviorLibrary>,
    store: Arc<OrderStore>,
}

impl FixAcceptor {
    /// Bind `bundle`'s configured host:port and compile its execution rules.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound or a rule pattern in
    /// `bundle.execution` fails to compile.
    pub fn bind(bundle: &SessionBundle, behaviors: Arc<BehaviorLibrary>) -> Result<Self> {
        let addr = format!("{}:{}", bundle.connection.host, bundle.connection.port);
        let listener = TcpListener::bind(&addr)?;
        tracing::info!(addr, "FIX acceptor bound");

        let rule_matcher = Arc::new(RuleMatcher::compile(&bundle.execution)?);
        let identity = SessionIdentity {
            sender_comp_id: bundle.connection.sender_comp_id.clone(),
            target_comp_id: bundle.connection.target_comp_id.clone(),
            heartbeat_interval: bundle.connection.heartbeat_interval,
        };

        Ok(Self {
            listener,
            identity,
            rule_matcher,
            behaviors,
            store: Arc::new(OrderStore::new()),
        })
    }

    /// Accept connections forever, spawning one `std::thread` per client.
    /// Never returns under normal operation; a failed `accept()` is logged
    /// and retried rather than ending the loop.
    pub fn serve(&self) -> ! {
        let mut next_client_handle: u64 = 1;
        loop {
            match self.listener.accept() {
                Ok((socket, peer)) => {
                    let client_handle = next_client_handle;
                    next_client_handle += 1;
                    tracing::info!(client_handle, %peer, "accepted connection");
                    if let Err(e) = configure_socket(&socket) {
                        tracing::warn!(error = %e, "failed to configure accepted socket");
                    }

                    let identity = self.identity.clone();
                    let store = Arc::clone(&self.store);
                    let rule_matcher = Arc::clone(&self.rule_matcher);
                    let behaviors = Arc::clone(&self.behaviors);

                    std::thread::spawn(move || {
                        let mut handler = SessionHandler::new(
                            socket,
                            identity,
                            store,
                            rule_matcher,
                            behaviors,
                            client_handle,
                        );
                        handler.serve();
                        tracing::info!(client_handle, "session thread exiting");
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept() failed, retrying");
                }
            }
        }
    }
}

/// Disable Nagle's algorithm on an accepted socket, matching the low-latency
/// intent of a test tool that emits scripted execution reports with
/// millisecond-scale `delay` steps.
fn configure_socket(socket: &TcpStream) -> std::io::Result<()> {
    socket.set_nodelay(true)
}
