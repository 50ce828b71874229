use std::net::SocketAddr;

/// Lifecycle and connection events for an external observer, such as a
/// status display. Every method defaults to doing nothing.
///
/// Callbacks run on server tasks and must not block.
pub trait ServerObserver: Send + Sync {
    fn on_started(&self, _addr: SocketAddr) {}

    fn on_stopped(&self) {}

    /// Called with the new total after every connect and disconnect.
    fn on_connection_count(&self, _count: usize) {}
}

pub struct NoOpObserver;

impl ServerObserver for NoOpObserver {}
