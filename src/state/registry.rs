//! Registry of live WebSocket connections and the heartbeat liveness sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Bytes;
use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

/// Identifier assigned to a connection when it is accepted.
pub type ClientId = Uuid;

#[derive(Clone)]
/// Handle used to push messages to a connected client and to track its
/// liveness.
///
/// The liveness flag is cleared by each heartbeat sweep and set again by the
/// peer's pong reply; a connection that stays false across two sweeps is
/// evicted. The shutdown notify forces the socket task to wind down when the
/// registry terminates the connection.
pub struct ClientConnection {
    id: ClientId,
    tx: mpsc::UnboundedSender<Message>,
    alive: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl ClientConnection {
    /// Create a handle for a freshly accepted connection. It starts alive.
    pub fn new(id: ClientId, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            tx,
            alive: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Identifier of this connection.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Outbound writer channel for this connection.
    pub fn sender(&self) -> mpsc::UnboundedSender<Message> {
        self.tx.clone()
    }

    /// Shared liveness flag, set by the socket task on pong replies.
    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alive)
    }

    /// Shared shutdown signal the socket task selects on.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Whether the writer side of this connection is still open.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Process-wide set of live connections.
///
/// Owns every [`ClientConnection`] for its lifetime: handles are inserted on
/// accept and removed on close, error, or failed liveness check. Constructed
/// at startup and torn down via [`ConnectionRegistry::close_all`].
#[derive(Default)]
pub struct ConnectionRegistry {
    clients: DashMap<ClientId, ClientConnection>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly accepted connection.
    pub fn register(&self, connection: ClientConnection) {
        self.clients.insert(connection.id, connection);
    }

    /// Stop tracking a connection, returning its handle if it was present.
    pub fn unregister(&self, id: &ClientId) -> Option<ClientConnection> {
        self.clients.remove(id).map(|(_, connection)| connection)
    }

    /// Writer channel of a tracked connection, if still registered.
    pub fn sender_of(&self, id: &ClientId) -> Option<mpsc::UnboundedSender<Message>> {
        self.clients.get(id).map(|entry| entry.sender())
    }

    /// Snapshot of every connection whose writer is still open.
    pub fn live_connections(&self) -> Vec<(ClientId, mpsc::UnboundedSender<Message>)> {
        self.clients
            .iter()
            .filter(|entry| entry.is_open())
            .map(|entry| (entry.id, entry.sender()))
            .collect()
    }

    /// Number of tracked connections.
    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    /// Run one heartbeat sweep over the registry.
    ///
    /// Connections whose liveness flag is still cleared from the previous
    /// sweep are terminated and returned for subscription cleanup. Survivors
    /// get their flag cleared and a ping queued; any pong reply sets it again
    /// before the next sweep.
    pub fn sweep(&self) -> Vec<ClientId> {
        let mut evicted = Vec::new();
        let mut survivors = Vec::new();

        for entry in self.clients.iter() {
            if entry.alive.swap(false, Ordering::AcqRel) {
                survivors.push(entry.sender());
            } else {
                evicted.push(entry.id);
            }
        }

        for id in &evicted {
            if let Some((_, connection)) = self.clients.remove(id) {
                connection.shutdown.notify_one();
            }
        }

        for tx in survivors {
            let _ = tx.send(Message::Ping(Bytes::new()));
        }

        evicted
    }

    /// Close every tracked connection. Used during process shutdown.
    pub fn close_all(&self) -> usize {
        let handles: Vec<ClientConnection> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.clients.clear();

        for connection in &handles {
            let _ = connection.tx.send(Message::Close(None));
            connection.shutdown.notify_one();
        }

        handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_connection() -> (ClientConnection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ClientConnection::new(Uuid::new_v4(), tx), rx)
    }

    #[test]
    fn register_and_unregister() {
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = test_connection();
        let id = connection.id();

        registry.register(connection);
        assert_eq!(registry.connection_count(), 1);
        assert!(registry.sender_of(&id).is_some());

        assert!(registry.unregister(&id).is_some());
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.unregister(&id).is_none());
    }

    #[test]
    fn first_sweep_pings_and_clears_the_flag() {
        let registry = ConnectionRegistry::new();
        let (connection, mut rx) = test_connection();
        let alive = connection.liveness();
        registry.register(connection);

        let evicted = registry.sweep();
        assert!(evicted.is_empty());
        assert!(!alive.load(Ordering::Acquire));
        assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));
    }

    #[test]
    fn silent_connection_is_evicted_on_the_second_sweep() {
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = test_connection();
        let id = connection.id();
        registry.register(connection);

        assert!(registry.sweep().is_empty());
        // No pong arrives before the next sweep.
        assert_eq!(registry.sweep(), vec![id]);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn pong_reply_keeps_the_connection_alive() {
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = test_connection();
        let alive = connection.liveness();
        registry.register(connection);

        for _ in 0..3 {
            assert!(registry.sweep().is_empty());
            // The socket task records the peer's pong.
            alive.store(true, Ordering::Release);
        }
        assert_eq!(registry.connection_count(), 1);
    }

    #[test]
    fn close_all_empties_the_registry() {
        let registry = ConnectionRegistry::new();
        let (first, mut first_rx) = test_connection();
        let (second, _second_rx) = test_connection();
        registry.register(first);
        registry.register(second);

        assert_eq!(registry.close_all(), 2);
        assert_eq!(registry.connection_count(), 0);
        assert!(matches!(first_rx.try_recv(), Ok(Message::Close(None))));
    }
}
