// src/reload/hub.rs

use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

/// Identifies one live reload client for the lifetime of the process.
///
/// Ids are never reused, so unsubscribing twice or after the client was
/// dropped is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientHandle(u64);

impl ClientHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Open push connections and broadcast of changed output paths.
///
/// Best-effort, at-most-once delivery: no acknowledgement, no replay, no
/// per-client backlog beyond the channel to its connection task. Messages
/// to a single client arrive in order.
#[derive(Debug, Default)]
pub struct LiveReloadHub {
    clients: BTreeMap<u64, mpsc::UnboundedSender<String>>,
    next_id: u64,
}

impl LiveReloadHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client and return its handle plus the receiving end of
    /// its message stream.
    pub fn subscribe(&mut self) -> (ClientHandle, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (self.attach(tx), rx)
    }

    /// Register a client whose connection task already owns the receiver.
    pub fn attach(&mut self, tx: mpsc::UnboundedSender<String>) -> ClientHandle {
        let handle = ClientHandle(self.next_id);
        self.next_id += 1;
        self.clients.insert(handle.0, tx);
        debug!(client = %handle, clients = self.clients.len(), "live reload client subscribed");
        handle
    }

    /// Remove a client. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, handle: ClientHandle) -> bool {
        let removed = self.clients.remove(&handle.0).is_some();
        if removed {
            debug!(client = %handle, clients = self.clients.len(), "live reload client unsubscribed");
        }
        removed
    }

    /// Send `path` (relative to the output root) to every open client.
    ///
    /// A client whose connection has gone away is dropped without affecting
    /// delivery to the others. Returns the number of clients reached.
    pub fn notify(&mut self, path: &str) -> usize {
        let mut delivered = 0;
        self.clients.retain(|id, tx| match tx.send(path.to_string()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                debug!(client = id, "live reload client gone; dropping");
                false
            }
        });
        debug!(path, delivered, "live reload notification sent");
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}
