//! Connection hub: who is listening, and fan-out to them.
//!
//! One coordinator task owns both registries. Every operation is a message
//! to that task, so registration, removal and broadcast are totally ordered
//! and never race. Delivery never blocks: a connection whose queue is full
//! or closed is dropped on the spot.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A rendered payload, shared between all receivers of one broadcast.
pub type Payload = Arc<str>;

/// The two spectator registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    /// Browser spectators.
    WebSocket,
    /// Authenticated line sessions.
    Telnet,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WebSocket => "websocket",
            Self::Telnet => "telnet",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The hub's end of one connection.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub pool: Pool,
    sender: mpsc::Sender<Payload>,
}

impl Connection {
    /// Creates a connection with a bounded outbound queue. The caller keeps
    /// the receiver and hands the connection to [`Hub::register`].
    #[must_use]
    pub fn open(pool: Pool, capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: ConnectionId::new(),
            pool,
            sender,
        };
        (conn, receiver)
    }
}

/// Registry sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub websocket: usize,
    pub telnet: usize,
}

enum HubMsg {
    Register(Connection),
    Unregister(ConnectionId),
    Broadcast(Payload),
    SendTo(ConnectionId, Payload),
    Membership(oneshot::Sender<Membership>),
}

/// Handle to the hub coordinator. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Hub {
    tx: mpsc::UnboundedSender<HubMsg>,
}

impl Hub {
    /// Spawns the coordinator task. It stops once every handle is dropped.
    #[must_use]
    pub fn spawn() -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(coordinate(rx));
        (Self { tx }, task)
    }

    pub fn register(&self, conn: Connection) {
        self.post(HubMsg::Register(conn));
    }

    /// Removes a connection and closes its queue. Unknown ids are ignored.
    pub fn unregister(&self, id: ConnectionId) {
        self.post(HubMsg::Unregister(id));
    }

    /// Offers `payload` to every connection in both pools.
    pub fn broadcast(&self, payload: impl Into<Payload>) {
        self.post(HubMsg::Broadcast(payload.into()));
    }

    /// Offers `payload` to one connection, with the same drop policy as
    /// [`Hub::broadcast`].
    pub fn send_to(&self, id: ConnectionId, payload: impl Into<Payload>) {
        self.post(HubMsg::SendTo(id, payload.into()));
    }

    /// Current registry sizes; all zero once the coordinator has stopped.
    pub async fn membership(&self) -> Membership {
        let (reply, rx) = oneshot::channel();
        self.post(HubMsg::Membership(reply));
        rx.await.unwrap_or_default()
    }

    fn post(&self, msg: HubMsg) {
        if self.tx.send(msg).is_err() {
            warn!("hub coordinator has stopped");
        }
    }
}

#[derive(Default)]
struct Registry {
    websocket: HashMap<ConnectionId, mpsc::Sender<Payload>>,
    telnet: HashMap<ConnectionId, mpsc::Sender<Payload>>,
}

impl Registry {
    fn pool_mut(&mut self, pool: Pool) -> &mut HashMap<ConnectionId, mpsc::Sender<Payload>> {
        match pool {
            Pool::WebSocket => &mut self.websocket,
            Pool::Telnet => &mut self.telnet,
        }
    }

    fn insert(&mut self, conn: Connection) {
        info!(connection_id = %conn.id, pool = %conn.pool, "connection registered");
        self.pool_mut(conn.pool).insert(conn.id, conn.sender);
    }

    /// Dropping the sender closes the queue; a second call finds nothing.
    fn remove(&mut self, id: ConnectionId) -> bool {
        let removed = self.websocket.remove(&id).or_else(|| self.telnet.remove(&id));
        removed.is_some()
    }

    fn deliver(&mut self, payload: &Payload) {
        let mut dropped = Vec::new();
        for (id, sender) in self.websocket.iter().chain(self.telnet.iter()) {
            if let Err(e) = sender.try_send(Arc::clone(payload)) {
                dropped.push((*id, e));
            }
        }
        for (id, err) in dropped {
            self.remove(id);
            warn!(connection_id = %id, error = %err, "connection dropped during broadcast");
        }
    }

    fn deliver_to(&mut self, id: ConnectionId, payload: Payload) {
        let Some(sender) = self.websocket.get(&id).or_else(|| self.telnet.get(&id)) else {
            debug!(connection_id = %id, "send to unknown connection ignored");
            return;
        };
        if let Err(e) = sender.try_send(payload) {
            self.remove(id);
            warn!(connection_id = %id, error = %e, "connection dropped on direct send");
        }
    }

    fn membership(&self) -> Membership {
        Membership {
            websocket: self.websocket.len(),
            telnet: self.telnet.len(),
        }
    }
}

async fn coordinate(mut rx: mpsc::UnboundedReceiver<HubMsg>) {
    let mut registry = Registry::default();
    while let Some(msg) = rx.recv().await {
        match msg {
            HubMsg::Register(conn) => registry.insert(conn),
            HubMsg::Unregister(id) => {
                if registry.remove(id) {
                    info!(connection_id = %id, "connection unregistered");
                }
            }
            HubMsg::Broadcast(payload) => registry.deliver(&payload),
            HubMsg::SendTo(id, payload) => registry.deliver_to(id, payload),
            HubMsg::Membership(reply) => {
                let _ = reply.send(registry.membership());
            }
        }
    }
    debug!("hub coordinator stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_unregister_counts() {
        let (hub, _task) = Hub::spawn();
        let (ws, _ws_rx) = Connection::open(Pool::WebSocket, 4);
        let (telnet, _telnet_rx) = Connection::open(Pool::Telnet, 4);
        let ws_id = ws.id;

        hub.register(ws);
        hub.register(telnet);
        assert_eq!(
            hub.membership().await,
            Membership {
                websocket: 1,
                telnet: 1
            }
        );

        hub.unregister(ws_id);
        hub.unregister(ws_id);
        assert_eq!(
            hub.membership().await,
            Membership {
                websocket: 0,
                telnet: 1
            }
        );
    }

    #[tokio::test]
    async fn test_unregister_closes_queue() {
        let (hub, _task) = Hub::spawn();
        let (conn, mut rx) = Connection::open(Pool::Telnet, 4);
        let id = conn.id;
        hub.register(conn);
        hub.send_to(id, "hello");
        hub.unregister(id);

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_to_reaches_only_target() {
        let (hub, _task) = Hub::spawn();
        let (a, mut a_rx) = Connection::open(Pool::WebSocket, 4);
        let (b, mut b_rx) = Connection::open(Pool::WebSocket, 4);
        let a_id = a.id;
        hub.register(a);
        hub.register(b);

        hub.send_to(a_id, "just you");
        hub.broadcast("everyone");
        hub.membership().await;

        assert_eq!(a_rx.recv().await.as_deref(), Some("just you"));
        assert_eq!(a_rx.recv().await.as_deref(), Some("everyone"));
        assert_eq!(b_rx.recv().await.as_deref(), Some("everyone"));
    }
}
