//! Broadcast gateway fanning relay messages out to connected browsers.
//!
//! Each browser connection holds a [`Channel`]. The gateway keeps one
//! bounded broadcast queue; every channel reads from it at its own pace. A
//! channel that falls more than the queue capacity behind skips ahead and
//! loses the events in between, without slowing anyone else down.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tdrelay_core::{RelayMessage, RelaySink, TD_DATA_EVENT};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

/// Event sent to browser clients.
#[derive(Debug, Clone, Serialize)]
pub struct RelayEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    /// Milliseconds since the UNIX epoch at broadcast time.
    pub timestamp: f64,
    pub data: RelayMessage,
}

impl RelayEvent {
    /// Wrap a relay message as a `td-data` event stamped with the current time.
    pub fn td_data(data: RelayMessage) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);

        Self {
            event_type: TD_DATA_EVENT,
            timestamp,
            data,
        }
    }

    /// JSON text of the event, as written to the WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Bookkeeping for one connected channel.
#[derive(Debug, Clone, Copy)]
struct ClientInfo {
    /// Connection order, used to list clients oldest first.
    seq: u64,
    connected_at: Instant,
}

/// Owner of the set of open channels.
pub struct Gateway {
    tx: broadcast::Sender<Arc<RelayEvent>>,
    clients: Mutex<HashMap<Uuid, ClientInfo>>,
    next_seq: AtomicU64,
    broadcasts: AtomicU64,
}

impl Gateway {
    /// Create a gateway whose channels may each lag `capacity` events behind.
    pub fn new(capacity: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self {
            tx,
            clients: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            broadcasts: AtomicU64::new(0),
        })
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<Uuid, ClientInfo>> {
        self.clients.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open a new channel. It receives every event broadcast from now on.
    pub fn connect(self: &Arc<Self>) -> Channel {
        let id = Uuid::new_v4();
        let rx = {
            let mut clients = self.clients();
            clients.insert(
                id,
                ClientInfo {
                    seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                    connected_at: Instant::now(),
                },
            );
            self.tx.subscribe()
        };
        log::info!("[Socket] Browser connected: {}", id);

        Channel {
            id,
            rx,
            gateway: self.clone(),
        }
    }

    fn disconnect(&self, id: Uuid) {
        if let Some(info) = self.clients().remove(&id) {
            log::info!(
                "[Socket] Browser disconnected: {} (after {:.1}s)",
                id,
                info.connected_at.elapsed().as_secs_f64()
            );
        }
    }

    /// Send a `td-data` event to every open channel.
    ///
    /// Returns how many channels the event was queued for. Zero connected
    /// channels is not an error; the event is simply discarded.
    pub fn broadcast(&self, message: &RelayMessage) -> usize {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        let event = Arc::new(RelayEvent::td_data(message.clone()));
        self.tx.send(event).unwrap_or(0)
    }

    pub fn client_count(&self) -> usize {
        self.clients().len()
    }

    /// IDs of the open channels, oldest connection first.
    pub fn client_ids(&self) -> Vec<Uuid> {
        let clients = self.clients();
        let mut ids: Vec<(u64, Uuid)> = clients.iter().map(|(id, info)| (info.seq, *id)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Total number of broadcasts since startup.
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }
}

impl RelaySink for Gateway {
    fn relay(&self, message: &RelayMessage) {
        let delivered = self.broadcast(message);
        log::trace!("[Socket] {} -> {} client(s)", message.address, delivered);
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("clients", &self.client_count())
            .field("broadcasts", &self.broadcast_count())
            .finish_non_exhaustive()
    }
}

/// One connected client's view of the broadcast stream.
///
/// Dropping the channel disconnects it.
pub struct Channel {
    id: Uuid,
    rx: broadcast::Receiver<Arc<RelayEvent>>,
    gateway: Arc<Gateway>,
}

impl Channel {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next event. Returns `None` if the broadcast queue closed.
    pub async fn recv(&mut self) -> Option<Arc<RelayEvent>> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("[Socket] Browser {} lagged, skipped {} event(s)", self.id, missed);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<RelayEvent>> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    log::warn!("[Socket] Browser {} lagged, skipped {} event(s)", self.id, missed);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.gateway.disconnect(self.id);
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("id", &self.id).finish_non_exhaustive()
    }
}
