//! UDP listener feeding decoded OSC data to a relay sink.

use crate::decode::decode_packet;
use crate::error::Result;
use crate::message::RelayMessage;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{ToSocketAddrs, UdpSocket};

/// Large enough for any UDP payload.
const RECV_BUFFER_SIZE: usize = 65536;

/// Destination for decoded relay messages.
pub trait RelaySink: Send + Sync {
    /// Forward one message. Delivery is best-effort; the sink must not block.
    fn relay(&self, message: &RelayMessage);
}

impl<T: RelaySink + ?Sized> RelaySink for Arc<T> {
    fn relay(&self, message: &RelayMessage) {
        (**self).relay(message)
    }
}

/// Counters maintained by the listener.
#[derive(Debug, Default)]
pub struct ListenerStats {
    received: AtomicU64,
    relayed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`ListenerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Datagrams received.
    pub received: u64,
    /// Messages handed to the sink.
    pub relayed: u64,
    /// Datagrams or messages dropped as undecodable.
    pub dropped: u64,
}

impl ListenerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            relayed: self.relayed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// OSC receiver bound to a UDP port.
pub struct OscListener {
    socket: UdpSocket,
    stats: Arc<ListenerStats>,
}

impl OscListener {
    /// Bind the UDP socket.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket))
    }

    /// Wrap an already-bound socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self {
            socket,
            stats: Arc::new(ListenerStats::default()),
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Shared handle to the listener's counters.
    pub fn stats(&self) -> Arc<ListenerStats> {
        self.stats.clone()
    }

    /// Receive datagrams forever, relaying every decodable message to `sink`.
    ///
    /// Bad packets and receive errors are logged and skipped. The loop only
    /// ends when the future is dropped.
    pub async fn run<S: RelaySink + ?Sized>(&self, sink: &S) -> Result<()> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((size, peer)) => self.handle_datagram(&buf[..size], peer, sink),
                Err(err) => {
                    // Windows reports ICMP port-unreachable as a recv error on UDP.
                    log::warn!("OSC recv error: {}", err);
                }
            }
        }
    }

    /// Decode one datagram and relay its messages.
    pub fn handle_datagram<S: RelaySink + ?Sized>(&self, bytes: &[u8], peer: SocketAddr, sink: &S) {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let decoded = match decode_packet(bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("[OSC] Dropping datagram from {}: {}", peer, err);
                return;
            }
        };

        for err in &decoded.skipped {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("[OSC] Skipping message from {}: {}", peer, err);
        }

        for message in &decoded.messages {
            log::trace!("[OSC] {} = {}", message.address, message.value);
            sink.relay(message);
            self.stats.relayed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for OscListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscListener")
            .field("local_addr", &self.socket.local_addr().ok())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{encoder, OscMessage, OscPacket, OscType};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectingSink {
        messages: Mutex<Vec<RelayMessage>>,
    }

    impl RelaySink for CollectingSink {
        fn relay(&self, message: &RelayMessage) {
            self.messages.lock().unwrap().push(message.clone());
        }
    }

    impl CollectingSink {
        fn take(&self) -> Vec<RelayMessage> {
            std::mem::take(&mut *self.messages.lock().unwrap())
        }
    }

    fn packet(addr: &str, args: Vec<OscType>) -> Vec<u8> {
        encoder::encode(&OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        }))
        .unwrap()
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    #[tokio::test]
    async fn test_handle_datagram_counts() {
        let listener = OscListener::bind("127.0.0.1:0").await.unwrap();
        let sink = CollectingSink::default();

        listener.handle_datagram(&packet("/pinch", vec![OscType::Float(0.42)]), peer(), &sink);
        listener.handle_datagram(&packet("/pinch", vec![]), peer(), &sink);
        listener.handle_datagram(b"garbage", peer(), &sink);

        assert_eq!(sink.take(), vec![RelayMessage::new("/pinch", 0.42f32)]);
        assert_eq!(
            listener.stats().snapshot(),
            StatsSnapshot {
                received: 3,
                relayed: 1,
                dropped: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_run_relays_over_udp_in_order() {
        let listener = OscListener::bind("127.0.0.1:0").await.unwrap();
        let target = listener.local_addr().unwrap();
        let sink = Arc::new(CollectingSink::default());

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let send = async {
            sender
                .send_to(&packet("/handY", vec![OscType::Float(0.5)]), target)
                .await
                .unwrap();
            // A bad packet in the middle must not stop the loop.
            sender.send_to(&packet("/empty", vec![]), target).await.unwrap();
            sender.send_to(b"\x00\x01junk", target).await.unwrap();
            sender
                .send_to(&packet("/palmRX", vec![OscType::Int(12)]), target)
                .await
                .unwrap();

            for _ in 0..100 {
                if sink.messages.lock().unwrap().len() >= 2 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };

        tokio::select! {
            result = listener.run(&sink) => panic!("listener stopped: {:?}", result),
            _ = send => {}
        }

        assert_eq!(
            sink.take(),
            vec![
                RelayMessage::new("/handY", 0.5f32),
                RelayMessage::new("/palmRX", 12),
            ]
        );
        assert_eq!(listener.stats().snapshot().dropped, 2);
    }
}
