use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::actor_ref::BasicActorRef;
use crate::dead_letter::DeadLetterOffice;
use crate::error::CorvidError;
use crate::event_bus::{Event, EventBus};
use crate::path::{NodeId, Path};
use crate::sysmsg::{Reason, SystemMsg};
use crate::watch::RemoteWatchRegistry;

pub const KIND_USER: u8 = 0x01;
pub const KIND_SYSTEM: u8 = 0x02;
pub const KIND_PING: u8 = 0x03;
pub const KIND_PONG: u8 = 0x04;

/// One wire frame: `<1 byte kind><4 byte BE len><sender NodeId NUL><recipient
/// path NUL><payload>`. Normative framing per the remoting component design.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub kind: u8,
    pub sender: NodeId,
    pub recipient: Path,
    pub payload: Vec<u8>,
}

pub fn encode(frame: &Frame) -> Vec<u8> {
    let sender = frame.sender.as_str().as_bytes();
    let recipient = format!("{}", frame.recipient);
    let recipient = recipient.as_bytes();

    let mut out = Vec::with_capacity(1 + 4 + sender.len() + 1 + recipient.len() + 1 + frame.payload.len());
    out.push(frame.kind);
    out.extend_from_slice(&(frame.payload.len() as u32).to_be_bytes());
    out.extend_from_slice(sender);
    out.push(0);
    out.extend_from_slice(recipient);
    out.push(0);
    out.extend_from_slice(&frame.payload);
    out
}

pub fn decode(bytes: &[u8]) -> Result<Frame, CorvidError> {
    if bytes.len() < 5 {
        return Err(CorvidError::DeliveryFailed(Path::root()));
    }
    let kind = bytes[0];
    let len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let rest = &bytes[5..];

    let sender_end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| CorvidError::DeliveryFailed(Path::root()))?;
    let sender = std::str::from_utf8(&rest[..sender_end])
        .map_err(|_| CorvidError::InvalidNodeId("non-utf8 sender".into()))?;
    let sender = NodeId::parse(sender)?;

    let after_sender = &rest[sender_end + 1..];
    let recipient_end = after_sender
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| CorvidError::DeliveryFailed(Path::root()))?;
    let recipient = std::str::from_utf8(&after_sender[..recipient_end])
        .map_err(|_| CorvidError::InvalidPath("non-utf8 recipient".into()))?;
    let recipient = Path::parse(recipient)?;

    let payload_start = recipient_end + 1;
    let payload = after_sender
        .get(payload_start..payload_start + len)
        .ok_or_else(|| CorvidError::DeliveryFailed(recipient.clone()))?
        .to_vec();

    Ok(Frame { kind, sender, recipient, payload })
}

/// Host-provided byte pipe between node identities. Everything about sockets,
/// reconnection, and serialization lives on the other side of this trait.
pub trait Transport: Send + Sync {
    fn send_frame(&self, node: &NodeId, frame: &[u8]) -> std::io::Result<()>;
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum PeerState {
    Connecting,
    Up,
    Down,
    Backoff,
}

struct PeerEntry {
    state: PeerState,
    last_seen: Instant,
    outbound: Mutex<VecDeque<Frame>>,
}

pub struct HubInner {
    node_id: NodeId,
    peers: DashMap<NodeId, PeerEntry>,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    watch_registry: RemoteWatchRegistry,
    bus: EventBus,
    dead_letters: DeadLetterOffice,
    log: slog::Logger,
    max_inflight: usize,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
}

/// Cheap handle passed around by `Ref::Remote`; cloning shares the same peer
/// table and buffers.
#[derive(Clone)]
pub struct HubHandle {
    inner: Arc<HubInner>,
}

impl HubHandle {
    pub fn new(
        node_id: NodeId,
        bus: EventBus,
        dead_letters: DeadLetterOffice,
        log: slog::Logger,
        max_inflight: usize,
        heartbeat_interval: Duration,
        heartbeat_timeout: Duration,
    ) -> Self {
        HubHandle {
            inner: Arc::new(HubInner {
                node_id,
                peers: DashMap::new(),
                transport: Mutex::new(None),
                watch_registry: RemoteWatchRegistry::new(),
                bus,
                dead_letters,
                log,
                max_inflight,
                heartbeat_interval,
                heartbeat_timeout,
            }),
        }
    }

    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        *self.inner.transport.lock().unwrap() = Some(transport);
    }

    fn ensure_peer(&self, node: &NodeId) {
        self.inner.peers.entry(node.clone()).or_insert_with(|| PeerEntry {
            state: PeerState::Connecting,
            last_seen: Instant::now(),
            outbound: Mutex::new(VecDeque::new()),
        });
    }

    pub fn peer_state(&self, node: &NodeId) -> Option<PeerState> {
        self.inner.peers.get(node).map(|e| e.state)
    }

    /// Called by the Hub's owner when a frame (data, ping, or pong) arrives
    /// from `node` — any inbound frame reinstates `Up`.
    pub fn on_inbound_frame(&self, node: &NodeId, frame: Frame) {
        self.ensure_peer(node);
        if let Some(mut entry) = self.inner.peers.get_mut(node) {
            let was_down = entry.state == PeerState::Down;
            entry.state = PeerState::Up;
            entry.last_seen = Instant::now();
            if was_down {
                slog::info!(self.inner.log, "peer back up"; "node" => %node);
            }
        }

        match frame.kind {
            KIND_PING => {
                let pong = Frame {
                    kind: KIND_PONG,
                    sender: self.inner.node_id.clone(),
                    recipient: frame.recipient.clone(),
                    payload: Vec::new(),
                };
                self.transmit(node, &pong);
            }
            KIND_PONG => {}
            _ => {
                self.inner.bus.publish(Event::MessageReceived {
                    recipient: frame.recipient,
                    sender: Some(Path::root().with_node(frame.sender.clone())),
                });
            }
        }
    }

    /// Sends a pre-encoded payload (the serializer lives outside the kernel;
    /// see the scope note on `Ref::tell_any`).
    pub(crate) fn send_any(&self, node: &NodeId, path: &Path, msg: Box<dyn Any + Send>) {
        match msg.downcast::<Vec<u8>>() {
            Ok(bytes) => self.send_bytes(node, path, KIND_USER, *bytes),
            Err(_) => {
                self.inner.dead_letters.publish(
                    path.clone(),
                    "remote send requires a pre-encoded Vec<u8> payload".to_string(),
                );
            }
        }
    }

    pub fn send_bytes(&self, node: &NodeId, path: &Path, kind: u8, payload: Vec<u8>) {
        self.ensure_peer(node);
        let frame = Frame {
            kind,
            sender: self.inner.node_id.clone(),
            recipient: path.clone(),
            payload,
        };

        let state = self.inner.peers.get(node).map(|e| e.state).unwrap_or(PeerState::Down);
        if state != PeerState::Up {
            let mut entry = self.inner.peers.get_mut(node).unwrap();
            let mut buf = entry.outbound.lock().unwrap();
            if buf.len() >= self.inner.max_inflight {
                drop(buf);
                drop(entry);
                self.inner
                    .dead_letters
                    .publish(path.clone(), "hub outbound buffer overflow".to_string());
                return;
            }
            buf.push_back(frame);
            return;
        }

        self.transmit(node, &frame);
    }

    fn transmit(&self, node: &NodeId, frame: &Frame) {
        let transport = self.inner.transport.lock().unwrap().clone();
        match transport {
            Some(t) => {
                if t.send_frame(node, &encode(frame)).is_err() {
                    self.mark_down(node);
                }
            }
            None => self.mark_down(node),
        }
    }

    fn mark_down(&self, node: &NodeId) {
        let mut went_down = false;
        if let Some(mut entry) = self.inner.peers.get_mut(node) {
            if entry.state != PeerState::Down {
                entry.state = PeerState::Down;
                went_down = true;
            }
            let mut buf = entry.outbound.lock().unwrap();
            while let Some(frame) = buf.pop_front() {
                self.inner
                    .dead_letters
                    .publish(frame.recipient, "peer down, outbound buffer drained".to_string());
            }
        }
        if went_down {
            slog::warn!(self.inner.log, "peer marked down"; "node" => %node);
            for (path, watchers) in self.inner.watch_registry.take_for_node(node) {
                for watcher in watchers {
                    watcher.sys_tell(SystemMsg::Terminated(
                        local_proxy(&path),
                        Some(Reason::NodeLost),
                    ));
                }
            }
        }
    }

    pub fn register_watch(&self, node: NodeId, path: Path, watcher: BasicActorRef) {
        self.ensure_peer(&node);
        self.inner.watch_registry.register(node.clone(), path.clone(), watcher.clone());
        self.send_bytes(&node, &path, KIND_SYSTEM, b"watch".to_vec());
    }

    pub fn unregister_watch(&self, node: &NodeId, path: &Path, watcher: &BasicActorRef) {
        self.inner.watch_registry.unregister(node, path, watcher);
    }

    /// Runs the liveness loop: pings every Up peer every `heartbeat_interval`,
    /// and marks a peer Down once `heartbeat_timeout` has passed with no
    /// inbound frame. Intended to be spawned once onto the host Executor.
    pub async fn run_heartbeat(&self) {
        let mut ticker = tokio::time::interval(self.inner.heartbeat_interval);
        loop {
            ticker.tick().await;
            let now = Instant::now();
            let nodes: Vec<NodeId> = self.inner.peers.iter().map(|e| e.key().clone()).collect();
            for node in nodes {
                let (state, last_seen) = match self.inner.peers.get(&node) {
                    Some(e) => (e.state, e.last_seen),
                    None => continue,
                };
                if state == PeerState::Up {
                    if now.duration_since(last_seen) > self.inner.heartbeat_timeout {
                        self.mark_down(&node);
                    } else {
                        let ping = Frame {
                            kind: KIND_PING,
                            sender: self.inner.node_id.clone(),
                            recipient: Path::root(),
                            payload: Vec::new(),
                        };
                        self.transmit(&node, &ping);
                    }
                }
            }
        }
    }
}

/// A remote watcher never held a real local `BasicActorRef` for the far-side
/// actor to begin with; this builds a path-only stand-in purely so the
/// existing `SystemMsg::Terminated(BasicActorRef, _)` shape can carry the
/// dead path through to the watcher's mailbox loop.
pub(crate) fn local_proxy(path: &Path) -> BasicActorRef {
    let (tx, _rx) = futures::channel::mpsc::unbounded();
    let (mailbox, _reader) = crate::kernel::queue::queue::<()>();
    BasicActorRef::new(0, path.clone(), None, tx, mailbox, Arc::new(tokio::sync::Notify::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let frame = Frame {
            kind: KIND_USER,
            sender: NodeId::parse("127.0.0.1:9000").unwrap(),
            recipient: Path::parse("/user/worker").unwrap(),
            payload: vec![1, 2, 3, 4, 5],
        };
        let bytes = encode(&frame);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn frame_round_trip_empty_payload() {
        let frame = Frame {
            kind: KIND_PING,
            sender: NodeId::parse("10.0.0.1:1").unwrap(),
            recipient: Path::root(),
            payload: Vec::new(),
        };
        let bytes = encode(&frame);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn decode_rejects_truncated_frame() {
        assert!(decode(&[1, 0, 0]).is_err());
    }

    /// S4: a peer transitioning to Down must fan out a synthetic
    /// `Terminated(.., NodeLost)` naming the dead path to every local watcher
    /// registered against that peer, and must clear the registration so a
    /// later reconnect starts from an empty watch set (§9.1 resolution 2).
    #[test]
    fn peer_down_fans_out_node_lost_to_watchers() {
        let log = slog::Logger::root(slog::Discard, slog::o!());
        let bus = EventBus::new(log.clone());
        let dead_letters = DeadLetterOffice::new(bus.clone(), log.clone());
        let hub = HubHandle::new(
            NodeId::parse("127.0.0.1:1").unwrap(),
            bus,
            dead_letters,
            log,
            16,
            Duration::from_secs(30),
            Duration::from_secs(90),
        );

        let peer = NodeId::parse("10.0.0.1:9000").unwrap();
        let target = Path::parse("/user/worker").unwrap();

        let (tx, mut rx) = futures::channel::mpsc::unbounded();
        let (mailbox, _reader) = crate::kernel::queue::queue::<()>();
        let watcher = BasicActorRef::new(
            1,
            Path::parse("/user/watcher").unwrap(),
            None,
            tx,
            mailbox,
            Arc::new(tokio::sync::Notify::new()),
        );

        hub.register_watch(peer.clone(), target.clone(), watcher);
        hub.mark_down(&peer);

        match rx.try_next() {
            Ok(Some(SystemMsg::Terminated(actor, Some(Reason::NodeLost)))) => {
                assert_eq!(actor.path(), &target);
            }
            other => panic!("expected Terminated(.., NodeLost) for {target}, got {other:?}"),
        }

        assert!(hub.inner.watch_registry.take_for_node(&peer).is_empty());
    }
}
