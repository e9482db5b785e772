use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::channel::mpsc::UnboundedSender;
use tokio::sync::Notify;

use crate::error::MsgError;
use crate::hub::HubHandle;
use crate::kernel::queue::{Envelope, QueueWriter};
use crate::message::Message;
use crate::path::{NodeId, Path};
use crate::sysmsg::{Reason, SystemMsg};

pub type ActorId = u32;
pub type Sender = Option<BasicActorRef>;

pub fn new_actor_id() -> ActorId {
    rand::random::<ActorId>()
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Lifecycle {
    Uninitialized = 0,
    Starting = 1,
    Running = 2,
    Suspended = 3,
    Restarting = 4,
    Stopping = 5,
    Terminated = 6,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Lifecycle::Uninitialized,
            1 => Lifecycle::Starting,
            2 => Lifecycle::Running,
            3 => Lifecycle::Suspended,
            4 => Lifecycle::Restarting,
            5 => Lifecycle::Stopping,
            _ => Lifecycle::Terminated,
        }
    }
}

/// Forwards a type-erased message into a typed mailbox, downcasting on the way
/// in. This is what lets `BasicActorRef` (which does not know an actor's `Msg`
/// type) still forward an arbitrary `Ref::tell` into the right queue.
pub(crate) trait AnyTell: Send + Sync {
    fn try_tell_any(
        &self,
        msg: Box<dyn Any + Send>,
        sender: Sender,
    ) -> Result<(), MsgError<Box<dyn Any + Send>>>;
}

pub(crate) struct TypedTell<Msg: Message> {
    pub mailbox: QueueWriter<Msg>,
}

impl<Msg: Message> AnyTell for TypedTell<Msg> {
    fn try_tell_any(
        &self,
        msg: Box<dyn Any + Send>,
        sender: Sender,
    ) -> Result<(), MsgError<Box<dyn Any + Send>>> {
        match msg.downcast::<Msg>() {
            Ok(m) => {
                let _ = self.mailbox.try_enqueue(Envelope { sender, msg: *m });
                Ok(())
            }
            Err(b) => Err(MsgError::new(b)),
        }
    }
}

struct ActorCellInner {
    uid: ActorId,
    path: Path,
    parent: Option<BasicActorRef>,
    children: DashMap<String, BasicActorRef>,
    watchers: DashMap<Path, BasicActorRef>,
    lifecycle: AtomicU8,
    sys_tx: UnboundedSender<SystemMsg>,
    any_tell: Arc<dyn AnyTell>,
    wake: Arc<Notify>,
}

/// Type-erased handle to a local Cell: enough to address it, watch it, walk its
/// children, and push system messages into it, without knowing its `Msg` type.
#[derive(Clone)]
pub struct BasicActorRef {
    inner: Arc<ActorCellInner>,
}

impl BasicActorRef {
    pub(crate) fn new<Msg: Message>(
        uid: ActorId,
        path: Path,
        parent: Option<BasicActorRef>,
        sys_tx: UnboundedSender<SystemMsg>,
        mailbox: QueueWriter<Msg>,
        wake: Arc<Notify>,
    ) -> Self {
        BasicActorRef {
            inner: Arc::new(ActorCellInner {
                uid,
                path,
                parent,
                children: DashMap::new(),
                watchers: DashMap::new(),
                lifecycle: AtomicU8::new(Lifecycle::Uninitialized as u8),
                sys_tx,
                any_tell: Arc::new(TypedTell { mailbox }),
                wake,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn uid(&self) -> ActorId {
        self.inner.uid
    }

    pub fn parent(&self) -> Option<&BasicActorRef> {
        self.inner.parent.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.inner.lifecycle.load(Ordering::SeqCst))
    }

    pub(crate) fn set_lifecycle(&self, l: Lifecycle) {
        self.inner.lifecycle.store(l as u8, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.lifecycle() == Lifecycle::Terminated
    }

    pub(crate) fn add_child(&self, child: BasicActorRef) {
        let segment = child.path().last_segment().unwrap_or("").to_string();
        self.inner.children.insert(segment, child);
    }

    pub(crate) fn remove_child(&self, segment: &str) {
        self.inner.children.remove(segment);
    }

    pub fn children(&self) -> Vec<BasicActorRef> {
        self.inner.children.iter().map(|e| e.value().clone()).collect()
    }

    pub fn child(&self, segment: &str) -> Option<BasicActorRef> {
        self.inner.children.get(segment).map(|e| e.value().clone())
    }

    pub(crate) fn add_watcher(&self, watcher: BasicActorRef) {
        self.inner.watchers.insert(watcher.path().clone(), watcher);
    }

    pub(crate) fn remove_watcher(&self, watcher: &BasicActorRef) {
        self.inner.watchers.remove(watcher.path());
    }

    pub(crate) fn watchers(&self) -> Vec<BasicActorRef> {
        self.inner.watchers.iter().map(|e| e.value().clone()).collect()
    }

    pub fn sys_tell(&self, msg: SystemMsg) {
        if self.inner.sys_tx.unbounded_send(msg).is_ok() {
            self.inner.wake.notify_one();
        }
    }

    pub fn try_tell_any(&self, msg: Box<dyn Any + Send>, sender: Sender) -> bool {
        let ok = self.inner.any_tell.try_tell_any(msg, sender).is_ok();
        if ok {
            self.inner.wake.notify_one();
        }
        ok
    }

    pub(crate) fn notify_wake(&self) {
        self.inner.wake.notify_one();
    }

    pub fn stop(&self) {
        self.sys_tell(SystemMsg::Stop);
    }
}

impl PartialEq for BasicActorRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.path == other.inner.path
    }
}
impl Eq for BasicActorRef {}

impl Hash for BasicActorRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.path.hash(state);
    }
}

impl fmt::Debug for BasicActorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BasicActorRef[{}]", self.inner.path)
    }
}

impl fmt::Display for BasicActorRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner.path)
    }
}

/// Typed local handle, the concrete type actor authors hold onto after `spawn`.
#[derive(Clone)]
pub struct ActorRef<Msg: Message> {
    pub(crate) basic: BasicActorRef,
    pub(crate) mailbox: QueueWriter<Msg>,
}

impl<Msg: Message> ActorRef<Msg> {
    pub(crate) fn new(basic: BasicActorRef, mailbox: QueueWriter<Msg>) -> Self {
        ActorRef { basic, mailbox }
    }

    pub fn path(&self) -> &Path {
        self.basic.path()
    }

    pub fn tell(&self, msg: Msg, sender: Sender) {
        if self.mailbox.try_enqueue(Envelope { sender, msg }).is_ok() {
            self.basic.notify_wake();
        }
    }

    pub fn sys_tell(&self, msg: SystemMsg) {
        self.basic.sys_tell(msg);
    }

    pub fn stop(&self) {
        self.basic.stop();
    }

    pub fn as_basic(&self) -> BasicActorRef {
        self.basic.clone()
    }
}

impl<Msg: Message> fmt::Debug for ActorRef<Msg> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActorRef[{}]", self.basic.path())
    }
}

impl<Msg: Message> From<ActorRef<Msg>> for BasicActorRef {
    fn from(r: ActorRef<Msg>) -> Self {
        r.basic
    }
}

/// Ergonomic `.tell()` across `ActorRef<Msg>` and `Option<ActorRef<Msg>>`.
pub trait Tell<Msg> {
    fn tell(&self, msg: Msg, sender: Sender);
}

impl<Msg: Message> Tell<Msg> for ActorRef<Msg> {
    fn tell(&self, msg: Msg, sender: Sender) {
        ActorRef::tell(self, msg, sender);
    }
}

impl<Msg: Message> Tell<Msg> for Option<&ActorRef<Msg>> {
    fn tell(&self, msg: Msg, sender: Sender) {
        if let Some(r) = self {
            r.tell(msg, sender);
        }
    }
}

/// The spec-level opaque reference: local, remote, or a dead-letter sink.
/// Unlike `ActorRef<Msg>` this does not know a concrete message type, which is
/// exactly what makes it suitable for `Node::resolve`, watch registries, and
/// Hub addressing, where the target's type is not known statically.
#[derive(Clone)]
pub enum Ref {
    Local(BasicActorRef),
    Remote {
        node: NodeId,
        path: Path,
        hub: HubHandle,
    },
    DeadLetter {
        path: Path,
        office: crate::dead_letter::DeadLetterOffice,
    },
}

impl Ref {
    pub fn path(&self) -> Path {
        match self {
            Ref::Local(r) => r.path().clone(),
            Ref::Remote { path, .. } => path.clone(),
            Ref::DeadLetter { path, .. } => path.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Ref::Local(_))
    }

    /// Sends an already-encoded payload. Local sends still go through the
    /// type-erased `try_tell_any` path (the payload is boxed, not bytes) so
    /// in-process messaging never pays a serialization cost; remote sends hand
    /// encoded bytes to the Hub, whose job is exactly that framing.
    pub fn tell_any(&self, msg: Box<dyn Any + Send>, sender: Sender) {
        match self {
            Ref::Local(r) => {
                let _ = r.try_tell_any(msg, sender);
            }
            Ref::Remote { node, path, hub } => {
                hub.send_any(node, path, msg);
            }
            Ref::DeadLetter { path, office } => {
                office.publish(path.clone(), format!("{:?}", msg.type_id()));
            }
        }
    }

    pub fn stop(&self) {
        if let Ref::Local(r) = self {
            r.stop();
        }
    }

    pub fn watch(&self, watcher: &BasicActorRef) {
        match self {
            Ref::Local(r) => {
                if r.is_terminated() {
                    watcher.sys_tell(SystemMsg::Terminated(r.clone(), Some(Reason::Stopped)));
                } else {
                    r.add_watcher(watcher.clone());
                }
            }
            Ref::Remote { node, path, hub } => {
                hub.register_watch(node.clone(), path.clone(), watcher.clone());
            }
            Ref::DeadLetter { path, .. } => {
                watcher.sys_tell(SystemMsg::Terminated(crate::hub::local_proxy(path), Some(Reason::Stopped)));
            }
        }
    }

    pub fn unwatch(&self, watcher: &BasicActorRef) {
        match self {
            Ref::Local(r) => r.remove_watcher(watcher),
            Ref::Remote { node, path, hub } => hub.unregister_watch(node, path, watcher),
            Ref::DeadLetter { .. } => {}
        }
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ref[{}]", self.path())
    }
}
