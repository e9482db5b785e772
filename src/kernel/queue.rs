use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

use crate::actor_ref::Sender;
use crate::message::Message;

/// Wraps a message with the ref of whoever sent it, exactly as a Cell observes
/// it: `receive(msg)` plus an optional sender handle for replies.
#[derive(Clone, Debug)]
pub struct Envelope<Msg: Message> {
    pub sender: Sender,
    pub msg: Msg,
}

pub fn queue<Msg: Message>() -> (QueueWriter<Msg>, QueueReader<Msg>) {
    let (tx, rx) = unbounded::<Envelope<Msg>>();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        QueueWriter { tx, depth: depth.clone() },
        QueueReader {
            inner: Mutex::new(QueueReaderInner { rx, next: None }),
            depth,
        },
    )
}

#[derive(Clone)]
pub struct QueueWriter<Msg: Message> {
    tx: UnboundedSender<Envelope<Msg>>,
    depth: Arc<AtomicUsize>,
}

impl<Msg: Message> QueueWriter<Msg> {
    pub fn try_enqueue(&self, env: Envelope<Msg>) -> Result<(), EnqueueError<Msg>> {
        match self.tx.unbounded_send(env) {
            Ok(()) => {
                self.depth.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => Err(EnqueueError { msg: e.into_inner().msg }),
        }
    }
}

pub struct QueueReader<Msg: Message> {
    inner: Mutex<QueueReaderInner<Msg>>,
    depth: Arc<AtomicUsize>,
}

struct QueueReaderInner<Msg: Message> {
    rx: UnboundedReceiver<Envelope<Msg>>,
    next: Option<Envelope<Msg>>,
}

impl<Msg: Message> QueueReader<Msg> {
    /// Non-blocking dequeue used by the dispatch loop: at most one user message
    /// is ever pulled per Cell step.
    pub fn try_dequeue(&self) -> Option<Envelope<Msg>> {
        let mut inner = self.inner.lock().unwrap();
        let env = match inner.next.take() {
            Some(env) => Some(env),
            None => match inner.rx.try_next() {
                Ok(Some(env)) => Some(env),
                Ok(None) | Err(_) => None,
            },
        };
        if env.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        env
    }

    /// Approximate queue depth, tracked by a counter alongside sends/receives
    /// rather than drained from the channel; used only for the high-water-mark
    /// warning, which tolerates being off by the handful of messages in flight
    /// concurrently with the count.
    pub fn len_hint(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub fn has_msgs(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.next.is_some() {
            return true;
        }
        match inner.rx.try_next() {
            Ok(Some(env)) => {
                inner.next = Some(env);
                true
            }
            Ok(None) | Err(_) => false,
        }
    }

    /// Drains everything still queued; used to flush a Terminated Cell's
    /// remaining user messages to the dead-letter office.
    pub fn drain(&self) -> Vec<Envelope<Msg>> {
        let mut out = Vec::new();
        while let Some(env) = self.try_dequeue() {
            out.push(env);
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct EnqueueError<Msg> {
    pub msg: Msg,
}
