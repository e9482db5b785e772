use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use corvid::actor_ref::{BasicActorRef, Ref};
use corvid::node::Node;
use corvid::path::Path;

/// Polls `Node::resolve` until a Cell spawned concurrently on another task
/// has registered itself as a child, rather than assuming spawn-then-resolve
/// is synchronous (it is not: `pre_start`'s `ctx.spawn` runs on the spawned
/// parent's own dispatch task).
pub async fn wait_for_local(node: &Node, path: &Path) -> BasicActorRef {
    for _ in 0..100 {
        if let Ref::Local(r) = node.resolve(path) {
            return r;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("actor at {path} never registered locally");
}

/// Adapted from the lineage's `riker-testkit` channel probe: an actor under
/// test holds one of these and calls `event` from inside `recv`; the test
/// thread drains the matching `ChannelProbeReceive` with a timeout instead of
/// sleeping.
#[derive(Clone, Debug)]
pub struct ChannelProbe<T> {
    tx: UnboundedSender<T>,
}

pub struct ChannelProbeReceive<T> {
    rx: UnboundedReceiver<T>,
}

pub fn probe<T>() -> (ChannelProbe<T>, ChannelProbeReceive<T>) {
    let (tx, rx) = unbounded_channel();
    (ChannelProbe { tx }, ChannelProbeReceive { rx })
}

impl<T> ChannelProbe<T> {
    pub fn event(&self, evt: T) {
        let _ = self.tx.send(evt);
    }
}

impl<T> ChannelProbeReceive<T> {
    pub async fn recv_timeout(&mut self, dur: Duration) -> Option<T> {
        tokio::time::timeout(dur, self.rx.recv()).await.ok().flatten()
    }
}

/// Mimics `assert_eq!` against the next event a probe delivers, bounded by a
/// 4-second timeout so a hung scenario fails instead of hanging the suite.
#[macro_export]
macro_rules! p_assert_eq {
    ($listen:expr, $expected:expr) => {{
        let got = $listen.recv_timeout(std::time::Duration::from_secs(4)).await;
        assert_eq!(got, Some($expected));
    }};
}
