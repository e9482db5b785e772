use std::sync::Arc;

use tokio::sync::Notify;

/// Handle a Cell's owner keeps to the dispatch task backing it. There is no
/// shared kernel thread in this runtime — each Cell's `run_loop` is its own
/// task on the host Executor — so this is deliberately thin: it only lets a
/// caller nudge the task awake without going through a typed `ActorRef`.
#[derive(Clone)]
pub struct KernelRef {
    wake: Arc<Notify>,
}

impl KernelRef {
    pub(crate) fn new(wake: Arc<Notify>) -> Self {
        KernelRef { wake }
    }

    pub fn nudge(&self) {
        self.wake.notify_one();
    }
}
