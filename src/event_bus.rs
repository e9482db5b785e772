use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::channel::oneshot;

use crate::actor_ref::BasicActorRef;
use crate::path::Path;

/// The stable, observable event taxonomy. `Error`/`UnhandledError`/`ErrorIgnored`/
/// `SupervisionFailure` are four distinct failure-reporting events rather than
/// one generic "actor crashed" event: `Error` fires for every hook failure
/// before the parent's supervisor decides anything; `UnhandledError` fires
/// additionally when the failure reaches the Guardian with nowhere left to
/// escalate; `ErrorIgnored` fires for a fault inside `pre_restart`/`post_stop`,
/// which is already on an unwind path and cannot itself be supervised;
/// `SupervisionFailure` fires if reporting the original failure to the
/// parent's supervisor hook itself panics.
#[derive(Clone, Debug)]
pub enum Event {
    MessageReceived { recipient: Path, sender: Option<Path> },
    UnhandledMessage { recipient: Path, description: String },
    DeadLetter { recipient: Path, description: String },
    Started { actor: BasicActorRef },
    Suspended { actor: BasicActorRef, reason: String },
    Resumed { actor: BasicActorRef },
    Terminated { actor: BasicActorRef, reason: Option<String> },
    TopLevelActorTerminated { actor: BasicActorRef },
    Error { actor: BasicActorRef, reason: String },
    UnhandledError { actor: BasicActorRef, reason: String },
    ErrorIgnored { actor: BasicActorRef, reason: String },
    SupervisionFailure { actor: BasicActorRef, reason: String },
    HighWaterMarkReached { actor: Path, depth: usize },
    LifecycleWarning { actor: Path, message: String },
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum EventKind {
    MessageReceived,
    UnhandledMessage,
    DeadLetter,
    Started,
    Suspended,
    Resumed,
    Terminated,
    TopLevelActorTerminated,
    Error,
    UnhandledError,
    ErrorIgnored,
    SupervisionFailure,
    HighWaterMarkReached,
    LifecycleWarning,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::MessageReceived { .. } => EventKind::MessageReceived,
            Event::UnhandledMessage { .. } => EventKind::UnhandledMessage,
            Event::DeadLetter { .. } => EventKind::DeadLetter,
            Event::Started { .. } => EventKind::Started,
            Event::Suspended { .. } => EventKind::Suspended,
            Event::Resumed { .. } => EventKind::Resumed,
            Event::Terminated { .. } => EventKind::Terminated,
            Event::TopLevelActorTerminated { .. } => EventKind::TopLevelActorTerminated,
            Event::Error { .. } => EventKind::Error,
            Event::UnhandledError { .. } => EventKind::UnhandledError,
            Event::ErrorIgnored { .. } => EventKind::ErrorIgnored,
            Event::SupervisionFailure { .. } => EventKind::SupervisionFailure,
            Event::HighWaterMarkReached { .. } => EventKind::HighWaterMarkReached,
            Event::LifecycleWarning { .. } => EventKind::LifecycleWarning,
        }
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct EventBusInner {
    subscriptions: HashMap<EventKind, Vec<Handler>>,
    consumers: HashMap<EventKind, Vec<oneshot::Sender<Event>>>,
}

/// Observable lifecycle/error event stream. Subscribe for a standing handler,
/// or consume-one for a single future that resolves on the next matching
/// event; a dropped consume-one future's sender is simply never fired and
/// is swept on the next publish of that kind (the oneshot detects the
/// cancellation on send).
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<EventBusInner>>,
    log: slog::Logger,
}

impl EventBus {
    pub fn new(log: slog::Logger) -> Self {
        EventBus {
            inner: Arc::new(Mutex::new(EventBusInner::default())),
            log,
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        inner.subscriptions.entry(kind).or_default().push(Arc::new(handler));
    }

    pub fn consume_one(&self, kind: EventKind) -> impl std::future::Future<Output = Option<Event>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock().unwrap();
            inner.consumers.entry(kind).or_default().push(tx);
        }
        async move { rx.await.ok() }
    }

    pub fn publish(&self, event: Event) {
        let kind = event.kind();
        slog::trace!(self.log, "event"; "kind" => ?kind);

        let (waiters, handlers) = {
            let mut inner = self.inner.lock().unwrap();
            let waiters = inner.consumers.remove(&kind).unwrap_or_default();
            let handlers = inner.subscriptions.get(&kind).cloned().unwrap_or_default();
            (waiters, handlers)
        };

        for waiter in waiters {
            let _ = waiter.send(event.clone());
        }

        for handler in handlers {
            let event_ref = &event;
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| handler(event_ref)));
            if result.is_err() {
                eprintln!("event bus handler panicked while handling {:?}", kind);
            }
        }
    }
}
