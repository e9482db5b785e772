use crate::actor_ref::BasicActorRef;

/// Control messages processed by a Cell's system queue, strictly ahead of any
/// user message. Exactly the vocabulary the supervision state machine needs to
/// drive the lifecycle FSM and the watch protocol.
#[derive(Clone, Debug)]
pub enum SystemMsg {
    /// Kicks the Starting -> Running transition; runs `pre_start`/`post_start`.
    ActorInit,
    Start,
    Stop,
    Suspend,
    Resume,
    Restart(Reason),
    /// A child reached Terminated; carried to the parent for bookkeeping and,
    /// if the child failed rather than stopped cleanly, a supervision decision.
    ChildTerminated(BasicActorRef),
    /// Delivered to every watcher of `target` once `target` is Terminated.
    Terminated(BasicActorRef, Option<Reason>),
    Watched(BasicActorRef),
    Unwatched(BasicActorRef),
    /// A hook raised a failure; delivered from the failing Cell to its parent.
    Failed(BasicActorRef, Reason),
}

/// Why a Cell stopped, restarted, or failed. `NodeLost` is synthesized by the
/// Hub, never raised by user code.
#[derive(Clone, Debug)]
pub enum Reason {
    UserFailure(String),
    Stopped,
    NodeLost,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Reason::UserFailure(msg) => write!(f, "user failure: {}", msg),
            Reason::Stopped => write!(f, "stopped"),
            Reason::NodeLost => write!(f, "node lost"),
        }
    }
}
