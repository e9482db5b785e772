use crate::actor_cell::Context;
use crate::actor_ref::Sender;
use crate::message::Message;
use crate::sysmsg::SystemMsg;

/// Supervisor decision on a failed child, returned from `Actor::supervisor_strategy`.
/// `Resume` is the one variant the upstream lineage's `Strategy` enum never had to
/// express (it only ever stopped, restarted or escalated); this crate's spec calls
/// for all four, so it is added here rather than bolted on downstream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Directive {
    Resume,
    Restart,
    Stop,
    Escalate,
}

/// A user-supplied behavior bound to a Cell.
///
/// Hooks are invoked by the Cell's dispatch loop; none of them run concurrently
/// with each other or with another step of the same Cell.
pub trait Actor: Send + 'static {
    type Msg: Message;

    /// Invoked once, after the Starting -> Running transition.
    fn pre_start(&mut self, _ctx: &Context<Self::Msg>) {}

    /// Invoked once, immediately after `pre_start`.
    fn post_start(&mut self, _ctx: &Context<Self::Msg>) {}

    /// Invoked before a `Restart` directive discards this instance.
    /// `last_msg` is the user message being processed when the failure occurred,
    /// if any (a failure during `pre_start` has none).
    fn pre_restart(&mut self, _ctx: &Context<Self::Msg>, _reason: &str, _last_msg: Option<Self::Msg>) {}

    /// Invoked once, on the Stopping -> Terminated transition, even on crash paths.
    fn post_stop(&mut self) {}

    /// Decision this actor makes about one of its own failed children.
    fn supervisor_strategy(&self) -> Directive {
        Directive::Restart
    }

    /// Invoked for every system message this Cell itself needs to observe beyond
    /// what the dispatch loop already handles (e.g. reacting to a watched ref's
    /// `Terminated`). The default forwards nothing; `Context::myself` plus the
    /// watch registry is enough for most actors, which instead rely on the
    /// `(terminated, ref)` shape delivered to `recv` (see the wire/user message
    /// section of the surrounding spec).
    fn sys_recv(&mut self, _ctx: &Context<Self::Msg>, _msg: SystemMsg, _sender: Sender) {}

    /// Invoked once per user message dequeued while Running.
    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender);
}

impl<A: Actor + ?Sized> Actor for Box<A> {
    type Msg = A::Msg;

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        (**self).pre_start(ctx);
    }

    fn post_start(&mut self, ctx: &Context<Self::Msg>) {
        (**self).post_start(ctx);
    }

    fn pre_restart(&mut self, ctx: &Context<Self::Msg>, reason: &str, last_msg: Option<Self::Msg>) {
        (**self).pre_restart(ctx, reason, last_msg);
    }

    fn post_stop(&mut self) {
        (**self).post_stop();
    }

    fn supervisor_strategy(&self) -> Directive {
        (**self).supervisor_strategy()
    }

    fn sys_recv(&mut self, ctx: &Context<Self::Msg>, msg: SystemMsg, sender: Sender) {
        (**self).sys_recv(ctx, msg, sender);
    }

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, sender: Sender) {
        (**self).recv(ctx, msg, sender);
    }
}

/// Implemented for each message type an actor wants to receive, typically
/// generated alongside a dispatching `recv` by the `#[actor(...)]` attribute
/// macro (see `corvid_macros::actor`).
pub trait Receive<Msg: Message> {
    type Msg: Message;

    fn receive(&mut self, ctx: &Context<Self::Msg>, msg: Msg, sender: Sender);
}

/// The actor trait object stored inside a Cell.
pub type BoxActor<Msg> = Box<dyn Actor<Msg = Msg> + Send>;
