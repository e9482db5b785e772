use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::channel::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

use crate::actor::Actor;
use crate::actor_cell::Context;
use crate::actor_ref::{BasicActorRef, Lifecycle};
use crate::event_bus::{Event, EventBus};
use crate::kernel::queue::QueueReader;
use crate::message::Message;
use crate::props::BoxActorProd;
use crate::sysmsg::{Reason, SystemMsg};

/// Bound on a Cell's user queue; crossing `high_water_mark` emits
/// `HighWaterMarkReached` once per crossing rather than once per send.
#[derive(Clone, Copy)]
pub struct MailboxConfig {
    pub capacity: usize,
    pub high_water_mark: usize,
}

/// Runs one Cell's entire lifetime on the host executor: drain system
/// messages, then at most one user message, then yield — repeated until
/// Terminated. This is the dispatch rule verbatim; nothing above this
/// function is allowed to run two steps of the same Cell concurrently, since
/// there is exactly one task doing this for a given Cell.
pub async fn run_loop<A: Actor>(
    mut actor: A,
    producer: BoxActorProd<A>,
    ctx: Context<A::Msg>,
    user: QueueReader<A::Msg>,
    mut sys: UnboundedReceiver<SystemMsg>,
    wake: Arc<Notify>,
    bus: EventBus,
    cfg: MailboxConfig,
) {
    let myself = ctx.myself_basic();
    let mut warned_high_water = false;
    let mut last_msg: Option<A::Msg> = None;

    loop {
        let mut progressed = drain_system_messages(&mut actor, &producer, &ctx, &mut sys, &bus, &myself, &mut last_msg);

        if myself.is_terminated() {
            flush_user_queue(&user, &myself, &bus);
            run_ignored(&mut actor, &ctx, &myself, &bus, |a, _| a.post_stop());
            if myself.parent() == Some(ctx.node().guardian()) {
                bus.publish(Event::TopLevelActorTerminated { actor: myself.clone() });
            }
            return;
        }

        if myself.lifecycle() == Lifecycle::Running {
            if step_user_message(&mut actor, &ctx, &user, &bus, &myself, &mut last_msg).is_some() {
                progressed = true;
            }
        }

        if cfg.high_water_mark > 0 {
            let depth = user.len_hint();
            if depth >= cfg.high_water_mark && !warned_high_water {
                warned_high_water = true;
                bus.publish(Event::HighWaterMarkReached { actor: myself.path().clone(), depth });
            } else if depth < cfg.high_water_mark {
                warned_high_water = false;
            }
        }

        if progressed {
            tokio::task::yield_now().await;
        } else {
            wake.notified().await;
        }
    }
}

fn drain_system_messages<A: Actor>(
    actor: &mut A,
    producer: &BoxActorProd<A>,
    ctx: &Context<A::Msg>,
    sys: &mut UnboundedReceiver<SystemMsg>,
    bus: &EventBus,
    myself: &BasicActorRef,
    last_msg: &mut Option<A::Msg>,
) -> bool {
    let mut msgs = Vec::new();
    loop {
        match sys.try_next() {
            Ok(Some(m)) => msgs.push(m),
            Ok(None) | Err(_) => break,
        }
    }
    if msgs.is_empty() {
        return false;
    }

    for msg in msgs {
        if myself.is_terminated() {
            break;
        }
        handle_system_message(actor, producer, ctx, msg, bus, myself, last_msg);
    }
    true
}

fn handle_system_message<A: Actor>(
    actor: &mut A,
    producer: &BoxActorProd<A>,
    ctx: &Context<A::Msg>,
    msg: SystemMsg,
    bus: &EventBus,
    myself: &BasicActorRef,
    last_msg: &mut Option<A::Msg>,
) {
    match msg {
        SystemMsg::ActorInit => run_start_sequence(actor, ctx, bus, myself),
        SystemMsg::Start => {
            if myself.lifecycle() == Lifecycle::Suspended {
                myself.set_lifecycle(Lifecycle::Running);
                bus.publish(Event::Resumed { actor: myself.clone() });
            }
        }
        SystemMsg::Suspend => {
            myself.set_lifecycle(Lifecycle::Suspended);
            bus.publish(Event::Suspended { actor: myself.clone(), reason: "suspend requested".into() });
        }
        SystemMsg::Resume => {
            // Resume drops whatever message was in flight with no redelivery
            // and no `pre_restart`; the behavior instance is left exactly as
            // it was when the panic unwound.
            last_msg.take();
            myself.set_lifecycle(Lifecycle::Running);
            bus.publish(Event::Resumed { actor: myself.clone() });
        }
        SystemMsg::Stop => begin_stop(myself, bus),
        SystemMsg::Restart(reason) => run_restart_sequence(actor, producer, ctx, bus, myself, &reason, last_msg.take()),
        SystemMsg::ChildTerminated(child) => {
            myself.remove_child(child.path().last_segment().unwrap_or(""));
            if myself.lifecycle() == Lifecycle::Stopping && myself.children().is_empty() {
                finalize_stop(myself, bus);
            }
        }
        SystemMsg::Terminated(target, reason) => {
            actor.sys_recv(ctx, SystemMsg::Terminated(target, reason), None);
        }
        SystemMsg::Watched(watcher) => myself.add_watcher(watcher),
        SystemMsg::Unwatched(watcher) => myself.remove_watcher(&watcher),
        SystemMsg::Failed(child, reason) => handle_child_failure(actor, myself, bus, &child, &reason),
    }
}

/// Starting -> Running. A fault here skips supervision entirely: the child
/// terminates with the fault as its reason and the parent learns about it
/// only as a `ChildTerminated`, since the child never became Running and so
/// never had a directive to receive.
fn run_start_sequence<A: Actor>(actor: &mut A, ctx: &Context<A::Msg>, bus: &EventBus, myself: &BasicActorRef) {
    myself.set_lifecycle(Lifecycle::Starting);
    let pre = std::panic::catch_unwind(AssertUnwindSafe(|| actor.pre_start(ctx)));
    if pre.is_err() {
        fail_during_start(myself, bus, "panic in pre_start");
        return;
    }

    myself.set_lifecycle(Lifecycle::Running);
    let post = std::panic::catch_unwind(AssertUnwindSafe(|| actor.post_start(ctx)));
    if post.is_err() {
        fail_during_start(myself, bus, "panic in post_start");
        return;
    }

    bus.publish(Event::Started { actor: myself.clone() });
}

fn fail_during_start(myself: &BasicActorRef, bus: &EventBus, reason: &str) {
    bus.publish(Event::Error { actor: myself.clone(), reason: reason.to_string() });
    myself.set_lifecycle(Lifecycle::Terminated);
    bus.publish(Event::Terminated { actor: myself.clone(), reason: Some(reason.to_string()) });
    for watcher in myself.watchers() {
        watcher.sys_tell(SystemMsg::Terminated(myself.clone(), Some(Reason::UserFailure(reason.to_string()))));
    }
    if let Some(parent) = myself.parent() {
        parent.sys_tell(SystemMsg::ChildTerminated(myself.clone()));
    }
}

/// Restart per the supervision state machine: stop children, run
/// `pre_restart` on the dying instance (failures there are `ErrorIgnored`,
/// restart proceeds regardless), rebuild from the original factory, then
/// re-run the Starting sequence on the fresh instance.
fn run_restart_sequence<A: Actor>(
    actor: &mut A,
    producer: &BoxActorProd<A>,
    ctx: &Context<A::Msg>,
    bus: &EventBus,
    myself: &BasicActorRef,
    reason: &Reason,
    last_msg: Option<A::Msg>,
) {
    for child in myself.children() {
        child.stop();
    }
    myself.set_lifecycle(Lifecycle::Restarting);
    run_ignored(actor, ctx, myself, bus, |a, c| a.pre_restart(c, &reason.to_string(), last_msg));

    *actor = producer.produce();
    run_start_sequence(actor, ctx, bus, myself);
}

/// Stopping: tell every child to stop and wait for each `ChildTerminated` to
/// come back before this Cell itself finalizes. A childless Cell (the common
/// case) finalizes immediately; `handle_system_message`'s `ChildTerminated`
/// arm calls `finalize_stop` once the children map empties out.
fn begin_stop(myself: &BasicActorRef, bus: &EventBus) {
    myself.set_lifecycle(Lifecycle::Stopping);
    let children = myself.children();
    if children.is_empty() {
        finalize_stop(myself, bus);
        return;
    }
    for child in children {
        child.stop();
    }
}

fn finalize_stop(myself: &BasicActorRef, bus: &EventBus) {
    myself.set_lifecycle(Lifecycle::Terminated);
    bus.publish(Event::Terminated { actor: myself.clone(), reason: None });
    for watcher in myself.watchers() {
        watcher.sys_tell(SystemMsg::Terminated(myself.clone(), Some(Reason::Stopped)));
    }
    if let Some(parent) = myself.parent() {
        parent.sys_tell(SystemMsg::ChildTerminated(myself.clone()));
    }
}

fn handle_child_failure<A: Actor>(actor: &mut A, myself: &BasicActorRef, bus: &EventBus, child: &BasicActorRef, reason: &Reason) {
    use crate::actor::Directive;

    let directive = match std::panic::catch_unwind(AssertUnwindSafe(|| actor.supervisor_strategy())) {
        Ok(d) => d,
        Err(_) => {
            bus.publish(Event::SupervisionFailure { actor: myself.clone(), reason: reason.to_string() });
            Directive::Stop
        }
    };

    bus.publish(Event::Error { actor: child.clone(), reason: reason.to_string() });

    match directive {
        Directive::Resume => child.sys_tell(SystemMsg::Resume),
        Directive::Restart => child.sys_tell(SystemMsg::Restart(reason.clone())),
        Directive::Stop => child.stop(),
        Directive::Escalate => {
            // Escalate bubbles the failure up as if `myself` were the failing
            // child: the grandparent's directive applies to `myself`, not to
            // the original grandchild, since `myself` is the one giving up on
            // supervising it.
            if let Some(parent) = myself.parent() {
                parent.sys_tell(SystemMsg::Failed(myself.clone(), reason.clone()));
            } else {
                bus.publish(Event::UnhandledError { actor: myself.clone(), reason: reason.to_string() });
                myself.stop();
            }
        }
    }
}

fn step_user_message<A: Actor>(
    actor: &mut A,
    ctx: &Context<A::Msg>,
    user: &QueueReader<A::Msg>,
    bus: &EventBus,
    myself: &BasicActorRef,
    last_msg: &mut Option<A::Msg>,
) -> Option<()> {
    let env = user.try_dequeue()?;
    bus.publish(Event::MessageReceived {
        recipient: myself.path().clone(),
        sender: env.sender.as_ref().map(|s| s.path().clone()),
    });

    *last_msg = Some(env.msg.clone());
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| actor.recv(ctx, env.msg, env.sender)));

    if result.is_ok() {
        *last_msg = None;
    } else {
        // Suspended until the parent's directive arrives: per §4.3, further
        // user messages queue rather than being dequeued against the
        // crashed-but-not-yet-rebuilt instance. `Resume`/`Restart`/`Stop`
        // (handled in `handle_system_message`) are each responsible for
        // moving the Cell back out of Suspended.
        myself.set_lifecycle(Lifecycle::Suspended);
        bus.publish(Event::Suspended { actor: myself.clone(), reason: "panic in recv".into() });
        bus.publish(Event::Error { actor: myself.clone(), reason: "panic in recv".into() });
        if let Some(parent) = myself.parent() {
            parent.sys_tell(SystemMsg::Failed(myself.clone(), Reason::UserFailure("panic in recv".into())));
        }
    }
    Some(())
}

/// Runs a hook that is already on an unwind path (`pre_restart`, `post_stop`):
/// a fault here is `ErrorIgnored` and never escalates, since termination
/// proceeds unconditionally regardless of what the hook does.
fn run_ignored<A: Actor>(
    actor: &mut A,
    ctx: &Context<A::Msg>,
    myself: &BasicActorRef,
    bus: &EventBus,
    f: impl FnOnce(&mut A, &Context<A::Msg>),
) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| f(actor, ctx)));
    if result.is_err() {
        bus.publish(Event::ErrorIgnored { actor: myself.clone(), reason: "panic in cleanup hook".into() });
    }
}

fn flush_user_queue<Msg: Message>(user: &QueueReader<Msg>, myself: &BasicActorRef, bus: &EventBus) {
    for env in user.drain() {
        let _ = env;
        bus.publish(Event::DeadLetter {
            recipient: myself.path().clone(),
            description: "actor terminated with messages still queued".into(),
        });
    }
}
