pub mod kernel_ref;
pub mod mailbox;
pub mod provider;
pub mod queue;

use std::sync::Arc;

use tokio::sync::Notify;

use crate::actor::Actor;
use crate::actor_cell::Context;
use crate::actor_ref::{new_actor_id, ActorRef, BasicActorRef};
use crate::event_bus::EventBus;
use crate::executor::ExecutorHandle;
use crate::kernel::kernel_ref::KernelRef;
use crate::kernel::mailbox::{run_loop, MailboxConfig};
use crate::kernel::queue::queue;
use crate::node::Node;
use crate::path::Path;
use crate::props::BoxActorProd;
use crate::sysmsg::SystemMsg;

/// Builds the Cell for `producer` at `path`, wires its mailbox, and hands the
/// dispatch loop to `executor`. Returns the typed ref callers hold plus a
/// `KernelRef` for the owner (the Provider) to keep alongside it.
pub fn start_actor<A: Actor>(
    producer: BoxActorProd<A>,
    path: Path,
    parent: Option<BasicActorRef>,
    node: &Node,
    executor: &ExecutorHandle,
) -> (ActorRef<A::Msg>, KernelRef) {
    let (user_tx, user_rx) = queue::<A::Msg>();
    let (sys_tx, sys_rx) = futures::channel::mpsc::unbounded::<SystemMsg>();
    let wake = Arc::new(Notify::new());

    let basic = BasicActorRef::new(new_actor_id(), path, parent, sys_tx, user_tx.clone(), wake.clone());
    let myself = ActorRef::new(basic.clone(), user_tx);
    let ctx = Context::new(myself.clone(), node.clone());

    let actor = producer.produce();
    let cfg = MailboxConfig {
        capacity: node.settings().mailbox_capacity,
        high_water_mark: node.settings().high_water_mark(),
    };

    let bus: EventBus = node.events().clone();
    spawn_loop(executor, actor, producer, ctx, user_rx, sys_rx, wake.clone(), bus, cfg);

    (myself, KernelRef::new(wake))
}

fn spawn_loop<A: Actor>(
    executor: &ExecutorHandle,
    actor: A,
    producer: BoxActorProd<A>,
    ctx: Context<A::Msg>,
    user_rx: crate::kernel::queue::QueueReader<A::Msg>,
    sys_rx: futures::channel::mpsc::UnboundedReceiver<SystemMsg>,
    wake: Arc<Notify>,
    bus: EventBus,
    cfg: MailboxConfig,
) {
    let fut: std::pin::Pin<Box<dyn crate::executor::Task>> =
        Box::pin(run_loop(actor, producer, ctx, user_rx, sys_rx, wake, bus, cfg));
    executor.spawn(fut);
}
