mod common;

use std::time::Duration;

use corvid::event_bus::{Event, EventKind};
use corvid::path::Path;
use corvid::prelude::*;

/// S5: a send to a path with nothing registered there is dead-lettered
/// rather than erroring out the caller.
#[tokio::test(flavor = "multi_thread")]
async fn sending_to_an_unregistered_path_produces_a_dead_letter() {
    let node = NodeBuilder::new().build().expect("node builds");
    let path = Path::parse("/nobody-home").expect("path parses");

    let target = node.resolve(&path);
    assert!(matches!(target, Ref::DeadLetter { .. }));

    let waiter = node.events().consume_one(EventKind::DeadLetter);
    target.tell_any(Box::new("hello".to_string()), None);

    let event = tokio::time::timeout(Duration::from_secs(4), waiter)
        .await
        .expect("dead letter event fires")
        .expect("event bus delivers the event");
    match event {
        Event::DeadLetter { recipient, .. } => assert_eq!(recipient, path),
        other => panic!("unexpected event: {other:?}"),
    }
}

/// S5 variant: a Cell that has already stopped dead-letters anything sent to
/// its old ref, and watching it after the fact delivers `Terminated`
/// immediately instead of hanging.
#[tokio::test(flavor = "multi_thread")]
async fn watching_an_already_terminated_actor_delivers_terminated_immediately() {
    let node = NodeBuilder::new().build().expect("node builds");

    struct Noop;
    impl ActorFactory for Noop {
        fn create() -> Self {
            Noop
        }
    }
    impl Actor for Noop {
        type Msg = ();
        fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: (), _sender: Sender) {}
    }

    let actor = node.actor_of(Props::new::<Noop>(), Some("short-lived")).expect("spawns");
    let basic = actor.as_basic();
    actor.stop();

    for _ in 0..100 {
        if basic.is_terminated() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(basic.is_terminated());

    struct Watcher {
        target: Ref,
        probe: common::ChannelProbe<()>,
    }
    impl ActorFactoryArgs<(Ref, common::ChannelProbe<()>)> for Watcher {
        fn create_args((target, probe): (Ref, common::ChannelProbe<()>)) -> Self {
            Watcher { target, probe }
        }
    }
    impl Actor for Watcher {
        type Msg = ();

        fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
            ctx.watch(&self.target);
        }

        fn sys_recv(&mut self, _ctx: &Context<Self::Msg>, msg: SystemMsg, _sender: Sender) {
            if let SystemMsg::Terminated(_, _) = msg {
                self.probe.event(());
            }
        }

        fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: (), _sender: Sender) {}
    }

    let (p, mut listen) = common::probe::<()>();
    let target = Ref::Local(basic);
    node.actor_of(Props::new_args::<Watcher, _>((target, p)), Some("watcher")).expect("watcher spawns");

    assert!(listen.recv_timeout(Duration::from_secs(4)).await.is_some());
}
