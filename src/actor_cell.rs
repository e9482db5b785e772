use crate::actor::Actor;
use crate::actor_ref::{ActorRef, BasicActorRef, Ref};
use crate::error::CreateError;
use crate::message::Message;
use crate::node::Node;
use crate::props::BoxActorProd;

/// Handed to every hook invocation. The capability set a behavior needs:
/// its own typed ref, the owning `Node`, and the spawn/watch/stop/send
/// operations the spec's actor contract grants hooks.
pub struct Context<Msg: Message> {
    pub(crate) myself: ActorRef<Msg>,
    pub(crate) node: Node,
}

impl<Msg: Message> Context<Msg> {
    pub(crate) fn new(myself: ActorRef<Msg>, node: Node) -> Self {
        Context { myself, node }
    }

    pub fn myself(&self) -> ActorRef<Msg> {
        self.myself.clone()
    }

    pub fn myself_basic(&self) -> BasicActorRef {
        self.myself.as_basic()
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn spawn<A>(&self, props: BoxActorProd<A>, name: Option<&str>) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor + 'static,
    {
        self.node
            .provider()
            .create_actor(props, name, &self.myself_basic(), &self.node)
    }

    pub fn watch(&self, target: &Ref) {
        target.watch(&self.myself_basic());
    }

    pub fn unwatch(&self, target: &Ref) {
        target.unwatch(&self.myself_basic());
    }

    pub fn stop(&self, target: Option<&Ref>) {
        match target {
            Some(r) => r.stop(),
            None => self.myself.stop(),
        }
    }

    pub fn send<T: Message>(&self, target: &ActorRef<T>, msg: T) {
        target.tell(msg, Some(self.myself_basic()));
    }
}

impl<Msg: Message> Clone for Context<Msg> {
    fn clone(&self) -> Self {
        Context {
            myself: self.myself.clone(),
            node: self.node.clone(),
        }
    }
}
