use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::actor::Actor;
use crate::actor_ref::{ActorRef, BasicActorRef};
use crate::error::CreateError;
use crate::executor::ExecutorHandle;
use crate::kernel;
use crate::node::Node;
use crate::path::Path;
use crate::props::{ActorFactoryArgs, BoxActorProd, Props};
use crate::supervisor::GuardianDirective;
use crate::sysmsg::SystemMsg;
use crate::validate::validate_name;

/// Creates and locally resolves Cells. Naming per §4.5/§4.6: a live child is
/// looked up by walking the children map from the Guardian, one segment at a
/// time, rather than through a separate global index — the children map on
/// each `BasicActorRef` already is that index.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    guardian: std::sync::OnceLock<BasicActorRef>,
    anon_counters: DashMap<Path, AtomicU64>,
    executor: ExecutorHandle,
}

impl Provider {
    pub fn new(executor: ExecutorHandle) -> Self {
        Provider {
            inner: Arc::new(ProviderInner {
                guardian: std::sync::OnceLock::new(),
                anon_counters: DashMap::new(),
                executor,
            }),
        }
    }

    pub(crate) fn set_guardian(&self, guardian: BasicActorRef) {
        let _ = self.inner.guardian.set(guardian);
    }

    pub fn guardian(&self) -> &BasicActorRef {
        self.inner.guardian.get().expect("guardian created before first use")
    }

    pub fn create_actor<A>(
        &self,
        props: BoxActorProd<A>,
        name: Option<&str>,
        parent: &BasicActorRef,
        node: &Node,
    ) -> Result<ActorRef<A::Msg>, CreateError>
    where
        A: Actor + 'static,
    {
        let name = match name {
            Some(n) => {
                validate_name(n)?;
                n.to_string()
            }
            None => self.next_anonymous_name(parent.path()),
        };

        if parent.child(&name).is_some() {
            let path = parent.path().child(&name).unwrap_or_else(|_| parent.path().clone());
            return Err(CreateError::AlreadyExists(path));
        }

        let path = parent
            .path()
            .child(&name)
            .map_err(|_| CreateError::InvalidName(name.clone()))?;

        let (actor_ref, _kernel_ref) =
            kernel::start_actor(props, path, Some(parent.clone()), node, &self.inner.executor);

        let child = actor_ref.as_basic();
        parent.add_child(child);
        actor_ref.sys_tell(SystemMsg::ActorInit);

        Ok(actor_ref)
    }

    fn next_anonymous_name(&self, parent: &Path) -> String {
        let counter = self.inner.anon_counters.entry(parent.clone()).or_insert_with(|| AtomicU64::new(0));
        let n = counter.fetch_add(1, Ordering::SeqCst);
        format!("${:x}", n)
    }

    /// Walks the children map from the Guardian per §4.6. An empty path
    /// resolves to the Guardian itself.
    pub fn lookup(&self, path: &Path) -> Option<BasicActorRef> {
        let mut current = self.guardian().clone();
        for segment in path.segments() {
            current = current.child(segment)?;
        }
        Some(current)
    }
}

struct Guardian {
    directive: GuardianDirective,
    log: slog::Logger,
}

impl ActorFactoryArgs<(GuardianDirective, slog::Logger)> for Guardian {
    fn create_args((directive, log): (GuardianDirective, slog::Logger)) -> Self {
        Guardian { directive, log }
    }
}

impl Actor for Guardian {
    type Msg = SystemMsg;

    fn recv(&mut self, _ctx: &crate::actor_cell::Context<Self::Msg>, _msg: Self::Msg, _sender: crate::actor_ref::Sender) {}

    fn supervisor_strategy(&self) -> crate::actor::Directive {
        self.directive.as_directive()
    }

    fn post_stop(&mut self) {
        slog::info!(self.log, "guardian stopped");
    }
}

/// Builds the root Guardian directly (it has no parent to spawn it for it).
/// Mirrors the lineage's "big bang" special case: every other actor gets a
/// parent from `create_actor`, the Guardian is the one Cell that cannot.
pub(crate) fn create_root(provider: &Provider, node_factory: impl FnOnce(BasicActorRef) -> Node, directive: GuardianDirective, log: slog::Logger) -> Node {
    let path = Path::root();
    let (user_tx, user_rx) = kernel::queue::queue::<SystemMsg>();
    let (sys_tx, sys_rx) = futures::channel::mpsc::unbounded::<SystemMsg>();
    let wake = Arc::new(tokio::sync::Notify::new());

    let guardian_ref = BasicActorRef::new(crate::actor_ref::new_actor_id(), path, None, sys_tx, user_tx.clone(), wake.clone());
    provider.set_guardian(guardian_ref.clone());

    let node = node_factory(guardian_ref.clone());

    let producer: BoxActorProd<Guardian> = Props::new_args::<Guardian, _>((directive, log));
    let actor = producer.produce();
    let myself = ActorRef::new(guardian_ref.clone(), user_tx);
    let ctx = crate::actor_cell::Context::new(myself.clone(), node.clone());
    let cfg = kernel::mailbox::MailboxConfig {
        capacity: node.settings().mailbox_capacity,
        high_water_mark: node.settings().high_water_mark(),
    };
    let fut: std::pin::Pin<Box<dyn crate::executor::Task>> = Box::pin(kernel::mailbox::run_loop(
        actor,
        producer,
        ctx,
        user_rx,
        sys_rx,
        wake,
        node.events().clone(),
        cfg,
    ));
    provider_executor(provider).spawn(fut);

    myself.sys_tell(SystemMsg::ActorInit);
    node
}

fn provider_executor(provider: &Provider) -> ExecutorHandle {
    provider.inner.executor.clone()
}
