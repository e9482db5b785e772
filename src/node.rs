use std::sync::Arc;

use crate::actor_ref::{BasicActorRef, Ref};
use crate::config::{self, SystemSettings};
use crate::dead_letter::DeadLetterOffice;
use crate::error::CorvidError;
use crate::event_bus::EventBus;
use crate::executor::{self, ExecutorHandle};
use crate::hub::HubHandle;
use crate::kernel::provider::{self, Provider};
use crate::path::{NodeId, Path};

struct NodeInner {
    node_id: NodeId,
    guardian: BasicActorRef,
    hub: HubHandle,
    bus: EventBus,
    dead_letters: DeadLetterOffice,
    provider: Provider,
    settings: SystemSettings,
    log: slog::Logger,
}

/// The single per-process handle every Cell, Context, and collaborator holds:
/// identity, the Guardian root, the Hub, the EventBus, the dead-letter sink,
/// and the Provider that actually creates and indexes Cells. Cheap to clone,
/// same shape as the top-level `ActorSystem` handle this lineage's systems
/// expose to user code.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    pub(crate) fn new(
        node_id: NodeId,
        guardian: BasicActorRef,
        hub: HubHandle,
        bus: EventBus,
        dead_letters: DeadLetterOffice,
        provider: Provider,
        settings: SystemSettings,
        log: slog::Logger,
    ) -> Self {
        Node {
            inner: Arc::new(NodeInner {
                node_id,
                guardian,
                hub,
                bus,
                dead_letters,
                provider,
                settings,
                log,
            }),
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.inner.node_id
    }

    pub fn guardian(&self) -> &BasicActorRef {
        &self.inner.guardian
    }

    pub fn hub(&self) -> &HubHandle {
        &self.inner.hub
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn dead_letters(&self) -> &DeadLetterOffice {
        &self.inner.dead_letters
    }

    pub fn provider(&self) -> &Provider {
        &self.inner.provider
    }

    pub fn settings(&self) -> &SystemSettings {
        &self.inner.settings
    }

    pub fn log(&self) -> &slog::Logger {
        &self.inner.log
    }

    /// Spawns a top-level actor directly under the Guardian. Everything below
    /// the root goes through a hook's `Context::spawn` instead; this is the
    /// one entry point for code that has no Context of its own to spawn from.
    pub fn actor_of<A>(&self, props: crate::props::BoxActorProd<A>, name: Option<&str>) -> Result<crate::actor_ref::ActorRef<A::Msg>, crate::error::CreateError>
    where
        A: crate::actor::Actor + 'static,
    {
        self.inner.provider.create_actor(props, name, &self.inner.guardian, self)
    }

    /// Stops the whole tree: tells the Guardian to stop, which per the
    /// Stopping state cascades depth-first (a parent never finalizes before
    /// every child it told to stop has reported back `ChildTerminated`), and
    /// waits until the Guardian itself has finalized.
    pub async fn stop_all(&self) {
        self.inner.guardian.stop();
        while !self.inner.guardian.is_terminated() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    /// Looks a path up by whichever means its node prefix calls for: the local
    /// index for a path with no prefix or this node's own prefix, a `Remote`
    /// ref (routed through the Hub) for any other prefix, falling back to
    /// `DeadLetter` when the local index has nothing registered there.
    pub fn resolve(&self, path: &Path) -> Ref {
        match path.node() {
            Some(node) if *node != self.inner.node_id => Ref::Remote {
                node: node.clone(),
                path: path.without_node(),
                hub: self.inner.hub.clone(),
            },
            _ => match self.inner.provider.lookup(path) {
                Some(cell) => Ref::Local(cell),
                None => Ref::DeadLetter {
                    path: path.clone(),
                    office: self.inner.dead_letters.clone(),
                },
            },
        }
    }
}

fn default_log(settings: &SystemSettings) -> slog::Logger {
    use slog::Drain;

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let level = match settings.log.level.as_str() {
        "trace" => slog::Level::Trace,
        "debug" => slog::Level::Debug,
        "warning" | "warn" => slog::Level::Warning,
        "error" => slog::Level::Error,
        "critical" => slog::Level::Critical,
        _ => slog::Level::Info,
    };
    let drain = slog::LevelFilter::new(drain, level).fuse();
    slog::Logger::root(drain, slog::o!())
}

/// Assembles a `Node`: loads `SystemSettings`, builds the ambient Tokio
/// executor, EventBus, dead-letter office, Hub, and Provider, then spawns the
/// Guardian. Mirrors the lineage's `SystemBuilder`/`ActorSystem::create` two-step
/// shape (build the proto-system, then create the root hierarchy on it), just
/// without the separate channels subsystem this crate folds into the Hub.
pub struct NodeBuilder {
    node_id: Option<NodeId>,
    settings: Option<SystemSettings>,
    log: Option<slog::Logger>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        NodeBuilder { node_id: None, settings: None, log: None }
    }

    pub fn node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = Some(node_id);
        self
    }

    pub fn settings(mut self, settings: SystemSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn log(mut self, log: slog::Logger) -> Self {
        self.log = Some(log);
        self
    }

    pub fn build(self) -> Result<Node, CorvidError> {
        let settings = match self.settings {
            Some(s) => s,
            None => config::load_settings().unwrap_or_default(),
        };
        let log = self.log.unwrap_or_else(|| default_log(&settings));
        let node_id = match self.node_id {
            Some(id) => id,
            None => NodeId::parse("127.0.0.1:1").expect("loopback placeholder parses"),
        };

        let executor: ExecutorHandle = executor::tokio_executor();
        let bus = EventBus::new(log.clone());
        let dead_letters = DeadLetterOffice::new(bus.clone(), log.clone());
        let hub = HubHandle::new(
            node_id.clone(),
            bus.clone(),
            dead_letters.clone(),
            log.clone(),
            settings.max_inflight,
            settings.heartbeat_interval(),
            settings.heartbeat_timeout(),
        );
        let prov = Provider::new(executor.clone());

        let node_id_for_factory = node_id.clone();
        let settings_for_factory = settings.clone();
        let log_for_factory = log.clone();
        let hub_for_factory = hub.clone();
        let bus_for_factory = bus.clone();
        let dead_letters_for_factory = dead_letters.clone();
        let prov_for_factory = prov.clone();

        let node = provider::create_root(
            &prov,
            move |guardian| {
                Node::new(
                    node_id_for_factory,
                    guardian,
                    hub_for_factory,
                    bus_for_factory,
                    dead_letters_for_factory,
                    prov_for_factory,
                    settings_for_factory,
                    log_for_factory,
                )
            },
            settings.guardian_directive(),
            log.clone(),
        );

        let heartbeat_hub = hub;
        let heartbeat: std::pin::Pin<Box<dyn crate::executor::Task>> =
            Box::pin(async move { heartbeat_hub.run_heartbeat().await });
        executor.spawn(heartbeat);

        Ok(node)
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        NodeBuilder::new()
    }
}
