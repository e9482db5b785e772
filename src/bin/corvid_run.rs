use std::process::ExitCode;

use clap::Parser;

use corvid::actor::Actor;
use corvid::actor_cell::Context;
use corvid::actor_ref::{ActorRef, Ref, Sender};
use corvid::config::SystemSettings;
use corvid::event_bus::EventKind;
use corvid::node::NodeBuilder;
use corvid::path::NodeId;
use corvid::props::{ActorFactory, ActorFactoryArgs, Props};
use corvid::sysmsg::SystemMsg;

/// Runs a single top-level actor under a fresh Node until it stops. Mirrors
/// the lineage's `ActorRunner`/`Wrapper` pair: a thin runner parses the
/// command line and builds a Node, and a `Wrapper` actor occupies the actual
/// top-level slot, spawning and watching the hosted actor so it can respawn
/// it on `--keep-running` instead of the process having to.
#[derive(Parser)]
#[command(name = "corvid-run")]
#[command(version, about = "Run a corvid actor tree as a standalone process")]
struct Args {
    /// host:port to bind the remoting Hub's identity to; omit to run with no
    /// remoting (the Hub still exists, it just has no peers).
    #[arg(long)]
    remoting: Option<String>,

    /// Path segment the hosted actor is spawned at.
    #[arg(long, default_value = "runner")]
    name: String,

    /// Guardian directive applied if the runner's own top-level actor escalates.
    #[arg(long, value_parser = ["stop", "restart", "resume"], default_value = "stop")]
    supervise: String,

    /// Respawn the hosted actor instead of shutting the process down when it terminates.
    #[arg(long)]
    keep_running: bool,
}

/// The demo behavior corvid-run hosts. Applications embedding this crate as a
/// library spawn their own actor types directly through `Node::actor_of`;
/// this exists so `corvid-run` has something concrete to drive end to end
/// from the command line.
struct Echo;

impl ActorFactory for Echo {
    fn create() -> Self {
        Echo
    }
}

impl Actor for Echo {
    type Msg = String;

    fn recv(&mut self, ctx: &Context<Self::Msg>, msg: Self::Msg, _sender: Sender) {
        slog::info!(ctx.node().log(), "echo"; "message" => %msg);
    }
}

struct Wrapper {
    name: String,
    keep_running: bool,
    child: Option<ActorRef<String>>,
}

impl ActorFactoryArgs<(String, bool)> for Wrapper {
    fn create_args((name, keep_running): (String, bool)) -> Self {
        Wrapper { name, keep_running, child: None }
    }
}

impl Wrapper {
    fn spawn_child(&mut self, ctx: &Context<<Wrapper as Actor>::Msg>) {
        let child = ctx
            .spawn(Props::new::<Echo>(), Some(&self.name))
            .expect("the hosted actor's name is a fresh segment under a freshly stopped slot");
        ctx.watch(&Ref::Local(child.as_basic()));
        self.child = Some(child);
    }
}

impl Actor for Wrapper {
    type Msg = ();

    fn pre_start(&mut self, ctx: &Context<Self::Msg>) {
        self.spawn_child(ctx);
    }

    fn sys_recv(&mut self, ctx: &Context<Self::Msg>, msg: SystemMsg, _sender: Sender) {
        if let SystemMsg::Terminated(actor, _reason) = msg {
            if self.child.as_ref().map(|c| c.as_basic()) == Some(actor) {
                if self.keep_running {
                    self.spawn_child(ctx);
                } else {
                    ctx.stop(None);
                }
            }
        }
    }

    fn recv(&mut self, _ctx: &Context<Self::Msg>, _msg: (), _sender: Sender) {}
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let node_id = match &args.remoting {
        Some(raw) => match NodeId::parse(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                eprintln!("invalid --remoting value: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let settings = SystemSettings {
        guardian_directive: args.supervise.clone(),
        ..SystemSettings::default()
    };

    let mut builder = NodeBuilder::new().settings(settings);
    if let Some(id) = node_id {
        builder = builder.node_id(id);
    }

    let node = match builder.build() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("failed to start node: {e}");
            return ExitCode::FAILURE;
        }
    };

    let escalated = node.events().consume_one(EventKind::TopLevelActorTerminated);

    node.actor_of(
        Props::new_args::<Wrapper, _>((args.name.clone(), args.keep_running)),
        Some("_runner"),
    )
    .expect("_runner is a fresh name on a freshly built node");

    slog::info!(node.log(), "corvid-run started"; "name" => %args.name, "keep_running" => args.keep_running);

    tokio::select! {
        _ = escalated => {
            eprintln!("top-level actor terminated after escalation to the guardian");
            ExitCode::FAILURE
        }
        _ = tokio::signal::ctrl_c() => {
            node.stop_all().await;
            ExitCode::SUCCESS
        }
    }
}
