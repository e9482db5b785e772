//! A distributed actor runtime: a supervision-tree actor kernel, a
//! hierarchical naming and reference model, and a remoting Hub that extends
//! refs across process boundaries.
//!
//! An actor is a type implementing [`actor::Actor`], spawned through a
//! [`node::Node`] (built with [`node::NodeBuilder`]) and addressed by either
//! the typed [`actor_ref::ActorRef`] `spawn` hands back or the type-erased
//! [`actor_ref::Ref`] a [`node::Node::resolve`] lookup returns.

pub mod actor;
pub mod actor_cell;
pub mod actor_ref;
pub mod config;
pub mod dead_letter;
pub mod error;
pub mod event_bus;
pub mod executor;
pub mod hub;
pub mod kernel;
pub mod message;
pub mod node;
pub mod path;
pub mod props;
pub mod supervisor;
pub mod sysmsg;
mod validate;
pub mod watch;

pub use corvid_macros::actor;

/// Common imports for actor authors: the traits and types a `recv`
/// implementation and a `spawn` call site need, gathered in one place the
/// way the lineage's own `actors` module does.
pub mod prelude {
    pub use crate::actor::{Actor, Directive, Receive};
    pub use crate::actor_cell::Context;
    pub use crate::actor_ref::{ActorRef, BasicActorRef, Ref, Sender, Tell};
    pub use crate::config::SystemSettings;
    pub use crate::error::{CorvidError, CreateError};
    pub use crate::message::Message;
    pub use crate::node::{Node, NodeBuilder};
    pub use crate::path::{NodeId, Path};
    pub use crate::props::{ActorFactory, ActorFactoryArgs, Props};
    pub use crate::supervisor::GuardianDirective;
    pub use crate::sysmsg::{Reason, SystemMsg};
}
