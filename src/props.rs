use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::Arc;

use crate::actor::Actor;

/// A factory an actor is (re)built from. The Restart directive rebuilds the
/// behavior instance from this factory, never from the crashed instance's
/// state, which is exactly the "new instance from the original factory
/// captured at spawn" rule the supervision state machine requires.
pub trait ActorFactory: Actor {
    fn create() -> Self;
}

pub trait ActorFactoryArgs<Args>: Actor {
    fn create_args(args: Args) -> Self;
}

/// Type-erased producer stored in a Cell so a `Restart` can rebuild the
/// behavior without the kernel knowing the concrete actor type.
pub trait ActorProducer: Send + Sync + UnwindSafe + RefUnwindSafe {
    type Actor: Actor;

    fn produce(&self) -> Self::Actor;
}

pub type BoxActorProd<A> = Arc<dyn ActorProducer<Actor = A>>;

pub struct Props;

impl Props {
    pub fn new<A>() -> BoxActorProd<A>
    where
        A: ActorFactory + Send + 'static,
    {
        Arc::new(NoArgsProducer::<A> {
            _marker: std::marker::PhantomData,
        })
    }

    pub fn new_args<A, Args>(args: Args) -> BoxActorProd<A>
    where
        A: ActorFactoryArgs<Args> + Send + 'static,
        Args: Clone + Send + Sync + UnwindSafe + RefUnwindSafe + 'static,
    {
        Arc::new(ArgsProducer { args, _marker: std::marker::PhantomData })
    }
}

struct NoArgsProducer<A> {
    _marker: std::marker::PhantomData<A>,
}

impl<A: ActorFactory + Send> UnwindSafe for NoArgsProducer<A> {}
impl<A: ActorFactory + Send> RefUnwindSafe for NoArgsProducer<A> {}
unsafe impl<A> Sync for NoArgsProducer<A> {}

impl<A> ActorProducer for NoArgsProducer<A>
where
    A: ActorFactory + Send + 'static,
{
    type Actor = A;

    fn produce(&self) -> A {
        A::create()
    }
}

struct ArgsProducer<A, Args> {
    args: Args,
    _marker: std::marker::PhantomData<A>,
}

impl<A, Args: UnwindSafe> UnwindSafe for ArgsProducer<A, Args> {}
impl<A, Args: RefUnwindSafe> RefUnwindSafe for ArgsProducer<A, Args> {}
unsafe impl<A, Args: Sync> Sync for ArgsProducer<A, Args> {}

impl<A, Args> ActorProducer for ArgsProducer<A, Args>
where
    A: ActorFactoryArgs<Args> + Send + 'static,
    Args: Clone + Send + Sync + UnwindSafe + RefUnwindSafe + 'static,
{
    type Actor = A;

    fn produce(&self) -> A {
        A::create_args(self.args.clone())
    }
}
