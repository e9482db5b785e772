use dashmap::DashMap;

use crate::actor_ref::BasicActorRef;
use crate::path::{NodeId, Path};

/// Bookkeeping for watches that cross a node boundary. Local watcher/watched
/// sets live directly on the Cell they belong to (see `BasicActorRef`); this
/// registry exists only for the remote case, where the Hub needs to know,
/// for a given peer, which local actors are waiting on which of that peer's
/// paths so it can fan out a synthetic `Terminated(.., NodeLost)` to exactly
/// the right set when the peer goes Down.
#[derive(Default, Clone)]
pub struct RemoteWatchRegistry {
    // node -> path -> watchers
    table: DashMap<NodeId, DashMap<Path, Vec<BasicActorRef>>>,
}

impl RemoteWatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, node: NodeId, path: Path, watcher: BasicActorRef) {
        let per_path = self.table.entry(node).or_default();
        per_path.entry(path).or_default().push(watcher);
    }

    pub fn unregister(&self, node: &NodeId, path: &Path, watcher: &BasicActorRef) {
        if let Some(per_path) = self.table.get(node) {
            if let Some(mut watchers) = per_path.get_mut(path) {
                watchers.retain(|w| w != watcher);
            }
        }
    }

    /// Every (path, watchers) pair registered against `node`, removed from the
    /// table: a Down transition consumes the registration, matching local
    /// semantics where a watch is satisfied by exactly one `Terminated`.
    pub fn take_for_node(&self, node: &NodeId) -> Vec<(Path, Vec<BasicActorRef>)> {
        self.table
            .remove(node)
            .map(|(_, per_path)| per_path.into_iter().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::queue::queue;

    fn dummy_ref(path: &str) -> BasicActorRef {
        let (tx, _rx) = futures::channel::mpsc::unbounded();
        let (mbox, _reader) = queue::<()>();
        BasicActorRef::new(
            1,
            Path::parse(path).unwrap(),
            None,
            tx,
            mbox,
            std::sync::Arc::new(tokio::sync::Notify::new()),
        )
    }

    #[test]
    fn register_and_take_clears_entry() {
        let reg = RemoteWatchRegistry::new();
        let node = NodeId::parse("127.0.0.1:9000").unwrap();
        let w = dummy_ref("/user/watcher");
        reg.register(node.clone(), Path::parse("/user/target").unwrap(), w.clone());

        let taken = reg.take_for_node(&node);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].1.len(), 1);

        assert!(reg.take_for_node(&node).is_empty());
    }
}
