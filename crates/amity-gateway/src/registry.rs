use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use amity_types::events::OutboundFrame;

/// Canonical group name for a pair of users: both peers derive the same
/// name regardless of which side connects first.
pub fn pair_group(a: i64, b: i64) -> String {
    format!("chat_{}_{}", a.min(b), a.max(b))
}

/// Explicit connection-group registry: join on connect, leave on
/// disconnect, broadcast to whoever is currently joined. A value, not
/// ambient process state, so it can be handed to tests in isolation.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<String, Group>>>,
}

struct Group {
    tx: broadcast::Sender<OutboundFrame>,
    members: HashSet<Uuid>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Join a group, creating it on first join. Returns this connection's
    /// id and the receiver it should relay frames from.
    pub async fn join(&self, group: &str) -> (Uuid, broadcast::Receiver<OutboundFrame>) {
        let conn_id = Uuid::new_v4();
        let mut groups = self.inner.write().await;

        let entry = groups.entry(group.to_string()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(1024);
            Group {
                tx,
                members: HashSet::new(),
            }
        });
        entry.members.insert(conn_id);

        (conn_id, entry.tx.subscribe())
    }

    /// Leave a group; the group is dropped once its last member is gone.
    pub async fn leave(&self, group: &str, conn_id: Uuid) {
        let mut groups = self.inner.write().await;
        if let Some(entry) = groups.get_mut(group) {
            entry.members.remove(&conn_id);
            if entry.members.is_empty() {
                groups.remove(group);
            }
        }
    }

    /// Fan a frame out to every connection currently joined, the sender's
    /// own connection included. Returns the number of receivers.
    pub async fn broadcast(&self, group: &str, frame: OutboundFrame) -> usize {
        let groups = self.inner.read().await;
        match groups.get(group) {
            Some(entry) => entry.tx.send(frame).unwrap_or(0),
            None => 0,
        }
    }

    pub async fn has_group(&self, group: &str) -> bool {
        self.inner.read().await.contains_key(group)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
