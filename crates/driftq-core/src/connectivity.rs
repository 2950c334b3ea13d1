//! Connectivity state shared between the app shell and the queue.

use std::sync::Arc;

use tokio::sync::watch;

/// Online/offline state backed by a watch channel.
///
/// The app shell flips it from its network-status events; the flush engine
/// reads it at the top of each pass and the trigger loop subscribes to
/// flush on offline → online transitions. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn set_online(&self) {
        self.tx.send_if_modified(|online| {
            let changed = !*online;
            *online = true;
            changed
        });
    }

    pub fn set_offline(&self) {
        self.tx.send_if_modified(|online| {
            let changed = *online;
            *online = false;
            changed
        });
    }

    /// Subscribe to state changes (used by the trigger loop).
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
