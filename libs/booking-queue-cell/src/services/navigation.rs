use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use crate::Route;

pub type RouteSender = broadcast::Sender<Route>;
pub type RouteReceiver = broadcast::Receiver<Route>;

/// Boundary to whatever renders screens.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that fans routes out to subscribers and remembers the latest one.
pub struct BroadcastNavigator {
    sender: RouteSender,
    current: Mutex<Option<Route>>,
}

impl Default for BroadcastNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastNavigator {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);

        Self {
            sender,
            current: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> RouteReceiver {
        self.sender.subscribe()
    }

    pub fn current(&self) -> Option<Route> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Navigator for BroadcastNavigator {
    fn navigate(&self, route: Route) {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(route.clone());

        if let Err(e) = self.sender.send(route) {
            // Nobody is listening, not critical
            debug!("No navigation subscribers: {}", e);
        }
    }
}
