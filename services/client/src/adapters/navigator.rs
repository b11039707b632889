//! services/client/src/adapters/navigator.rs
//!
//! A `Navigator` that publishes the current route on a watch channel, so a renderer
//! (or a test) can follow redirects.

use mail_router_core::domain::Route;
use mail_router_core::ports::Navigator;
use tokio::sync::watch;
use tracing::debug;

pub struct RecordingNavigator {
    current: watch::Sender<Route>,
}

impl RecordingNavigator {
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new(Route::Landing)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        debug!(path = route.path(), "Navigating.");
        self.current.send_replace(route);
    }
}
