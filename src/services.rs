//! Composition root.
//!
//! Starts the UI thread and wires the event aggregator and view manager to
//! it, so an application only has to provide its view associations.

use crate::config::Config;
use crate::dispatcher::{DispatchError, Dispatcher, UiThread};
use crate::events::EventAggregator;
use crate::view::{ViewFinder, ViewManager};

/// The running set of core services.
pub struct CoreServices {
    ui_thread: UiThread,
    events: EventAggregator,
    views: ViewManager,
}

impl CoreServices {
    pub fn start(config: &Config, finder: ViewFinder) -> Result<Self, DispatchError> {
        let ui_thread = UiThread::spawn(&config.dispatcher)?;
        let dispatcher = ui_thread.dispatcher();
        let events = EventAggregator::with_dispatcher(dispatcher.clone());
        let views = ViewManager::new(finder, dispatcher);

        tracing::info!(
            thread = %config.dispatcher.thread_name,
            views = views.finder().len(),
            "Core services started"
        );
        Ok(Self {
            ui_thread,
            events,
            views,
        })
    }

    pub fn events(&self) -> &EventAggregator {
        &self.events
    }

    pub fn views(&self) -> &ViewManager {
        &self.views
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.ui_thread.dispatcher()
    }

    /// Stop the UI thread after it drains already queued work.
    pub fn shutdown(self) {
        tracing::info!("Core services shutting down");
        self.ui_thread.shutdown();
    }
}
