use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use super::{check_config, DispatchError, Dispatcher};
use crate::config::DispatcherConfig;

/// A dedicated thread running a dispatch loop.
///
/// Use this when no host toolkit owns a main loop. Dropping the handle
/// shuts the loop down and joins the thread.
pub struct UiThread {
    dispatcher: Dispatcher,
    handle: Option<JoinHandle<()>>,
}

impl UiThread {
    pub fn spawn(config: &DispatcherConfig) -> Result<Self, DispatchError> {
        check_config(config)?;

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let thread_config = config.clone();
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let (dispatcher, event_loop) = match Dispatcher::new(&thread_config) {
                    Ok(pair) => pair,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(dispatcher)).is_err() {
                    return;
                }
                event_loop.run();
            })
            .map_err(|err| DispatchError::Spawn {
                message: err.to_string(),
            })?;

        let dispatcher = ready_rx.recv().map_err(|_| DispatchError::NoUiThread)??;
        tracing::debug!(thread = %config.thread_name, "UI thread started");

        Ok(Self {
            dispatcher,
            handle: Some(handle),
        })
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Stop the loop and wait for the thread to exit.
    ///
    /// Work queued before this call still runs.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.dispatcher.shutdown();
        let Some(handle) = self.handle.take() else {
            return;
        };
        // Joining ourselves would never return.
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("UI thread panicked before shutdown completed");
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.stop();
    }
}
