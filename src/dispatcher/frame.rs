use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A nested run of the dispatch loop.
///
/// Modal windows create a frame, hand it to
/// [`Dispatcher::push_frame`](super::Dispatcher::push_frame) and call
/// [`exit`](Self::exit) when they are dismissed. Clones share state, so the
/// window can keep one clone for `close()` while the dialog call blocks on
/// another.
#[derive(Debug, Clone)]
pub struct DispatchFrame {
    running: Arc<AtomicBool>,
}

impl DispatchFrame {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Ask the frame to stop after the task currently executing.
    pub fn exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for DispatchFrame {
    fn default() -> Self {
        Self::new()
    }
}
