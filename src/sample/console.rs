//! A tiny "toolkit" that renders windows as boxed text on a writer.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dispatcher::{DispatchFrame, Dispatcher};
use crate::view::{ClosedHook, DialogResult};

/// Shared output for every console window.
#[derive(Clone)]
pub struct ConsoleSurface {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleSurface {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Write one line. Output errors are logged, never surfaced.
    pub fn line(&self, text: &str) {
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", text).and_then(|()| writer.flush()) {
            tracing::warn!(error = %e, "Console write failed");
        }
    }
}

impl std::fmt::Debug for ConsoleSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSurface").finish_non_exhaustive()
    }
}

/// Window state shared by the sample windows: visibility, the modal frame,
/// the dialog result and the close hook.
pub struct ConsoleChrome {
    title: &'static str,
    surface: ConsoleSurface,
    visible: AtomicBool,
    /// Present only while a modal frame is running.
    frame: Mutex<Option<DispatchFrame>>,
    result: Mutex<DialogResult>,
    closed_hook: Mutex<Option<ClosedHook>>,
}

impl ConsoleChrome {
    pub fn new(title: &'static str, surface: ConsoleSurface) -> Self {
        Self {
            title,
            surface,
            visible: AtomicBool::new(false),
            frame: Mutex::new(None),
            result: Mutex::new(DialogResult::Indeterminate),
            closed_hook: Mutex::new(None),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn show(&self, body: &[String]) {
        self.visible.store(true, Ordering::SeqCst);
        let width = body
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(self.title.chars().count() + 2);

        self.surface
            .line(&format!("┌─ {} {}┐", self.title, "─".repeat(width - self.title.chars().count())));
        for line in body {
            let pad = width - line.chars().count();
            self.surface.line(&format!("│ {}{} │", line, " ".repeat(pad)));
        }
        self.surface.line(&format!("└{}┘", "─".repeat(width + 2)));
    }

    /// Render, then keep the UI thread pumping until the window closes.
    pub fn show_dialog(&self, dispatcher: &Dispatcher, body: &[String]) -> DialogResult {
        let frame = DispatchFrame::new();
        *self.frame.lock() = Some(frame.clone());
        *self.result.lock() = DialogResult::Indeterminate;
        self.show(body);
        if let Err(e) = dispatcher.push_frame(&frame) {
            tracing::warn!(window = self.title, error = %e, "Modal frame ended early");
            self.close();
        }
        *self.result.lock()
    }

    /// Close with an explicit dialog answer.
    pub fn dismiss(&self, result: DialogResult) {
        *self.result.lock() = result;
        self.close();
    }

    pub fn close(&self) {
        if !self.visible.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(frame) = self.frame.lock().take() {
            frame.exit();
        }
        self.surface.line(&format!("[{} closed]", self.title));

        let hook = self.closed_hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    pub fn on_closed(&self, hook: ClosedHook) {
        *self.closed_hook.lock() = Some(hook);
    }
}
