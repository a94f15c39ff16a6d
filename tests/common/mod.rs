//! Shared test utilities: a fake windowing toolkit and test view-models.

#![allow(dead_code, unused_imports)]

use mvvmkit::config::Config;
use mvvmkit::dispatcher::{DispatchFrame, Dispatcher};
use mvvmkit::services::CoreServices;
use mvvmkit::view::{
    ClosedHook, DialogResult, HasViewModel, ViewFinder, ViewFinderBuilder, ViewModel, ViewModelId, Window,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

pub const WAIT: Duration = Duration::from_secs(5);

// -- View-models --------------------------------------------------------------

pub struct Screen {
    id: ViewModelId,
}

impl Screen {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { id: ViewModelId::new() })
    }
}

impl ViewModel for Screen {
    fn view_model_id(&self) -> ViewModelId {
        self.id
    }
}

/// A second window-backed view-model type.
pub struct Settings {
    id: ViewModelId,
}

impl Settings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { id: ViewModelId::new() })
    }
}

impl ViewModel for Settings {
    fn view_model_id(&self) -> ViewModelId {
        self.id
    }
}

/// Backed by a control, never by a window.
pub struct Widget {
    id: ViewModelId,
}

impl Widget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { id: ViewModelId::new() })
    }
}

impl ViewModel for Widget {
    fn view_model_id(&self) -> ViewModelId {
        self.id
    }
}

pub struct WidgetControl;

impl HasViewModel<Widget> for WidgetControl {
    fn set_view_model(&self, _view_model: Arc<Widget>) {}
}

// -- Fake toolkit -------------------------------------------------------------

/// Observable state of one fake window.
#[derive(Default)]
pub struct WindowState {
    visible: AtomicBool,
    has_view_model: AtomicBool,
    had_view_model_when_shown: AtomicBool,
    shows: AtomicUsize,
    closes: AtomicUsize,
    shown_on: Mutex<Option<String>>,
    frame: Mutex<Option<DispatchFrame>>,
    result: Mutex<DialogResult>,
    hook: Mutex<Option<ClosedHook>>,
}

impl WindowState {
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn is_modal(&self) -> bool {
        self.frame.lock().is_some()
    }

    pub fn shows(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn shown_on(&self) -> Option<String> {
        self.shown_on.lock().clone()
    }

    pub fn had_view_model_when_shown(&self) -> bool {
        self.had_view_model_when_shown.load(Ordering::SeqCst)
    }

    /// Steal the close hook so a test can fire it late.
    pub fn take_closed_hook(&self) -> Option<ClosedHook> {
        self.hook.lock().take()
    }

    /// What the toolkit does when the user dismisses the window.
    /// Call on the UI thread.
    pub fn user_close(&self, result: DialogResult) {
        *self.result.lock() = result;
        self.finish();
    }

    fn open(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.shows.fetch_add(1, Ordering::SeqCst);
        self.had_view_model_when_shown
            .store(self.has_view_model.load(Ordering::SeqCst), Ordering::SeqCst);
        *self.shown_on.lock() = std::thread::current().name().map(str::to_string);
    }

    fn finish(&self) {
        if !self.visible.swap(false, Ordering::SeqCst) {
            return;
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        if let Some(frame) = self.frame.lock().take() {
            frame.exit();
        }
        let hook = self.hook.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }
}

pub struct TestWindow<VM> {
    state: Arc<WindowState>,
    view_model: Mutex<Option<Arc<VM>>>,
}

impl<VM: ViewModel> Window for TestWindow<VM> {
    fn show(&self) {
        self.state.open();
    }

    fn show_dialog(&self, dispatcher: &Dispatcher) -> DialogResult {
        let frame = DispatchFrame::new();
        *self.state.frame.lock() = Some(frame.clone());
        self.state.open();
        if dispatcher.push_frame(&frame).is_err() {
            self.state.finish();
        }
        *self.state.result.lock()
    }

    fn close(&self) {
        self.state.finish();
    }

    fn on_closed(&self, hook: ClosedHook) {
        *self.state.hook.lock() = Some(hook);
    }
}

impl<VM: ViewModel> HasViewModel<VM> for TestWindow<VM> {
    fn set_view_model(&self, view_model: Arc<VM>) {
        *self.view_model.lock() = Some(view_model);
        self.state.has_view_model.store(true, Ordering::SeqCst);
    }
}

/// Records every window it creates.
#[derive(Default)]
pub struct Toolkit {
    windows: Mutex<Vec<Arc<WindowState>>>,
}

impl Toolkit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn associate<VM: ViewModel>(self: &Arc<Self>, builder: &mut ViewFinderBuilder) {
        let toolkit = Arc::clone(self);
        builder
            .associate_window::<VM, TestWindow<VM>>(move || toolkit.create_window())
            .expect("associate window");
    }

    pub fn create_window<VM>(&self) -> TestWindow<VM> {
        let state = Arc::new(WindowState::default());
        self.windows.lock().push(Arc::clone(&state));
        TestWindow {
            state,
            view_model: Mutex::new(None),
        }
    }

    pub fn windows(&self) -> Vec<Arc<WindowState>> {
        self.windows.lock().clone()
    }

    pub fn window(&self, index: usize) -> Arc<WindowState> {
        Arc::clone(&self.windows.lock()[index])
    }

    /// Poll until `count` windows exist and the last one is visible.
    pub fn wait_for_visible(&self, count: usize) -> Arc<WindowState> {
        let deadline = Instant::now() + WAIT;
        loop {
            {
                let windows = self.windows.lock();
                if windows.len() >= count && windows[count - 1].is_visible() {
                    return Arc::clone(&windows[count - 1]);
                }
            }
            assert!(Instant::now() < deadline, "window {} never became visible", count);
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

// -- Composite builders -------------------------------------------------------

/// Start core services with `Screen` and `Settings` backed by fake windows.
pub fn start_services() -> (CoreServices, Arc<Toolkit>) {
    let toolkit = Toolkit::new();
    let mut builder = ViewFinder::builder();
    toolkit.associate::<Screen>(&mut builder);
    toolkit.associate::<Settings>(&mut builder);
    builder
        .associate_control::<Widget, WidgetControl>()
        .expect("associate control");

    let services = CoreServices::start(&Config::default(), builder.build()).expect("start services");
    (services, toolkit)
}

/// Writer that records every byte written to it.
pub struct SpyWriter(SpyBuffer);

impl SpyWriter {
    pub fn new(buf: SpyBuffer) -> Self {
        Self(buf)
    }
}

impl std::io::Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn spy_text(buf: &SpyBuffer) -> String {
    String::from_utf8_lossy(&buf.lock()).into_owned()
}
