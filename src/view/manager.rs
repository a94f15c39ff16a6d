//! Registry of open views.
//!
//! Each view-model id is either absent (closed) or mapped to the window
//! showing it (open). Every read and write of the registry happens on the UI
//! thread: calls from other threads are marshalled through the dispatcher and
//! block until the UI thread has finished.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DialogResult, ViewBinding, ViewError, ViewFinder, ViewModel, ViewModelId, Window};
use crate::dispatcher::{DispatchError, Dispatcher};

/// Opens and closes windows for view-models.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct ViewManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    finder: ViewFinder,
    dispatcher: Dispatcher,
    /// Only locked on the UI thread, so it is never contended.
    active: Mutex<HashMap<ViewModelId, ActiveView>>,
    next_generation: AtomicU64,
}

struct ActiveView {
    window: Arc<dyn Window>,
    view_model: &'static str,
    /// Distinguishes successive windows for the same view-model, so a late
    /// close hook from an old window cannot evict a newer one.
    generation: u64,
}

impl ViewManager {
    pub fn new(finder: ViewFinder, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                finder,
                dispatcher,
                active: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn finder(&self) -> &ViewFinder {
        &self.inner.finder
    }

    /// Show the window associated with `view_model` without blocking on it.
    ///
    /// # Errors
    /// - `ViewNotFound` / `AssociatedViewNotWindow` from resolution.
    /// - `ViewAlreadyShowing` if this view-model already has an open window.
    /// - `Dispatch` if the UI thread is unavailable.
    pub fn show<VM: ViewModel>(&self, view_model: Arc<VM>) -> Result<(), ViewError> {
        let binding = self.inner.finder.resolve::<VM>()?;
        let inner = Arc::clone(&self.inner);
        self.inner.dispatcher.invoke(move || {
            let (window, _) = inner.open(view_model, &binding)?;
            window.show();
            Ok(())
        })?
    }

    /// Show the window associated with `view_model` modally.
    ///
    /// Blocks the calling thread until the dialog is dismissed, then returns
    /// its outcome. The view-model is considered closed once this returns.
    ///
    /// Fails with `Dispatch(NoUiThread)` if the UI thread shuts down while
    /// the dialog is open.
    pub fn show_dialog<VM: ViewModel>(&self, view_model: Arc<VM>) -> Result<DialogResult, ViewError> {
        let binding = self.inner.finder.resolve::<VM>()?;
        let inner = Arc::clone(&self.inner);
        self.inner.dispatcher.invoke(move || {
            let id = view_model.view_model_id();
            let (window, generation) = inner.open(view_model, &binding)?;
            let result = window.show_dialog(&inner.dispatcher);
            inner.forget(id, generation);
            if inner.dispatcher.is_exiting() {
                tracing::debug!(id = %id, "Dialog interrupted by dispatcher shutdown");
                return Err(ViewError::Dispatch(DispatchError::NoUiThread));
            }
            tracing::debug!(id = %id, ?result, "Dialog dismissed");
            Ok(result)
        })?
    }

    /// Close the window showing `view_model`.
    ///
    /// # Errors
    /// `ViewNotShowing` if `view_model` has no open window.
    pub fn close(&self, view_model: &dyn ViewModel) -> Result<(), ViewError> {
        let id = view_model.view_model_id();
        let name = view_model.type_name();
        let inner = Arc::clone(&self.inner);
        self.inner.dispatcher.invoke(move || {
            // Released before `close()` so the window's close hook can run.
            let entry = inner.active.lock().remove(&id);
            let Some(view) = entry else {
                return Err(ViewError::ViewNotShowing { view_model: name });
            };
            view.window.close();
            tracing::debug!(view_model = view.view_model, id = %id, "Closed view");
            Ok(())
        })?
    }

    pub fn is_showing(&self, view_model: &dyn ViewModel) -> Result<bool, ViewError> {
        let id = view_model.view_model_id();
        let inner = Arc::clone(&self.inner);
        Ok(self
            .inner
            .dispatcher
            .invoke(move || inner.active.lock().contains_key(&id))?)
    }

    /// Number of view-models with an open window.
    pub fn open_count(&self) -> Result<usize, ViewError> {
        let inner = Arc::clone(&self.inner);
        Ok(self
            .inner
            .dispatcher
            .invoke(move || inner.active.lock().len())?)
    }
}

impl ManagerInner {
    /// Build, bind and register a window. Runs on the UI thread.
    fn open<VM: ViewModel>(
        self: &Arc<Self>,
        view_model: Arc<VM>,
        binding: &ViewBinding<VM>,
    ) -> Result<(Arc<dyn Window>, u64), ViewError> {
        let id = view_model.view_model_id();
        let name = view_model.type_name();
        if self.active.lock().contains_key(&id) {
            return Err(ViewError::ViewAlreadyShowing { view_model: name });
        }

        // The factory may re-enter the manager, so the slot is claimed only
        // once the window exists.
        let window = binding.create(view_model);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        match self.active.lock().entry(id) {
            Entry::Occupied(_) => return Err(ViewError::ViewAlreadyShowing { view_model: name }),
            Entry::Vacant(slot) => {
                slot.insert(ActiveView {
                    window: Arc::clone(&window),
                    view_model: name,
                    generation,
                });
            }
        }

        let registry = Arc::downgrade(self);
        window.on_closed(Box::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.forget(id, generation);
            }
        }));

        tracing::debug!(
            view_model = name,
            view = binding.view_name(),
            id = %id,
            generation,
            "Opened view"
        );
        Ok((window, generation))
    }

    /// Drop the registry entry for `id` if it still belongs to `generation`.
    fn forget(&self, id: ViewModelId, generation: u64) {
        let mut active = self.active.lock();
        if active.get(&id).map(|view| view.generation) == Some(generation) {
            if let Some(view) = active.remove(&id) {
                tracing::debug!(view_model = view.view_model, id = %id, "View closed by toolkit");
            }
        }
    }
}

impl fmt::Debug for ViewManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewManager")
            .field("finder", &self.inner.finder)
            .field("dispatcher", &self.inner.dispatcher)
            .finish()
    }
}
