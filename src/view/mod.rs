//! View/view-model contracts, the view finder and the view manager.
//!
//! A window declares the view-model type it accepts by implementing
//! [`HasViewModel`]. The [`ViewFinder`] maps each view-model type to exactly
//! one view factory, and the [`ViewManager`] keeps track of which view-model
//! currently has an open window.

mod error;
mod finder;
mod manager;

pub use error::ViewError;
pub use finder::{ViewBinding, ViewFinder, ViewFinderBuilder};
pub use manager::ViewManager;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::dispatcher::Dispatcher;

/// Stable identity token for one view-model instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewModelId(Uuid);

impl ViewModelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Presentation state for one logical screen.
///
/// Implementors usually store a [`ViewModelId`] created in their
/// constructor and return it here; the id must not change for the lifetime
/// of the instance.
pub trait ViewModel: Send + Sync + 'static {
    fn view_model_id(&self) -> ViewModelId;

    /// Name used in diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Outcome of a modal dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogResult {
    Accepted,
    Rejected,
    /// Dismissed without an explicit answer.
    #[default]
    Indeterminate,
}

impl From<Option<bool>> for DialogResult {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => DialogResult::Accepted,
            Some(false) => DialogResult::Rejected,
            None => DialogResult::Indeterminate,
        }
    }
}

impl From<DialogResult> for Option<bool> {
    fn from(value: DialogResult) -> Self {
        match value {
            DialogResult::Accepted => Some(true),
            DialogResult::Rejected => Some(false),
            DialogResult::Indeterminate => None,
        }
    }
}

/// Callback a window runs once it has closed, whatever closed it.
pub type ClosedHook = Box<dyn FnOnce() + Send + 'static>;

/// A top-level window provided by the host toolkit.
///
/// Windows are handles: every method takes `&self` and the toolkit keeps the
/// mutable state behind them. All methods are only called on the UI thread.
pub trait Window: Send + Sync + 'static {
    /// Make the window visible and return without waiting.
    fn show(&self);

    /// Show the window modally and return once it is dismissed.
    ///
    /// Implementations keep the UI responsive by running a nested frame on
    /// `dispatcher` (see [`Dispatcher::push_frame`]).
    fn show_dialog(&self, dispatcher: &Dispatcher) -> DialogResult;

    fn close(&self);

    /// Register a callback for when the window closes.
    ///
    /// Toolkits that can close windows on their own (the user clicks the
    /// close button) should call the hook so the view manager forgets the
    /// window. The default ignores the hook.
    fn on_closed(&self, hook: ClosedHook) {
        drop(hook);
    }
}

/// Capability: "this view accepts view-models of type `VM`".
pub trait HasViewModel<VM: ViewModel>: Send + Sync + 'static {
    /// Store the view-model. Must not make the view visible.
    fn set_view_model(&self, view_model: Arc<VM>);
}

/// What kind of view an association produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// A top-level window the view manager can show.
    Window,
    /// An embeddable control; it has a view-model but cannot be shown alone.
    Control,
}
