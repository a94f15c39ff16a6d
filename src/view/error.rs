use thiserror::Error;

use crate::dispatcher::DispatchError;

/// Errors raised by the view finder and view manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(
        "View for {view_model} view model already showing. \
         Ensure that the view is closed before opening it again."
    )]
    ViewAlreadyShowing { view_model: &'static str },

    #[error("Could not find a view associated with {view_model}.")]
    ViewNotFound { view_model: &'static str },

    #[error("The view associated with {view_model} was not a window ({view} is a control).")]
    AssociatedViewNotWindow {
        view_model: &'static str,
        view: &'static str,
    },

    /// Close was requested for a view-model with no open view.
    #[error("No view is showing for {view_model}.")]
    ViewNotShowing { view_model: &'static str },

    #[error("{view_model} is already associated with {existing}; cannot also associate {duplicate}.")]
    DuplicateAssociation {
        view_model: &'static str,
        existing: &'static str,
        duplicate: &'static str,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
