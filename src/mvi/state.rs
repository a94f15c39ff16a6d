/// Marker trait for view-model state.
///
/// `PartialEq` lets a view-model skip redrawing when a reduction changed
/// nothing.
pub trait UiState: Clone + PartialEq + Default + Send + 'static {}
