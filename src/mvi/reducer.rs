use super::intent::Intent;
use super::state::UiState;

/// The only place where view-model state transitions happen.
///
/// Must be pure: (State, Intent) -> State. Navigation and other side
/// effects belong to the view-model, after the state has been updated.
pub trait Reducer {
    type State: UiState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
