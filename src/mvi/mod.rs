//! Model-View-Intent primitives for view-model state.
//!
//! A view-model keeps its presentation state as an immutable value and
//! replaces it by running intents through a reducer:
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ Window
//!    ↑                              │
//!    └──────────────────────────────┘
//! ```
//!
//! - **State**: everything a window needs to render the screen
//! - **Intent**: user input or system events
//! - **Reducer**: pure function producing the next state

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::UiState;
