//! MVVM plumbing for desktop-style apps: a UI-thread dispatcher, a typed
//! event aggregator, a view finder and a view manager.

pub mod config;
pub mod dispatcher;
pub mod events;
pub mod logging;
pub mod mvi;
pub mod sample;
pub mod services;
pub mod view;
