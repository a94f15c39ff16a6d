//! Two-screen demo: a login form that navigates to a profile page and back.

mod console;
mod login;
mod profile;

pub use console::{ConsoleChrome, ConsoleSurface};
pub use login::{LoginIntent, LoginReducer, LoginState, LoginViewModel, LoginWindow};
pub use profile::{ProfileViewModel, ProfileWindow};

use crate::view::{ViewError, ViewFinder, ViewFinderBuilder};

/// Published after the login form hands over to the profile screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub username: String,
}

/// Published when the profile screen navigates back to the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOut {
    pub username: String,
}

/// Associate the sample's windows with their view-models.
pub fn register_views(builder: &mut ViewFinderBuilder, surface: &ConsoleSurface) -> Result<(), ViewError> {
    let login_surface = surface.clone();
    builder.associate_window::<LoginViewModel, LoginWindow>(move || LoginWindow::new(login_surface.clone()))?;

    let profile_surface = surface.clone();
    builder.associate_window::<ProfileViewModel, ProfileWindow>(move || ProfileWindow::new(profile_surface.clone()))?;
    Ok(())
}

pub fn build_finder(surface: &ConsoleSurface) -> Result<ViewFinder, ViewError> {
    let mut builder = ViewFinder::builder();
    register_views(&mut builder, surface)?;
    Ok(builder.build())
}
