use std::sync::Arc;

use parking_lot::Mutex;

use super::console::{ConsoleChrome, ConsoleSurface};
use super::profile::ProfileViewModel;
use super::SignedIn;
use crate::dispatcher::Dispatcher;
use crate::events::EventAggregator;
use crate::mvi::{Intent, Reducer, UiState};
use crate::view::{ClosedHook, DialogResult, HasViewModel, ViewError, ViewManager, ViewModel, ViewModelId, Window};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginState {
    pub username: String,
    pub password: String,
}

impl LoginState {
    pub fn can_submit(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

impl UiState for LoginState {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIntent {
    UsernameChanged(String),
    PasswordChanged(String),
    Cleared,
}

impl Intent for LoginIntent {}

pub struct LoginReducer;

impl Reducer for LoginReducer {
    type State = LoginState;
    type Intent = LoginIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            LoginIntent::UsernameChanged(username) => LoginState { username, ..state },
            LoginIntent::PasswordChanged(password) => LoginState { password, ..state },
            LoginIntent::Cleared => LoginState::default(),
        }
    }
}

/// Sign-in form.
pub struct LoginViewModel {
    id: ViewModelId,
    views: ViewManager,
    events: EventAggregator,
    state: Mutex<LoginState>,
}

impl LoginViewModel {
    pub fn new(views: ViewManager, events: EventAggregator) -> Self {
        Self {
            id: ViewModelId::new(),
            views,
            events,
            state: Mutex::new(LoginState::default()),
        }
    }

    pub fn state(&self) -> LoginState {
        self.state.lock().clone()
    }

    pub fn dispatch(&self, intent: LoginIntent) {
        let mut state = self.state.lock();
        let next = LoginReducer::reduce(std::mem::take(&mut *state), intent);
        *state = next;
    }

    pub fn set_username(&self, username: impl Into<String>) {
        self.dispatch(LoginIntent::UsernameChanged(username.into()));
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.dispatch(LoginIntent::PasswordChanged(password.into()));
    }

    pub fn can_submit(&self) -> bool {
        self.state.lock().can_submit()
    }

    /// Navigate to the profile screen.
    ///
    /// Returns `Ok(None)` without touching any window while the form is
    /// incomplete.
    pub fn submit(&self) -> Result<Option<Arc<ProfileViewModel>>, ViewError> {
        let state = self.state();
        if !state.can_submit() {
            tracing::debug!("Submit ignored, form incomplete");
            return Ok(None);
        }

        let profile = Arc::new(ProfileViewModel::new(
            self.views.clone(),
            self.events.clone(),
            state.username.clone(),
            state.password,
        ));
        self.views.show(Arc::clone(&profile))?;
        self.events.post(SignedIn {
            username: state.username,
        })?;
        self.views.close(self)?;
        Ok(Some(profile))
    }

    pub fn close_window(&self) -> Result<(), ViewError> {
        self.views.close(self)
    }
}

impl ViewModel for LoginViewModel {
    fn view_model_id(&self) -> ViewModelId {
        self.id
    }
}

pub struct LoginWindow {
    chrome: ConsoleChrome,
    view_model: Mutex<Option<Arc<LoginViewModel>>>,
}

impl LoginWindow {
    pub fn new(surface: ConsoleSurface) -> Self {
        Self {
            chrome: ConsoleChrome::new("Login", surface),
            view_model: Mutex::new(None),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.chrome.is_visible()
    }

    /// Close the dialog with an answer, as the OK/Cancel buttons would.
    pub fn dismiss(&self, result: DialogResult) {
        self.chrome.dismiss(result);
    }

    fn body(&self) -> Vec<String> {
        let state = self
            .view_model
            .lock()
            .as_ref()
            .map(|vm| vm.state())
            .unwrap_or_default();
        let submit = if state.can_submit() { "[ Sign in ]" } else { "[ sign in ]" };
        vec![
            format!("Username: {}", state.username),
            format!("Password: {}", "*".repeat(state.password.chars().count())),
            submit.to_string(),
        ]
    }
}

impl Window for LoginWindow {
    fn show(&self) {
        self.chrome.show(&self.body());
    }

    fn show_dialog(&self, dispatcher: &Dispatcher) -> DialogResult {
        self.chrome.show_dialog(dispatcher, &self.body())
    }

    fn close(&self) {
        self.chrome.close();
    }

    fn on_closed(&self, hook: ClosedHook) {
        self.chrome.on_closed(hook);
    }
}

impl HasViewModel<LoginViewModel> for LoginWindow {
    fn set_view_model(&self, view_model: Arc<LoginViewModel>) {
        *self.view_model.lock() = Some(view_model);
    }
}
