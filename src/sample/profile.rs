use std::sync::Arc;

use parking_lot::Mutex;

use super::console::{ConsoleChrome, ConsoleSurface};
use super::login::LoginViewModel;
use super::SignedOut;
use crate::dispatcher::Dispatcher;
use crate::events::EventAggregator;
use crate::view::{ClosedHook, DialogResult, HasViewModel, ViewError, ViewManager, ViewModel, ViewModelId, Window};

/// Screen shown after a successful sign-in.
pub struct ProfileViewModel {
    id: ViewModelId,
    views: ViewManager,
    events: EventAggregator,
    username: String,
    password: String,
}

impl ProfileViewModel {
    pub fn new(views: ViewManager, events: EventAggregator, username: String, password: String) -> Self {
        Self {
            id: ViewModelId::new(),
            views,
            events,
            username,
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Return to an empty login form.
    pub fn navigate_back(&self) -> Result<Arc<LoginViewModel>, ViewError> {
        let login = Arc::new(LoginViewModel::new(self.views.clone(), self.events.clone()));
        self.views.show(Arc::clone(&login))?;
        self.events.post(SignedOut {
            username: self.username.clone(),
        })?;
        self.views.close(self)?;
        Ok(login)
    }
}

impl ViewModel for ProfileViewModel {
    fn view_model_id(&self) -> ViewModelId {
        self.id
    }
}

pub struct ProfileWindow {
    chrome: ConsoleChrome,
    view_model: Mutex<Option<Arc<ProfileViewModel>>>,
}

impl ProfileWindow {
    pub fn new(surface: ConsoleSurface) -> Self {
        Self {
            chrome: ConsoleChrome::new("Profile", surface),
            view_model: Mutex::new(None),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.chrome.is_visible()
    }

    fn body(&self) -> Vec<String> {
        match self.view_model.lock().as_ref() {
            Some(vm) => vec![
                format!("Signed in as {}", vm.username()),
                format!("Password: {}", "*".repeat(vm.password().chars().count())),
                "[ Back ]".to_string(),
            ],
            None => vec!["(no profile)".to_string()],
        }
    }
}

impl Window for ProfileWindow {
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

impl HasViewModel<ProfileViewModel> for ProfileWindow {
    fn set_view_model(&self, view_model: Arc<ProfileViewModel>) {
        *self.view_model.lock() = Some(view_model);
    }
}
