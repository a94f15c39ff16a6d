use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the UI-affinity thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Name given to the spawned UI thread (default: "mvvmkit-ui").
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
    /// Upper bound for a blocking `invoke`, in milliseconds.
    ///
    /// Unset means callers wait until the UI thread finishes the work,
    /// which is what modal dialogs normally need. When set it also bounds
    /// `ViewManager::show_dialog`.
    #[serde(default)]
    pub invoke_timeout_ms: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_thread_name() -> String {
    "mvvmkit-ui".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl DispatcherConfig {
    /// Returns the configured invoke timeout as a `Duration`.
    pub fn invoke_timeout(&self) -> Option<Duration> {
        self.invoke_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            invoke_timeout_ms: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
