use std::path::PathBuf;

use sagemath_lsp_core::runner::DEFAULT_INTERPRETER;
use sagemath_lsp_core::{DataPaths, ExecutionMode, MatchCase};
use serde::Deserialize;
use serde_json::Value;

/// Settings sent by the client in `initializationOptions` or
/// `workspace/didChangeConfiguration`. Every field is optional.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub symbols_path: Option<PathBuf>,
    pub keywords_path: Option<PathBuf>,
    pub interpreter: Option<String>,
    pub execution_mode: Option<String>,
    pub case_insensitive_completion: Option<bool>,
}

impl ClientSettings {
    /// Accept either the settings object itself or one nested under `sagemath`
    pub fn from_value(value: &Value) -> Self {
        let inner = value.get("sagemath").unwrap_or(value);
        match serde_json::from_value(inner.clone()) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed client settings");
                Self::default()
            }
        }
    }
}

/// Effective server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub paths: DataPaths,
    pub interpreter: String,
    pub execution_mode: ExecutionMode,
    pub match_case: MatchCase,
}

impl ServerConfig {
    pub fn new(paths: DataPaths) -> Self {
        Self {
            paths,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            execution_mode: ExecutionMode::RunOnly,
            match_case: MatchCase::Sensitive,
        }
    }

    /// Overlay client settings; absent fields keep their current value
    pub fn apply(&mut self, settings: ClientSettings) {
        if let Some(path) = settings.symbols_path {
            self.paths.symbols = Some(path);
        }
        if let Some(path) = settings.keywords_path {
            self.paths.keywords = Some(path);
        }
        if let Some(interpreter) = settings.interpreter {
            self.interpreter = interpreter;
        }
        if let Some(mode) = settings.execution_mode {
            self.execution_mode = ExecutionMode::from_setting(Some(&mode));
        }
        if let Some(insensitive) = settings.case_insensitive_completion {
            self.match_case = if insensitive {
                MatchCase::Insensitive
            } else {
                MatchCase::Sensitive
            };
        }
    }
}
