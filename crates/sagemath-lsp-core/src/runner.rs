//! Running Sage files and the Code Runner executor entry

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::{Map, Value};

use crate::error::RunError;

pub const DEFAULT_INTERPRETER: &str = "sage";
pub const SAGE_EXTENSION: &str = "sage";

/// Code Runner's per-extension command table
pub const EXECUTOR_MAP_KEY: &str = "code-runner.executorMapByFileExtension";

/// How a Sage file is run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    RunOnly,
    /// Run, then delete the `.py` file Sage leaves next to the source
    RunAndClean,
}

impl ExecutionMode {
    /// `"runAndClean"` selects cleaning; anything else, including no value,
    /// is `RunOnly`
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("runAndClean") => ExecutionMode::RunAndClean,
            _ => ExecutionMode::RunOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::RunOnly => "runOnly",
            ExecutionMode::RunAndClean => "runAndClean",
        }
    }

    pub fn cleans(&self) -> bool {
        matches!(self, ExecutionMode::RunAndClean)
    }
}

/// Command template Code Runner runs for `.sage` files
pub fn executor_command(mode: ExecutionMode) -> String {
    match mode {
        ExecutionMode::RunOnly => "sage $fullFileName".to_string(),
        ExecutionMode::RunAndClean => "sage $fullFileName && rm ${fullFileName}.py".to_string(),
    }
}

/// Copy `existing` (if it is an object) and set its `.sage` entry
pub fn update_executor_map(existing: Option<&Value>, mode: ExecutionMode) -> Map<String, Value> {
    let mut map = match existing {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    map.insert(".sage".to_string(), Value::String(executor_command(mode)));
    map
}

/// Update the executor map inside a settings document, keeping every other key
pub fn apply_to_settings(settings: &mut Value, mode: ExecutionMode) {
    if !settings.is_object() {
        *settings = Value::Object(Map::new());
    }
    if let Value::Object(root) = settings {
        let map = update_executor_map(root.get(EXECUTOR_MAP_KEY), mode);
        root.insert(EXECUTOR_MAP_KEY.to_string(), Value::Object(map));
    }
}

/// A request to run one Sage file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    pub file: PathBuf,
    pub interpreter: String,
    pub clean: bool,
}

/// What came back from the interpreter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Set when a `.py` byproduct was found and deleted
    pub removed: Option<PathBuf>,
}

impl RunRequest {
    /// Validate that `file` is a Sage source file
    pub fn new(file: impl Into<PathBuf>, mode: ExecutionMode) -> Result<Self, RunError> {
        let file = file.into();
        if file.extension().and_then(|e| e.to_str()) != Some(SAGE_EXTENSION) {
            return Err(RunError::NotSageFile { path: file });
        }
        Ok(Self {
            file,
            interpreter: DEFAULT_INTERPRETER.to_string(),
            clean: mode.cleans(),
        })
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// `<file>.py`, the file Sage preparses the source into
    pub fn byproduct(&self) -> PathBuf {
        byproduct_path(&self.file)
    }

    /// The equivalent shell line, for display
    pub fn shell_line(&self) -> String {
        let file = self.file.display();
        if self.clean {
            format!(
                "{} \"{}\" && rm -f \"{}\"",
                self.interpreter,
                file,
                self.byproduct().display()
            )
        } else {
            format!("{} \"{}\"", self.interpreter, file)
        }
    }

    /// Run the interpreter on the file and wait for it.
    ///
    /// The byproduct is removed only after a successful run, matching `&&`.
    pub async fn execute(&self) -> Result<RunOutput, RunError> {
        tracing::info!(command = %self.shell_line(), "running Sage file");

        let output = tokio::process::Command::new(&self.interpreter)
            .arg(&self.file)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RunError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let success = output.status.success();
        let mut removed = None;
        if self.clean && success {
            let byproduct = self.byproduct();
            match tokio::fs::remove_file(&byproduct).await {
                Ok(()) => removed = Some(byproduct),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(RunError::Cleanup {
                        path: byproduct,
                        source,
                    })
                }
            }
        }

        Ok(RunOutput {
            success,
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            removed,
        })
    }
}

fn byproduct_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".py");
    PathBuf::from(name)
}
