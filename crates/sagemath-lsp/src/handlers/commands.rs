use std::path::PathBuf;

use sagemath_lsp_core::runner::update_executor_map;
use sagemath_lsp_core::{executor_command, ExecutionMode, RunError, RunOutput, RunRequest};
use serde_json::{json, Value};
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::Url;

use crate::config::ServerConfig;

pub const COMMAND_RUN_FILE: &str = "sage.runFile";
pub const COMMAND_RUN_FILE_AND_CLEAN: &str = "sage.runFileAndClean";
pub const COMMAND_RELOAD_SYMBOLS: &str = "sage.reloadSymbols";
pub const COMMAND_EXECUTOR_COMMAND: &str = "sage.executorCommand";
pub const COMMAND_EXECUTOR_MAP: &str = "sage.executorMap";

pub const ALL_COMMANDS: [&str; 5] = [
    COMMAND_RUN_FILE,
    COMMAND_RUN_FILE_AND_CLEAN,
    COMMAND_RELOAD_SYMBOLS,
    COMMAND_EXECUTOR_COMMAND,
    COMMAND_EXECUTOR_MAP,
];

/// First argument as a file path. Accepts a `file://` URI or a plain path.
pub fn file_argument(arguments: &[Value]) -> Result<PathBuf> {
    let raw = arguments
        .first()
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::invalid_params("Missing file argument"))?;

    match Url::parse(raw) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|()| Error::invalid_params(format!("Not a local file: {raw}"))),
        _ => Ok(PathBuf::from(raw)),
    }
}

/// Build the run request for one of the two run commands
pub fn run_request(command: &str, arguments: &[Value], config: &ServerConfig) -> Result<RunRequest> {
    let mode = match command {
        COMMAND_RUN_FILE => ExecutionMode::RunOnly,
        COMMAND_RUN_FILE_AND_CLEAN => ExecutionMode::RunAndClean,
        other => return Err(Error::invalid_params(format!("Not a run command: {other}"))),
    };

    let file = file_argument(arguments)?;
    let request = RunRequest::new(file, mode).map_err(|e| Error::invalid_params(e.to_string()))?;
    Ok(request.with_interpreter(config.interpreter.clone()))
}

/// Code Runner command for the configured mode
pub fn executor_command_value(config: &ServerConfig) -> Value {
    Value::String(executor_command(config.execution_mode))
}

/// The client's executor map (first argument, optional) with `.sage` set
pub fn executor_map_value(arguments: &[Value], config: &ServerConfig) -> Value {
    Value::Object(update_executor_map(arguments.first(), config.execution_mode))
}

/// A run that could not start or clean up is a server-side failure
pub fn run_error(err: &RunError) -> Error {
    Error {
        code: ErrorCode::InternalError,
        message: err.to_string().into(),
        data: None,
    }
}

pub fn run_output_value(request: &RunRequest, output: &RunOutput) -> Value {
    json!({
        "command": request.shell_line(),
        "success": output.success,
        "code": output.code,
        "stdout": output.stdout,
        "stderr": output.stderr,
        "removed": output.removed.as_ref().map(|p| p.display().to_string()),
    })
}
