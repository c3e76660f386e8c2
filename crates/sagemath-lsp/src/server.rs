use std::sync::RwLock;

use dashmap::DashMap;
use sagemath_lsp_core::{DataPaths, DataStore, LoadReport, RunError, RunRequest};
use serde_json::{json, Value};
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::capabilities;
use crate::config::{ClientSettings, ServerConfig};
use crate::document::Document;
use crate::handlers;
use crate::handlers::commands::{
    COMMAND_EXECUTOR_COMMAND, COMMAND_EXECUTOR_MAP, COMMAND_RELOAD_SYMBOLS, COMMAND_RUN_FILE,
    COMMAND_RUN_FILE_AND_CLEAN,
};

const SYMBOLS_LOADED: &str = "SageMath symbols loaded successfully.";
const SYMBOLS_FAILED: &str =
    "Failed to load SageMath symbols. Please check the file format and path.";

pub struct Backend {
    client: Client,
    documents: DashMap<Url, Document>,
    store: DataStore,
    config: RwLock<ServerConfig>,
    debug: bool,
}

impl Backend {
    pub fn new(client: Client, paths: DataPaths, debug: bool) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            store: DataStore::with_data(Default::default()),
            config: RwLock::new(ServerConfig::new(paths)),
            debug,
        }
    }

    async fn log_debug(&self, message: &str) {
        tracing::debug!("{}", message);
        if self.debug {
            self.client
                .log_message(MessageType::INFO, format!("[DEBUG] {}", message))
                .await;
        }
    }

    fn config(&self) -> ServerConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn apply_settings(&self, settings: ClientSettings) {
        match self.config.write() {
            Ok(mut guard) => guard.apply(settings),
            Err(poisoned) => poisoned.into_inner().apply(settings),
        }
    }

    /// Reload the data files from the configured paths and tell the user how it went
    async fn reload(&self) -> LoadReport {
        self.store.set_paths(self.config().paths);
        let report = self.store.reload();
        self.report_load(&report).await;
        report
    }

    async fn report_load(&self, report: &LoadReport) {
        let paths = self.store.paths();

        match (&report.symbols, &paths.symbols) {
            (Some(err), _) => {
                tracing::error!(error = %err, "failed to load SageMath symbols");
                self.client
                    .log_message(MessageType::ERROR, format!("{SYMBOLS_FAILED} ({err})"))
                    .await;
                self.client
                    .show_message(MessageType::ERROR, SYMBOLS_FAILED)
                    .await;
            }
            (None, Some(_)) => {
                self.client
                    .log_message(MessageType::INFO, SYMBOLS_LOADED)
                    .await;
            }
            (None, None) => {
                tracing::warn!("no symbol file configured");
                self.client
                    .log_message(MessageType::WARNING, "No SageMath symbol file configured")
                    .await;
            }
        }

        if let Some(err) = &report.keywords {
            tracing::warn!(error = %err, "failed to load SageMath keywords");
            self.client
                .show_message(
                    MessageType::WARNING,
                    format!("Failed to load SageMath keywords: {err}"),
                )
                .await;
        }
    }

    async fn run_file(&self, command: &str, arguments: &[Value]) -> Result<Option<Value>> {
        let config = self.config();
        let request = match handlers::commands::run_request(command, arguments, &config) {
            Ok(request) => request,
            Err(err) => {
                self.client
                    .show_message(MessageType::INFO, err.message.to_string())
                    .await;
                return Ok(None);
            }
        };

        self.log_debug(&format!("Running: {}", request.shell_line()))
            .await;

        match request.execute().await {
            Ok(output) => {
                self.forward_output(&request, &output).await;
                Ok(Some(handlers::commands::run_output_value(&request, &output)))
            }
            Err(err) => {
                self.report_run_error(&request, &err).await;
                Err(handlers::commands::run_error(&err))
            }
        }
    }

    async fn forward_output(&self, request: &RunRequest, output: &sagemath_lsp_core::RunOutput) {
        if !output.stdout.is_empty() {
            self.client
                .log_message(MessageType::LOG, output.stdout.clone())
                .await;
        }
        if !output.stderr.is_empty() {
            self.client
                .log_message(MessageType::WARNING, output.stderr.clone())
                .await;
        }
        if !output.success {
            let code = output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            self.client
                .show_message(
                    MessageType::ERROR,
                    format!("Sage Run: {} exited with {code}", request.file.display()),
                )
                .await;
        }
    }

    async fn report_run_error(&self, request: &RunRequest, err: &RunError) {
        tracing::error!(error = %err, file = %request.file.display(), "Sage run failed");
        self.client
            .show_message(MessageType::ERROR, err.to_string())
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.log_debug("Initializing SageMath LSP server").await;

        if let Some(options) = params.initialization_options.as_ref() {
            self.apply_settings(ClientSettings::from_value(options));
        }

        Ok(InitializeResult {
            capabilities: capabilities::server_capabilities(),
            server_info: Some(ServerInfo {
                name: "sagemath-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.reload().await;
        self.log_debug("Server initialized successfully").await;
        self.client
            .log_message(MessageType::INFO, "SageMath LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.log_debug("Shutting down server").await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents
            .insert(uri.clone(), Document::new(params.text_document.text));
        self.log_debug(&format!("Document opened: {}", uri)).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        self.log_debug(&format!("Document changed: {}", uri)).await;

        if let Some(mut doc) = self.documents.get_mut(&uri) {
            // Apply changes (for full sync, we just replace the entire text)
            for change in params.content_changes {
                doc.update_text(change.text);
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.log_debug(&format!("Document closed: {}", uri)).await;
        self.documents.remove(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.log_debug("Configuration changed").await;
        self.apply_settings(ClientSettings::from_value(&params.settings));
        self.reload().await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        self.log_debug(&format!("Hover request at {:?}", position))
            .await;

        let data = self.store.snapshot();
        Ok(self
            .documents
            .get(uri)
            .and_then(|doc| handlers::hover::get_hover(&doc, &data, position)))
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        self.log_debug(&format!("Completion request at {:?}", position))
            .await;

        let data = self.store.snapshot();
        let case = self.config().match_case;
        let doc = self.documents.get(uri);
        let items =
            handlers::completion::get_completions(doc.as_deref(), &data, position, case);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        self.log_debug(&format!("Execute command: {}", params.command))
            .await;

        match params.command.as_str() {
            COMMAND_RUN_FILE | COMMAND_RUN_FILE_AND_CLEAN => {
                self.run_file(&params.command, &params.arguments).await
            }
            COMMAND_RELOAD_SYMBOLS => {
                let report = self.reload().await;
                let data = self.store.snapshot();
                Ok(Some(json!({
                    "ok": report.is_ok(),
                    "classes": data.catalog.classes.len(),
                    "functions": data.catalog.functions.len(),
                    "constants": data.catalog.constants.len(),
                    "keywords": data.keywords.len(),
                })))
            }
            COMMAND_EXECUTOR_COMMAND => Ok(Some(handlers::commands::executor_command_value(
                &self.config(),
            ))),
            COMMAND_EXECUTOR_MAP => Ok(Some(handlers::commands::executor_map_value(
                &params.arguments,
                &self.config(),
            ))),
            other => Err(Error::invalid_params(format!("Unknown command: {other}"))),
        }
    }
}
