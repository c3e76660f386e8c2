use tower_lsp::lsp_types::*;

use crate::handlers::commands::ALL_COMMANDS;

/// Define the server capabilities for the SageMath LSP
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Full text sync - simplest to implement
        text_document_sync: Some(TextDocumentSyncCapability::Kind(
            TextDocumentSyncKind::FULL,
        )),

        // Symbol documentation
        hover_provider: Some(HoverProviderCapability::Simple(true)),

        // Catalog and keyword completion on identifier characters
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec!["_".to_string()]),
            ..Default::default()
        }),

        // Run commands, reload, and Code Runner integration
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: ALL_COMMANDS.iter().map(|c| c.to_string()).collect(),
            work_done_progress_options: Default::default(),
        }),

        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertises_every_command() {
        let caps = server_capabilities();
        let commands = caps.execute_command_provider.unwrap().commands;
        assert_eq!(commands.len(), ALL_COMMANDS.len());
        assert!(commands.iter().any(|c| c == "sage.runFileAndClean"));
        assert!(caps.hover_provider.is_some());
        assert!(caps.completion_provider.is_some());
    }
}
