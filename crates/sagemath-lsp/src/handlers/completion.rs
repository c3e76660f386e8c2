use sagemath_lsp_core::{Candidate, LanguageData, MatchCase, SymbolKind};
use tower_lsp::lsp_types::*;

use crate::document::Document;

/// Convert a core completion candidate to an LSP completion item
fn convert_to_lsp_completion(candidate: &Candidate<'_>) -> CompletionItem {
    let kind = match candidate.kind {
        SymbolKind::Class => CompletionItemKind::CLASS,
        SymbolKind::Function => CompletionItemKind::FUNCTION,
        SymbolKind::Constant => CompletionItemKind::CONSTANT,
        SymbolKind::Keyword => CompletionItemKind::KEYWORD,
    };

    CompletionItem {
        label: candidate.name.to_string(),
        kind: Some(kind),
        detail: Some(format!("(SageMath {})", candidate.kind.as_str())),
        documentation: candidate.doc.map(|doc| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: doc.to_string(),
            })
        }),
        ..Default::default()
    }
}

/// Get completion items for a position in the document
pub fn get_completions(
    doc: Option<&Document>,
    data: &LanguageData,
    position: Position,
    case: MatchCase,
) -> Vec<CompletionItem> {
    let prefix = doc.map(|d| d.prefix_at(position)).unwrap_or_default();

    data.complete(&prefix, case)
        .iter()
        .map(convert_to_lsp_completion)
        .collect()
}
