use sagemath_lsp_core::LanguageData;
use tower_lsp::lsp_types::*;

use crate::document::Document;

/// Get hover information for a position in the document
pub fn get_hover(doc: &Document, data: &LanguageData, position: Position) -> Option<Hover> {
    let word = doc.word_at(position)?;
    let found = data.lookup(&word.text)?;

    // Docs are HTML fragments; Markdown renderers pass them through
    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: found.symbol.doc.clone(),
        }),
        range: Some(word.range),
    })
}
