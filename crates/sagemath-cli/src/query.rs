//! Offline hover and completion queries against the symbol files

use sagemath_lsp_core::{Candidate, LanguageData, MatchCase, SymbolKind, SymbolMatch};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl From<&SymbolMatch<'_>> for Entry {
    fn from(found: &SymbolMatch<'_>) -> Self {
        Entry {
            name: found.symbol.name.clone(),
            kind: kind_label(found.kind),
            doc: Some(found.symbol.doc.clone()),
        }
    }
}

impl From<&Candidate<'_>> for Entry {
    fn from(candidate: &Candidate<'_>) -> Self {
        Entry {
            name: candidate.name.to_string(),
            kind: kind_label(candidate.kind),
            doc: candidate.doc.map(str::to_string),
        }
    }
}

fn kind_label(kind: SymbolKind) -> String {
    kind.as_str().to_lowercase()
}

pub fn lookup(data: &LanguageData, name: &str) -> Option<Entry> {
    data.lookup(name).as_ref().map(Entry::from)
}

pub fn complete(data: &LanguageData, prefix: &str, case: MatchCase) -> Vec<Entry> {
    data.complete(prefix, case).iter().map(Entry::from).collect()
}

/// One `name<TAB>kind` line per entry
pub fn format_completions(entries: &[Entry]) -> String {
    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!("{}\t{}\n", entry.name, entry.kind));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use sagemath_lsp_core::{Symbol, SymbolCatalog};

    fn data() -> LanguageData {
        LanguageData::new(
            SymbolCatalog {
                classes: vec![Symbol::new("Set", "")],
                functions: vec![Symbol::new("sin", "<b>sine</b>")],
                constants: vec![],
            },
            ["self"].into_iter().collect(),
        )
    }

    #[test]
    fn test_lookup_entry() {
        let entry = lookup(&data(), "sin").unwrap();
        assert_eq!(entry.kind, "function");
        assert_eq!(entry.doc.as_deref(), Some("<b>sine</b>"));
        assert!(lookup(&data(), "Set").is_none());
    }

    #[test]
    fn test_format_completions() {
        let entries = complete(&data(), "s", MatchCase::Sensitive);
        assert_eq!(format_completions(&entries), "sin\tfunction\nself\tkeyword\n");
    }

    #[test]
    fn test_entry_json_skips_missing_doc() {
        let entries = complete(&data(), "Se", MatchCase::Sensitive);
        let json = serde_json::to_string(&entries).unwrap();
        assert_eq!(json, r#"[{"name":"Set","kind":"class"}]"#);
    }
}
