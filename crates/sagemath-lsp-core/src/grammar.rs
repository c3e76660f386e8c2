//! TextMate grammar generation
//!
//! The grammar template contains three quoted placeholders. Each one is
//! replaced by the JSON string form of an alternation regex built from one
//! symbol group, so the template stays valid JSON after substitution.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::GrammarError;
use crate::symbols::{Symbol, SymbolCatalog, SymbolKind};

pub const CLASSES_PLACEHOLDER: &str = "__SAGE_CLASSES__";
pub const FUNCTIONS_PLACEHOLDER: &str = "__SAGE_FUNCTIONS__";
pub const CONSTANTS_PLACEHOLDER: &str = "__SAGE_CONSTANTS__";

/// Pattern emitted for an empty group. A position can't be both a word
/// boundary and a non-boundary, so this never matches.
pub const NEVER_MATCH: &str = r"\b\B";

/// Build a regex matching any of the symbol names as a whole word.
///
/// Names are escaped and kept in input order. Empty names are skipped.
pub fn build_alternation(symbols: &[Symbol]) -> String {
    let names: Vec<&str> = symbols
        .iter()
        .map(|s| s.name.as_str())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return NEVER_MATCH.to_string();
    }

    if names.iter().all(|name| word_edged(name)) {
        let alternatives: Vec<String> = names.iter().map(|name| regex::escape(name)).collect();
        return format!(r"\b({})\b", alternatives.join("|"));
    }

    // A `\b` next to a non-word character would demand a word character on
    // the far side, so boundaries go only on the word-character edges.
    let alternatives: Vec<String> = names.iter().map(|name| bounded(name)).collect();
    format!("({})", alternatives.join("|"))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word_edged(name: &str) -> bool {
    let first = name.chars().next().is_some_and(is_word_char);
    let last = name.chars().next_back().is_some_and(is_word_char);
    first && last
}

fn bounded(name: &str) -> String {
    let mut out = String::new();
    if name.chars().next().is_some_and(is_word_char) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(name));
    if name.chars().next_back().is_some_and(is_word_char) {
        out.push_str(r"\b");
    }
    out
}

/// One alternation pattern per symbol group
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarPatterns {
    pub classes: String,
    pub functions: String,
    pub constants: String,
}

impl GrammarPatterns {
    pub fn from_catalog(catalog: &SymbolCatalog) -> Self {
        Self {
            classes: build_alternation(&catalog.classes),
            functions: build_alternation(&catalog.functions),
            constants: build_alternation(&catalog.constants),
        }
    }

    fn entries(&self) -> [(SymbolKind, &'static str, &str); 3] {
        [
            (SymbolKind::Class, CLASSES_PLACEHOLDER, self.classes.as_str()),
            (SymbolKind::Function, FUNCTIONS_PLACEHOLDER, self.functions.as_str()),
            (SymbolKind::Constant, CONSTANTS_PLACEHOLDER, self.constants.as_str()),
        ]
    }
}

/// The substituted grammar and how many times each placeholder was replaced
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Injection {
    pub grammar: String,
    pub replacements: Vec<(SymbolKind, usize)>,
}

impl Injection {
    pub fn total_replacements(&self) -> usize {
        self.replacements.iter().map(|(_, n)| n).sum()
    }
}

/// Replace every quoted placeholder in `template` with its JSON-quoted pattern.
///
/// Fails if any placeholder is absent or the result is not valid JSON.
pub fn inject_patterns(
    template: &str,
    patterns: &GrammarPatterns,
) -> Result<Injection, GrammarError> {
    let mut grammar = template.to_string();
    let mut replacements = Vec::with_capacity(3);

    for (kind, placeholder, pattern) in patterns.entries() {
        let quoted_placeholder = format!("\"{placeholder}\"");
        let count = grammar.matches(&quoted_placeholder).count();
        if count == 0 {
            return Err(GrammarError::MissingPlaceholder { placeholder });
        }

        let quoted_pattern =
            serde_json::to_string(pattern).map_err(GrammarError::InvalidOutput)?;
        grammar = grammar.replace(&quoted_placeholder, &quoted_pattern);
        tracing::debug!(placeholder, count, "replaced placeholder");
        replacements.push((kind, count));
    }

    serde_json::from_str::<serde_json::Value>(&grammar).map_err(GrammarError::InvalidOutput)?;

    Ok(Injection {
        grammar,
        replacements,
    })
}

/// Write `contents` to `path` via a sibling temp file and a rename.
/// An existing file keeps its permissions; a new one is created `0644` on unix.
pub fn write_grammar(path: &Path, contents: &str) -> Result<(), GrammarError> {
    let io_err = |source| GrammarError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    if let Some(perms) = output_permissions(path) {
        tmp.as_file().set_permissions(perms).map_err(io_err)?;
    }
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

fn output_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Read the symbol file and template, inject, and write the grammar
pub fn inject_files(
    symbols_path: &Path,
    template_path: &Path,
    output_path: &Path,
) -> Result<Injection, GrammarError> {
    tracing::info!("Reading symbols from {}", symbols_path.display());
    let catalog = SymbolCatalog::load(symbols_path)?;

    tracing::info!("Reading template grammar from {}", template_path.display());
    let template = fs::read_to_string(template_path).map_err(|source| GrammarError::Io {
        path: template_path.to_path_buf(),
        source,
    })?;

    tracing::info!("Injecting symbols into grammar");
    let injection = inject_patterns(&template, &GrammarPatterns::from_catalog(&catalog))?;

    tracing::info!("Writing final grammar file to {}", output_path.display());
    write_grammar(output_path, &injection.grammar)?;

    Ok(injection)
}
