//! Hover and completion lookups over the loaded symbol data

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::CatalogError;
use crate::symbols::{KeywordList, Symbol, SymbolCatalog, SymbolKind};

/// Case policy for prefix matching
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchCase {
    #[default]
    Sensitive,
    Insensitive,
}

/// Result of an exact lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolMatch<'a> {
    pub symbol: &'a Symbol,
    pub kind: SymbolKind,
}

/// One completion candidate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
    /// `None` when the symbol has no documentation (always `None` for keywords)
    pub doc: Option<&'a str>,
}

/// Immutable lookup tables built from the symbol and keyword files
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LanguageData {
    pub catalog: SymbolCatalog,
    pub keywords: KeywordList,
}

impl LanguageData {
    pub fn new(catalog: SymbolCatalog, keywords: KeywordList) -> Self {
        Self { catalog, keywords }
    }

    /// Find the documented symbol named exactly `ident`.
    ///
    /// Only the first symbol with that name counts: if it has an empty doc
    /// the result is `None` even when a later group has a documented entry.
    pub fn lookup(&self, ident: &str) -> Option<SymbolMatch<'_>> {
        let (kind, symbol) = self
            .catalog
            .groups()
            .into_iter()
            .flat_map(|(kind, symbols)| symbols.iter().map(move |s| (kind, s)))
            .find(|(_, s)| s.name == ident)?;

        if symbol.doc.is_empty() {
            return None;
        }
        Some(SymbolMatch { symbol, kind })
    }

    /// All symbols and keywords starting with `prefix`, grouped in the order
    /// classes, functions, constants, keywords
    pub fn complete(&self, prefix: &str, case: MatchCase) -> Vec<Candidate<'_>> {
        let matcher = PrefixMatcher::new(prefix, case);
        let mut out = Vec::new();

        for (kind, symbols) in self.catalog.groups() {
            out.extend(
                symbols
                    .iter()
                    .filter(|s| matcher.matches(&s.name))
                    .map(|s| Candidate {
                        name: &s.name,
                        kind,
                        doc: (!s.doc.is_empty()).then_some(s.doc.as_str()),
                    }),
            );
        }

        out.extend(
            self.keywords
                .iter()
                .filter(|k| matcher.matches(k))
                .map(|name| Candidate {
                    name,
                    kind: SymbolKind::Keyword,
                    doc: None,
                }),
        );

        out
    }
}

struct PrefixMatcher {
    prefix: String,
    case: MatchCase,
}

impl PrefixMatcher {
    fn new(prefix: &str, case: MatchCase) -> Self {
        let prefix = match case {
            MatchCase::Sensitive => prefix.to_string(),
            MatchCase::Insensitive => prefix.to_lowercase(),
        };
        Self { prefix, case }
    }

    fn matches(&self, name: &str) -> bool {
        match self.case {
            MatchCase::Sensitive => name.starts_with(&self.prefix),
            MatchCase::Insensitive => name.to_lowercase().starts_with(&self.prefix),
        }
    }
}

/// Outcome of loading both data files
#[derive(Debug, Default)]
pub struct LoadReport {
    pub symbols: Option<CatalogError>,
    pub keywords: Option<CatalogError>,
}

impl LoadReport {
    pub fn is_ok(&self) -> bool {
        self.symbols.is_none() && self.keywords.is_none()
    }
}

/// Where the data files live. The keyword file is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataPaths {
    pub symbols: Option<PathBuf>,
    pub keywords: Option<PathBuf>,
}

/// Load both files, substituting empty tables for anything unreadable
pub fn load_language_data(paths: &DataPaths) -> (LanguageData, LoadReport) {
    let mut report = LoadReport::default();

    let catalog = match paths.symbols.as_deref() {
        Some(path) => load_or_empty(path, SymbolCatalog::load, &mut report.symbols),
        None => SymbolCatalog::default(),
    };
    let keywords = match paths.keywords.as_deref() {
        Some(path) => load_or_empty(path, KeywordList::load, &mut report.keywords),
        None => KeywordList::default(),
    };

    tracing::info!(
        classes = catalog.classes.len(),
        functions = catalog.functions.len(),
        constants = catalog.constants.len(),
        keywords = keywords.len(),
        "loaded SageMath language data"
    );

    (LanguageData::new(catalog, keywords), report)
}

fn load_or_empty<T: Default>(
    path: &Path,
    load: fn(&Path) -> Result<T, CatalogError>,
    slot: &mut Option<CatalogError>,
) -> T {
    match load(path) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "using empty table");
            *slot = Some(err);
            T::default()
        }
    }
}

/// Holds the current snapshot and swaps it wholesale on reload
#[derive(Debug)]
pub struct DataStore {
    paths: RwLock<DataPaths>,
    current: RwLock<Arc<LanguageData>>,
}

impl DataStore {
    /// Load from `paths` and keep them for later reloads
    pub fn open(paths: DataPaths) -> (Self, LoadReport) {
        let (data, report) = load_language_data(&paths);
        let store = Self {
            paths: RwLock::new(paths),
            current: RwLock::new(Arc::new(data)),
        };
        (store, report)
    }

    /// A store serving fixed data, with nothing to reload from
    pub fn with_data(data: LanguageData) -> Self {
        Self {
            paths: RwLock::new(DataPaths::default()),
            current: RwLock::new(Arc::new(data)),
        }
    }

    pub fn snapshot(&self) -> Arc<LanguageData> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn paths(&self) -> DataPaths {
        match self.paths.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Point the store at new files; takes effect on the next `reload`
    pub fn set_paths(&self, paths: DataPaths) {
        match self.paths.write() {
            Ok(mut guard) => *guard = paths,
            Err(poisoned) => *poisoned.into_inner() = paths,
        }
    }

    /// Re-read the files and replace the snapshot. Snapshots handed out
    /// earlier keep their old contents.
    pub fn reload(&self) -> LoadReport {
        let (data, report) = load_language_data(&self.paths());
        let data = Arc::new(data);
        match self.current.write() {
            Ok(mut guard) => *guard = data,
            Err(poisoned) => *poisoned.into_inner() = data,
        }
        report
    }
}
