//! SageMath symbol data
//!
//! The symbol file is a JSON object with `classes`, `functions` and
//! `constants` arrays of `{ name, doc }` entries. The keyword file is a plain
//! JSON array of strings. Both are read once and never mutated afterwards.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::CatalogError;

/// A named SageMath identifier with its (HTML or Markdown) documentation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    #[serde(default)]
    pub doc: String,
}

impl Symbol {
    pub fn new(name: impl Into<String>, doc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
        }
    }
}

/// The kind a symbol or completion candidate came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Function,
    Constant,
    Keyword,
}

impl SymbolKind {
    /// Label used in hover and completion details
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "Class",
            SymbolKind::Function => "Function",
            SymbolKind::Constant => "Constant",
            SymbolKind::Keyword => "Keyword",
        }
    }
}

/// All known symbols grouped by kind, in file order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    #[serde(default)]
    pub classes: Vec<Symbol>,
    #[serde(default)]
    pub functions: Vec<Symbol>,
    #[serde(default)]
    pub constants: Vec<Symbol>,
}

impl SymbolCatalog {
    /// Read a catalog from a symbol file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        read_json(path)
    }

    /// Parse a catalog from JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Groups in lookup order: classes, functions, constants
    pub fn groups(&self) -> [(SymbolKind, &[Symbol]); 3] {
        [
            (SymbolKind::Class, self.classes.as_slice()),
            (SymbolKind::Function, self.functions.as_slice()),
            (SymbolKind::Constant, self.constants.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.functions.len() + self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reserved words offered as completions only
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordList(pub Vec<String>);

impl KeywordList {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        read_json(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KeywordList(iter.into_iter().map(Into::into).collect())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_groups_default_to_empty() {
        let catalog = SymbolCatalog::from_json(r#"{"functions": [{"name": "sin"}]}"#).unwrap();
        assert!(catalog.classes.is_empty());
        assert!(catalog.constants.is_empty());
        assert_eq!(catalog.functions, vec![Symbol::new("sin", "")]);
    }

    #[test]
    fn test_group_order() {
        let catalog = SymbolCatalog::default();
        let kinds: Vec<SymbolKind> = catalog.groups().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![SymbolKind::Class, SymbolKind::Function, SymbolKind::Constant]
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"classes": [{{"name": "Set", "doc": "A set"}}], "functions": [], "constants": [{{"name": "pi", "doc": ""}}]}}"#
        )
        .unwrap();

        let catalog = SymbolCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.classes[0].doc, "A set");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SymbolCatalog::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = SymbolCatalog::load(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_keyword_list_is_plain_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["def", "lambda", "yield"]"#).unwrap();
        let keywords = KeywordList::load(file.path()).unwrap();
        assert_eq!(keywords.iter().collect::<Vec<_>>(), vec!["def", "lambda", "yield"]);
    }
}
