//! Core functionality for SageMath editor support
//!
//! This crate holds the logic shared by the language server and the
//! command-line tools.
//!
//! # Features
//!
//! - **Symbols**: the class/function/constant catalog and keyword list
//! - **Lookup**: exact-name hover lookup and prefix completion
//! - **Grammar**: builds the TextMate grammar from the catalog
//! - **Runner**: runs `.sage` files and renders the Code Runner command
//!
//! # Example
//!
//! ```
//! use sagemath_lsp_core::{LanguageData, MatchCase, Symbol, SymbolCatalog};
//!
//! let catalog = SymbolCatalog {
//!     functions: vec![Symbol::new("sin", "<b>sine</b>")],
//!     ..Default::default()
//! };
//! let data = LanguageData::new(catalog, Default::default());
//!
//! assert_eq!(data.lookup("sin").unwrap().symbol.doc, "<b>sine</b>");
//! assert_eq!(data.complete("s", MatchCase::Sensitive).len(), 1);
//! ```

pub mod error;
pub mod grammar;
pub mod lookup;
pub mod runner;
pub mod symbols;

pub use error::{CatalogError, GrammarError, RunError};
pub use grammar::{build_alternation, inject_files, inject_patterns, GrammarPatterns, Injection};
pub use lookup::{
    load_language_data, Candidate, DataPaths, DataStore, LanguageData, LoadReport, MatchCase,
    SymbolMatch,
};
pub use runner::{executor_command, ExecutionMode, RunOutput, RunRequest};
pub use symbols::{KeywordList, Symbol, SymbolCatalog, SymbolKind};
