//! Error types shared by the loaders, the grammar injector and the runner

use std::path::PathBuf;

use thiserror::Error;

/// Failure to read one of the JSON data files
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while producing the TextMate grammar
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("placeholder {placeholder} not found in grammar template")]
    MissingPlaceholder { placeholder: &'static str },

    #[error("grammar output is not valid JSON: {0}")]
    InvalidOutput(#[source] serde_json::Error),
}

/// Failure while running a Sage file
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No active Sage file found.")]
    NotSageFile { path: PathBuf },

    #[error("failed to start `{interpreter}`: {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
