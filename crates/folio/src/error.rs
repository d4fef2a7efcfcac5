//! CLI error types.

use folio_config::ConfigError;
use folio_graph::LoadError;
use folio_source::{AnnotateError, PagesError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Annotate(#[from] AnnotateError),

    #[error("{0}")]
    Pages(#[from] PagesError),

    #[error("writing pages.json failed: {0}")]
    Json(#[from] serde_json::Error),
}
