use std::io;
use std::path::PathBuf;

use go_surface_syntax::ParseFailure;
use thiserror::Error;

use crate::check::CheckFailure;
use crate::fetch::FetchError;
use crate::model::import_path::ImportPathError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failure of one extraction unit (a file or a directory).
///
/// Every variant is fatal; no partial model is returned alongside it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    /// A checker diagnostic that is not a missing dependency
    #[error("errors type checking source file: {0}")]
    Check(CheckFailure),

    /// Still missing a dependency after the last permitted attempt
    #[error("dependency still unresolved after retrying: {0}")]
    RetryBudgetExhausted(CheckFailure),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    ImportPath(#[from] ImportPathError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
