//! Whole-tree undubbing
//!
//! This crate handles:
//! - Pairing target containers with same-named source containers
//! - Stitching every pair and mirroring the target layout under an output root
//! - Listing files that only exist in one of two trees

pub mod diff;
pub mod output;
pub mod pairs;
pub mod run;

use std::path::PathBuf;

use thiserror::Error;
use undub_sdt::StitchError;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}: no same-named file in the source tree")]
    NoSource(PathBuf),

    #[error(transparent)]
    Stitch(#[from] StitchError),
}

pub type Result<T> = std::result::Result<T, TreeError>;

pub use diff::{unique_files, UniqueFile};
pub use output::write_output;
pub use pairs::SourceIndex;
pub use run::{run, Failure, RunSummary, UndubRun};
