//! Undub a whole target tree
//!
//! Every container under the target root is stitched with the same-named
//! container from the source root and written to the same relative path under
//! the output root. A pair that fails is logged and counted; the run goes on.

use std::path::{Path, PathBuf};

use undub_sdt::{has_extension, stitch_files, StitchOptions, StitchStats};
use walkdir::WalkDir;

use crate::output::{ensure_dir, write_output};
use crate::pairs::SourceIndex;
use crate::{Result, TreeError};

/// Roots and options for one run
#[derive(Debug, Clone)]
pub struct UndubRun {
    /// Tree supplying the audio
    pub source_root: PathBuf,
    /// Tree supplying everything else
    pub target_root: PathBuf,
    pub output_root: PathBuf,
    pub options: StitchOptions,
}

/// A target file that could not be undubbed
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: TreeError,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// Every file seen under the target root
    pub files: usize,
    pub stitched: usize,
    /// Files without the container extension, left out of the output
    pub skipped: usize,
    pub failures: Vec<Failure>,
    /// Stitches that dropped target audio for lack of source audio
    pub short_on_audio: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Failed files over all files seen
    pub fn failure_ratio(&self) -> f64 {
        if self.files == 0 {
            0.0
        } else {
            self.failed() as f64 / self.files as f64
        }
    }
}

/// Stitch one target file against the index and write the result
fn undub_file(
    job: &UndubRun,
    sources: &SourceIndex,
    target: &Path,
    relative: &Path,
) -> Result<StitchStats> {
    let name = target
        .file_name()
        .ok_or_else(|| TreeError::NoSource(target.to_path_buf()))?;
    let source = sources
        .find(name)
        .ok_or_else(|| TreeError::NoSource(target.to_path_buf()))?;

    let stitched = stitch_files(source, target, &job.options)?;
    write_output(&job.output_root, relative, &stitched.bytes)?;
    Ok(stitched.stats)
}

pub fn run(job: &UndubRun) -> Result<RunSummary> {
    tracing::info!(
        "Copying audio from {} over {} into {}",
        job.source_root.display(),
        job.target_root.display(),
        job.output_root.display()
    );

    let sources = SourceIndex::build(&job.source_root)?;
    let mut summary = RunSummary::default();

    // Keep an output root nested in the target tree out of the walk
    let mut walker = WalkDir::new(&job.target_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != job.output_root.as_path());

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            // Only an unreadable target root ends the run
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| job.target_root.clone());
                tracing::error!("Unable to read {}: {}", path.display(), e);
                summary.failures.push(Failure {
                    path,
                    error: e.into(),
                });
                continue;
            }
        };
        let path = entry.path();
        let relative = path
            .strip_prefix(&job.target_root)
            .unwrap_or(path)
            .to_path_buf();

        if entry.file_type().is_dir() {
            tracing::info!("Copying for {}", path.display());
            let dest = job.output_root.join(&relative);
            match ensure_dir(&dest) {
                Ok(()) => {}
                Err(error) if entry.depth() == 0 => return Err(error),
                Err(error) => {
                    // Nothing below can be written; skip the subtree
                    tracing::error!("Unable to create {}: {}", dest.display(), error);
                    summary.failures.push(Failure {
                        path: path.to_path_buf(),
                        error,
                    });
                    walker.skip_current_dir();
                }
            }
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        summary.files += 1;
        if !has_extension(path, &job.options.extension) {
            tracing::debug!("Skipping {}", path.display());
            summary.skipped += 1;
            continue;
        }

        match undub_file(job, &sources, path, &relative) {
            Ok(stats) => {
                summary.stitched += 1;
                if stats.dropped > 0 {
                    summary.short_on_audio += 1;
                }
            }
            Err(error) => {
                tracing::error!("Unable to copy data over for {}: {}", path.display(), error);
                summary.failures.push(Failure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        "{} files, {} stitched, {} skipped, {} failed (proportion {:.3})",
        summary.files,
        summary.stitched,
        summary.skipped,
        summary.failed(),
        summary.failure_ratio()
    );
    Ok(summary)
}
