//! Parallel directory processing.
//!
//! Walks an input directory for GIF, JPEG, PNG and WebP files, runs the same
//! operation chain over each one and writes the result under the output
//! directory at the same relative path:
//!
//! ```text
//! photos/                      thumbs/
//! ├── wide.png          →      ├── wide.png
//! └── trips/                   └── trips/
//!     └── dawn.jpg      →          └── dawn.jpg   (or dawn.webp with --format webp)
//! ```
//!
//! Files are processed on a rayon pool sized from `[processing]`. Each worker
//! opens its own [`Thumbnail`]; handles are never shared between threads.
//! A file that fails is recorded in the [`BatchReport`] and the rest carry on.
//!
//! Progress is reported as [`BatchEvent`]s over an optional mpsc channel so
//! the CLI can print while workers run.

use crate::imaging::{Dimensions, ImageBackend, ImageFormat, Options, Thumbnail};
use crate::recipe::{Operation, apply_recipe};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input directory not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What to do with every file.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub operations: Vec<Operation>,
    /// Convert outputs to this format. `None` keeps each source's format.
    pub format: Option<ImageFormat>,
    pub options: Options,
    /// Worker count, see [`effective_threads`](crate::config::effective_threads).
    pub threads: usize,
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Processed {
        source: PathBuf,
        before: Dimensions,
        after: Dimensions,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

/// One successfully written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    /// Path relative to the input directory.
    pub source: PathBuf,
    pub output: PathBuf,
    pub before: Dimensions,
    pub after: Dimensions,
}

/// One file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Outcome of a whole batch, in input-path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub processed: Vec<BatchItem>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len()
    }
}

/// Supported images under `root`, as sorted paths relative to it.
///
/// `skip` prunes a subtree, used to keep an output directory that lives inside
/// the input from being picked up. Paths are compared component-wise, so
/// `root` and `skip` must be spelled the same way (both canonical).
pub fn find_images(root: &Path, skip: Option<&Path>) -> Result<Vec<PathBuf>, BatchError> {
    if !root.is_dir() {
        return Err(BatchError::InputNotFound(root.to_path_buf()));
    }
    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| skip.is_none_or(|s| !e.path().starts_with(s)));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || ImageFormat::from_path(entry.path()).is_none() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            found.push(rel.to_path_buf());
        }
    }
    found.sort();
    Ok(found)
}

/// Where `rel` ends up under `output_dir`, with the extension switched when
/// converting.
pub fn output_path(output_dir: &Path, rel: &Path, format: Option<ImageFormat>) -> PathBuf {
    let path = output_dir.join(rel);
    match format {
        Some(f) => path.with_extension(f.extension()),
        None => path,
    }
}

/// Process every image under `input_dir` into `output_dir`.
///
/// Only setup problems (missing input, unreadable tree, pool creation) are
/// errors. Per-file failures land in [`BatchReport::failed`].
pub fn run_batch<B>(
    backend: &B,
    input_dir: &Path,
    output_dir: &Path,
    batch: &BatchOptions,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError>
where
    B: ImageBackend + Clone + Send,
{
    use rayon::prelude::*;

    if !input_dir.is_dir() {
        return Err(BatchError::InputNotFound(input_dir.to_path_buf()));
    }
    std::fs::create_dir_all(output_dir)?;
    // Compare canonical paths so `batch . thumbs` still prunes `./thumbs`.
    let files = find_images(
        &input_dir.canonicalize()?,
        Some(&output_dir.canonicalize()?),
    )?;
    info!(
        input = %input_dir.display(),
        output = %output_dir.display(),
        files = files.len(),
        threads = batch.threads,
        backend = backend.name(),
        "starting batch"
    );
    if let Some(tx) = &events {
        tx.send(BatchEvent::Started { total: files.len() }).ok();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(batch.threads.max(1))
        .build()?;

    let outcomes: Vec<Result<BatchItem, BatchFailure>> = pool.install(|| {
        files
            .par_iter()
            .map_with(events, |tx, rel| {
                let outcome = process_one(backend, input_dir, output_dir, rel, batch);
                let event = match &outcome {
                    Ok(item) => {
                        info!(source = %rel.display(), before = %item.before, after = %item.after, "processed");
                        BatchEvent::Processed {
                            source: item.source.clone(),
                            before: item.before,
                            after: item.after,
                        }
                    }
                    Err(failure) => {
                        warn!(source = %rel.display(), error = %failure.error, "failed");
                        BatchEvent::Failed {
                            source: failure.source.clone(),
                            error: failure.error.clone(),
                        }
                    }
                };
                if let Some(tx) = tx {
                    tx.send(event).ok();
                }
                outcome
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(item) => report.processed.push(item),
            Err(failure) => report.failed.push(failure),
        }
    }
    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}

fn process_one<B: ImageBackend + Clone>(
    backend: &B,
    input_dir: &Path,
    output_dir: &Path,
    rel: &Path,
    batch: &BatchOptions,
) -> Result<BatchItem, BatchFailure> {
    let fail = |error: String| BatchFailure {
        source: rel.to_path_buf(),
        error,
    };

    let mut thumb = Thumbnail::open(input_dir.join(rel), batch.options, backend.clone())
        .map_err(|e| fail(e.to_string()))?;
    let before = thumb.dimensions();
    apply_recipe(&mut thumb, &batch.operations).map_err(|e| fail(e.to_string()))?;

    let output = output_path(output_dir, rel, batch.format);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }
    let format = batch.format.unwrap_or(thumb.format());
    thumb
        .save_as(&output, format)
        .map_err(|e| fail(e.to_string()))?;

    Ok(BatchItem {
        source: rel.to_path_buf(),
        output,
        before,
        after: thumb.dimensions(),
    })
}
