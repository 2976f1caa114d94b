//! Batch directory-transform engine.
//!
//! Applies one [`Transform`] to every eligible file directly under a source
//! directory and writes the results into a destination directory.
//!
//! ## Flow
//!
//! ```text
//! check source ─→ list entries ─→ split eligible / skipped
//!                                        │
//!        create dest (once) ←────────────┘
//!              │
//!              └─→ per file: decode → transform → encode → write
//!                                        │
//!                             FileResult (Converted | Failed)
//!                                        │
//!                                  BatchSummary
//! ```
//!
//! ## Failure handling
//!
//! Problems with the batch itself (missing source directory, unwritable
//! destination) are returned as [`EngineError`] before any file is touched.
//! Problems with a single file become a `Failed` [`FileResult`]:
//!
//! - [`FailurePolicy::Isolate`] (default): every eligible file is attempted,
//!   in parallel when the rayon pool has more than one thread.
//! - [`FailurePolicy::Abort`]: files are processed one at a time and the batch
//!   stops at the first failure, recorded in [`BatchSummary::aborted_on`].
//!
//! The engine never writes into its own source directory, and the backend
//! writes outputs atomically, so a failed file leaves nothing behind.
//!
//! ## Progress events
//!
//! When a [`Sender`] is attached with [`BatchTransformEngine::with_events`],
//! a [`BatchEvent`] is sent when the batch starts and after each processed
//! file. Skipped files are counted but produce no event.

use crate::imaging::{
    CropBox, Dimensions, EncodeSettings, ErrorKind, ImageBackend, OutputFormat, RustBackend,
    apply_transform,
};
use crate::naming::{is_eligible, output_file_name};
use crate::request::{RequestError, Transform, TransformKind, TransformRequest};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error("Destination {} is the source directory or inside it", .0.display())]
    DestinationIsSource(PathBuf),
    #[error("Cannot read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot create destination directory {}: {source}", .path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    InvalidParameters(#[from] RequestError),
}

impl EngineError {
    /// Error kind as shown to the user.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) | Self::DestinationIsSource(_) => "InvalidParameters",
            _ => "IOError",
        }
    }
}

/// What a failed file does to the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Report the failure and continue with the remaining files.
    #[default]
    Isolate,
    /// Stop at the first failure.
    Abort,
}

/// Settings shared by every file of every batch an engine runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineOptions {
    pub settings: EncodeSettings,
    pub on_error: FailurePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Converted,
    Skipped,
    Failed,
}

/// What happened to one directory entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub outcome: Outcome,
    /// Name of the written file, for converted entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Pixel size of the written file, for converted entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn converted(filename: &str, output: String, dimensions: Dimensions) -> Self {
        Self {
            filename: filename.to_string(),
            outcome: Outcome::Converted,
            output: Some(output),
            dimensions: Some(dimensions),
            error_kind: None,
            error: None,
        }
    }

    pub fn skipped(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            outcome: Outcome::Skipped,
            output: None,
            dimensions: None,
            error_kind: None,
            error: None,
        }
    }

    pub fn failed(filename: &str, kind: ErrorKind, message: String) -> Self {
        Self {
            filename: filename.to_string(),
            outcome: Outcome::Failed,
            output: None,
            dimensions: None,
            error_kind: Some(kind),
            error: Some(message),
        }
    }
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        kind: TransformKind,
        eligible: usize,
        skipped: usize,
    },
    FileProcessed {
        kind: TransformKind,
        result: FileResult,
    },
}

/// Aggregate result of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub kind: TransformKind,
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Every directory entry that is a file, sorted by filename.
    pub results: Vec<FileResult>,
    /// The file whose failure stopped the batch under [`FailurePolicy::Abort`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_on: Option<String>,
}

impl BatchSummary {
    fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn converted(&self) -> usize {
        self.count(Outcome::Converted)
    }

    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.results.iter().filter(|r| r.outcome == Outcome::Failed)
    }

    /// True when no file failed and the batch ran to completion.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.aborted_on.is_none()
    }

    pub fn result(&self, filename: &str) -> Option<&FileResult> {
        self.results.iter().find(|r| r.filename == filename)
    }
}

/// Runs transform batches against an [`ImageBackend`].
pub struct BatchTransformEngine<B: ImageBackend = RustBackend> {
    backend: B,
    options: EngineOptions,
    events: Option<Sender<BatchEvent>>,
}

impl BatchTransformEngine<RustBackend> {
    pub fn new(options: EngineOptions) -> Self {
        Self::with_backend(RustBackend::new(), options)
    }
}

impl<B: ImageBackend> BatchTransformEngine<B> {
    /// Build an engine on a specific backend (allows testing with mock).
    pub fn with_backend(backend: B, options: EngineOptions) -> Self {
        Self {
            backend,
            options,
            events: None,
        }
    }

    /// Send progress events to `tx` during every batch.
    pub fn with_events(mut self, tx: Sender<BatchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Re-encode every matching image as `target`.
    ///
    /// JPEG sources are picked up for PNG output and PNG sources for JPEG output.
    pub fn convert_format(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        target: OutputFormat,
    ) -> Result<BatchSummary, EngineError> {
        let request = TransformRequest::new(source_dir, dest_dir, Transform::Convert(target))?;
        self.run(&request)
    }

    /// Cut `region` out of every image, keeping file names.
    pub fn crop(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        region: CropBox,
    ) -> Result<BatchSummary, EngineError> {
        let request = TransformRequest::new(source_dir, dest_dir, Transform::Crop(region))?;
        self.run(&request)
    }

    /// Stretch every image to exactly `width` x `height`.
    pub fn resize(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<BatchSummary, EngineError> {
        let request =
            TransformRequest::new(source_dir, dest_dir, Transform::Resize { width, height })?;
        self.run(&request)
    }

    /// Scale every image down to fit within `max_width` x `max_height`.
    pub fn thumbnail(
        &self,
        source_dir: &Path,
        dest_dir: &Path,
        max_width: u32,
        max_height: u32,
    ) -> Result<BatchSummary, EngineError> {
        let request = TransformRequest::new(
            source_dir,
            dest_dir,
            Transform::Thumbnail {
                max_width,
                max_height,
            },
        )?;
        self.run(&request)
    }

    /// Run one batch.
    pub fn run(&self, request: &TransformRequest) -> Result<BatchSummary, EngineError> {
        let source_dir = request.source_dir();
        let dest_dir = request.dest_dir();
        let kind = request.kind();

        check_source(source_dir)?;
        if is_within(dest_dir, source_dir) {
            return Err(EngineError::DestinationIsSource(dest_dir.to_path_buf()));
        }

        let listing = list_files(source_dir)?;
        let (eligible, ineligible): (Vec<OsString>, Vec<OsString>) = listing
            .into_iter()
            .partition(|name| is_eligible(name, kind));
        log::debug!(
            "{kind}: {} eligible, {} skipped in {}",
            eligible.len(),
            ineligible.len(),
            source_dir.display()
        );

        fs::create_dir_all(dest_dir).map_err(|source| EngineError::CreateDestination {
            path: dest_dir.to_path_buf(),
            source,
        })?;

        self.emit(BatchEvent::Started {
            kind,
            eligible: eligible.len(),
            skipped: ineligible.len(),
        });

        let jobs = plan_outputs(&eligible, request.transform());
        let (mut results, aborted_on) = match self.options.on_error {
            FailurePolicy::Isolate => (self.process_all(request, &jobs), None),
            FailurePolicy::Abort => self.process_until_failure(request, &jobs),
        };

        results.extend(
            ineligible
                .iter()
                .map(|name| FileResult::skipped(&name.to_string_lossy())),
        );
        results.sort_by(|a, b| a.filename.cmp(&b.filename));

        Ok(BatchSummary {
            kind,
            source_dir: source_dir.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            results,
            aborted_on,
        })
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(tx) = &self.events {
            // The receiver going away only means nobody is watching
            let _ = tx.send(event);
        }
    }

    fn process_all(&self, request: &TransformRequest, jobs: &[Job]) -> Vec<FileResult> {
        jobs.par_iter()
            .map(|job| {
                let result = self.process_job(request, job);
                self.emit(BatchEvent::FileProcessed {
                    kind: request.kind(),
                    result: result.clone(),
                });
                result
            })
            .collect()
    }

    fn process_until_failure(
        &self,
        request: &TransformRequest,
        jobs: &[Job],
    ) -> (Vec<FileResult>, Option<String>) {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            let result = self.process_job(request, job);
            self.emit(BatchEvent::FileProcessed {
                kind: request.kind(),
                result: result.clone(),
            });
            let failed = result.outcome == Outcome::Failed;
            results.push(result);
            if failed {
                log::warn!("aborting batch after {} failed", job.filename);
                return (results, Some(job.filename.clone()));
            }
        }
        (results, None)
    }

    fn process_job(&self, request: &TransformRequest, job: &Job) -> FileResult {
        let output_name = match &job.output {
            Ok(name) => name,
            Err(first) => {
                return FileResult::failed(
                    &job.filename,
                    ErrorKind::Io,
                    format!("output name collides with {first}"),
                );
            }
        };

        let source = request.source_dir().join(&job.name);
        let output = request.dest_dir().join(output_name);
        match apply_transform(
            &self.backend,
            request.transform(),
            &source,
            &output,
            self.options.settings,
        ) {
            Ok(dims) => FileResult::converted(
                &job.filename,
                output_name.to_string_lossy().into_owned(),
                dims,
            ),
            Err(e) => {
                log::info!("{}: {e}", job.filename);
                FileResult::failed(&job.filename, e.kind(), e.to_string())
            }
        }
    }
}

/// One eligible file and the output name it owns.
///
/// `name` is the entry as the filesystem spells it; `filename` is its
/// display form for reports. `output` is `Err(other)` when an earlier file
/// (by name) already claimed the same output, e.g. `a.jpg` and `a.jpeg` both
/// converting to `a.png`.
#[derive(Debug, Clone, PartialEq)]
struct Job {
    name: OsString,
    filename: String,
    output: Result<OsString, String>,
}

fn plan_outputs(eligible: &[OsString], transform: &Transform) -> Vec<Job> {
    let mut sorted: Vec<&OsString> = eligible.iter().collect();
    sorted.sort();

    let mut claimed: HashMap<OsString, String> = HashMap::new();
    sorted
        .into_iter()
        .map(|name| {
            let filename = name.to_string_lossy().into_owned();
            let output_name = output_file_name(name, transform);
            let output = match claimed.get(&output_name) {
                Some(first) => Err(first.clone()),
                None => {
                    claimed.insert(output_name.clone(), filename.clone());
                    Ok(output_name)
                }
            };
            Job {
                name: name.clone(),
                filename,
                output,
            }
        })
        .collect()
}

fn check_source(source_dir: &Path) -> Result<(), EngineError> {
    match fs::metadata(source_dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::SourceNotDirectory(source_dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(EngineError::SourceNotFound(source_dir.to_path_buf()))
        }
        Err(source) => Err(EngineError::ReadDir {
            path: source_dir.to_path_buf(),
            source,
        }),
    }
}

/// True when `path` resolves to `dir` or to somewhere below it.
///
/// `path` need not exist yet: its nearest existing ancestor is resolved
/// instead, since everything created beneath that ancestor lands there too.
fn is_within(path: &Path, dir: &Path) -> bool {
    let Ok(dir) = fs::canonicalize(dir) else {
        return false;
    };
    path.ancestors()
        .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
        .find_map(|p| fs::canonicalize(p).ok())
        .is_some_and(|resolved| resolved.starts_with(&dir))
}

/// Names of the regular files directly under `dir` (no recursion).
///
/// Names are kept as the OS reports them, so files whose names are not
/// valid UTF-8 are still opened by their real path.
fn list_files(dir: &Path) -> Result<Vec<OsString>, EngineError> {
    let read_err = |source: io::Error| EngineError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if !entry.path().is_file() {
            continue;
        }
        names.push(entry.file_name());
    }
    Ok(names)
}
