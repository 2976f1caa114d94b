//! # image-kitchen
//!
//! Batch image manipulation over a directory: JPG↔PNG conversion, cropping,
//! resizing and thumbnails. Every operation is one *batch*: a single
//! transform applied to each eligible file directly under a source directory,
//! with outputs written to a destination directory.
//!
//! ```text
//! TransformRequest ─→ BatchTransformEngine ─→ ImageBackend (per file)
//!                             │
//!                             └─→ BatchSummary (converted / skipped / failed)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Directory sweep, failure isolation, per-file results, batch summary |
//! | [`imaging`] | Dimension math, parameter types, `ImageBackend` trait and the `image`-crate backend |
//! | [`request`] | Typed requests and the pure menu-choice-to-request mapping |
//! | [`naming`] | Eligible extensions per transform and output file names |
//! | [`config`] | `image-kitchen.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting and the progress printer |
//! | [`menu`] | Interactive numbered menu |
//!
//! # Design Decisions
//!
//! ## One file, one result
//!
//! A corrupt or unreadable image never stops the batch by default; it becomes
//! a `Failed` entry in the summary and the sweep continues. Only problems with
//! the batch itself (missing source directory, unwritable destination) are
//! errors. `on_error = "abort"` restores stop-at-first-failure behaviour.
//!
//! ## No partial outputs
//!
//! Outputs are encoded in memory and renamed into place, so the destination
//! only ever contains complete images.
//!
//! ## The source directory is read-only
//!
//! The engine refuses a destination that resolves to the source directory
//! or to anywhere below it.

pub mod config;
pub mod engine;
pub mod imaging;
pub mod menu;
pub mod naming;
pub mod output;
pub mod request;

pub use engine::{
    BatchEvent, BatchSummary, BatchTransformEngine, EngineError, EngineOptions, FailurePolicy,
    FileResult, Outcome,
};
pub use request::{Transform, TransformKind, TransformRequest};
