//! `.sdt` stream container support
//!
//! This crate handles:
//! - Decoding containers into sections and re-encoding them byte-exactly
//! - Grouping sections into chunks and classifying them by stream format
//! - Stitching the audio of one localized container into another
//! - Per-stream summaries for inspection

pub mod chunk;
pub mod error;
pub mod file;
pub mod inspect;
pub mod registry;
pub mod section;
pub mod stitch;

pub use chunk::{group, Chunk};
pub use error::{DecodeError, PathError, Result, StitchError};
pub use file::{has_extension, read_container};
pub use inspect::{inspect, ContainerSummary, StreamSummary};
pub use registry::{classify, FormatKind, FormatTag};
pub use section::{decode, serialize, Body, Container, Header, Section};
pub use stitch::{plan, stitch, stitch_bytes, stitch_files, StitchOptions, StitchPlan, StitchStats, Stitched};
