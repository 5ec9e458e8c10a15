//! Error types for container decoding and stitching

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::FormatTag;

/// A container input could not be opened
#[derive(Error, Debug)]
pub enum PathError {
    #[error("{0}: no such file")]
    NotFound(PathBuf),

    #[error("{0}: not a regular file")]
    NotAFile(PathBuf),

    #[error("{path}: not an .{expected} file")]
    WrongExtension { path: PathBuf, expected: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The byte stream is not a well-formed container
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("0x{offset:08X}: truncated section header ({remaining} bytes left)")]
    TruncatedHeader { offset: usize, remaining: usize },

    #[error("0x{offset:08X}: section length {declared} is shorter than its header")]
    InvalidLength { offset: usize, declared: u32 },

    #[error("0x{offset:08X}: stream already registered once: {stream_id:08X}")]
    DuplicateStream { offset: usize, stream_id: u32 },

    #[error("0x{offset:08X}: unregistered stream / unknown header ID: {type_code:08X}")]
    UnregisteredStream { offset: usize, type_code: u32 },

    #[error("0x{offset:08X}: payload of {expected} bytes runs past end of file ({available} left)")]
    TruncatedPayload {
        offset: usize,
        expected: usize,
        available: usize,
    },

    #[error("no end-of-stream marker before end of file ({length} bytes)")]
    MissingTerminator { length: usize },
}

/// A source/target pair could not be stitched
#[derive(Error, Debug)]
pub enum StitchError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("source container: {0}")]
    SourceDecode(#[source] DecodeError),

    #[error("target container: {0}")]
    TargetDecode(#[source] DecodeError),

    #[error("mismatched audio formats at audio chunk {index}: target has {expected}, source has {found}")]
    FormatMismatch {
        index: usize,
        expected: FormatTag,
        found: FormatTag,
    },
}

pub type Result<T> = std::result::Result<T, StitchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display_has_offset() {
        let err = DecodeError::UnregisteredStream {
            offset: 0,
            type_code: 0x55,
        };
        assert_eq!(
            err.to_string(),
            "0x00000000: unregistered stream / unknown header ID: 00000055"
        );
    }

    #[test]
    fn test_stitch_error_wraps_side() {
        let err = StitchError::TargetDecode(DecodeError::DuplicateStream {
            offset: 0x20,
            stream_id: 0x0010_0001,
        });
        assert_eq!(
            err.to_string(),
            "target container: 0x00000020: stream already registered once: 00100001"
        );
    }

    #[test]
    fn test_format_mismatch_display() {
        let err = StitchError::FormatMismatch {
            index: 2,
            expected: FormatTag::Vag,
            found: FormatTag::Xwma,
        };
        assert!(err.to_string().contains("target has vag, source has xwma"));
    }
}
