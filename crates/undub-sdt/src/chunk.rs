//! Grouping of sections into chunks
//!
//! A chunk is a maximal run of consecutive sections with the same type code.
//! All registrations at the head of a file therefore form one chunk, and an
//! audio stream interleaved with video shows up as many small chunks.

use crate::registry::{classify, FormatTag};
use crate::section::Section;

/// A run of same-type sections, borrowed from the decoded sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    sections: &'a [Section],
}

impl<'a> Chunk<'a> {
    pub fn sections(&self) -> &'a [Section] {
        self.sections
    }

    fn first(&self) -> &'a Section {
        // Chunks are built non-empty
        &self.sections[0]
    }

    pub fn type_code(&self) -> u32 {
        self.first().type_code()
    }

    /// Format of the stream this chunk belongs to (or registers)
    pub fn format(&self) -> FormatTag {
        classify(self.first().format_code())
    }

    pub fn is_registration(&self) -> bool {
        self.first().is_registration()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Payload bytes carried by the chunk
    pub fn payload_len(&self) -> usize {
        self.sections
            .iter()
            .filter_map(Section::payload)
            .map(<[u8]>::len)
            .sum()
    }
}

/// Split a section sequence into chunks. Empty in, empty out.
pub fn group(sections: &[Section]) -> Vec<Chunk<'_>> {
    sections
        .chunk_by(|a, b| a.type_code() == b.type_code())
        .map(|sections| Chunk { sections })
        .collect()
}
