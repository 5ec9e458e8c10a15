//! Section decoder and serializer for the `.sdt` stream container
//!
//! A container is a flat run of sections. Every section starts with a
//! 16-byte little-endian header:
//!
//! ```text
//! 0x00  u32  type code
//! 0x04  u32  section length, header included
//! 0x08  u32  reserved
//! 0x0C  u32  stream id (registration sections only)
//! ```
//!
//! Type code `0x10` registers a stream; from then on the stream id is a valid
//! type code for data sections, whose payload follows the header. Type code
//! `0xF0` ends the container.

use std::collections::HashSet;

use byteorder::{ByteOrder, LittleEndian};
use undub_common::Strictness;

use crate::error::DecodeError;

pub const HEADER_LEN: usize = 16;

/// Type code of the end-of-stream marker
pub const END_MARKER: u32 = 0xF0;

/// Type code of a stream registration
pub const REGISTER_MARKER: u32 = 0x10;

// ============================================================================
// Data types
// ============================================================================

/// Raw section header, kept verbatim so reserved bytes survive a rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header([u8; HEADER_LEN]);

impl Header {
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a header with the reserved word zeroed
    pub fn new(type_code: u32, declared_length: u32, stream_id: u32) -> Self {
        let mut bytes = [0u8; HEADER_LEN];
        LittleEndian::write_u32(&mut bytes[0x00..0x04], type_code);
        LittleEndian::write_u32(&mut bytes[0x04..0x08], declared_length);
        LittleEndian::write_u32(&mut bytes[0x0C..0x10], stream_id);
        Self(bytes)
    }

    pub fn type_code(&self) -> u32 {
        LittleEndian::read_u32(&self.0[0x00..0x04])
    }

    pub fn declared_length(&self) -> u32 {
        LittleEndian::read_u32(&self.0[0x04..0x08])
    }

    pub fn reserved(&self) -> u32 {
        LittleEndian::read_u32(&self.0[0x08..0x0C])
    }

    pub fn stream_id(&self) -> u32 {
        LittleEndian::read_u32(&self.0[0x0C..0x10])
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }
}

/// What follows a section header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    End,
    Register { stream_id: u32 },
    Data(Vec<u8>),
}

/// One decoded section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Byte offset of the header in the file it was decoded from
    offset: usize,
    header: Header,
    body: Body,
}

impl Section {
    pub fn end() -> Self {
        Self {
            offset: 0,
            header: Header::new(END_MARKER, HEADER_LEN as u32, 0),
            body: Body::End,
        }
    }

    pub fn register(stream_id: u32) -> Self {
        Self {
            offset: 0,
            header: Header::new(REGISTER_MARKER, HEADER_LEN as u32, stream_id),
            body: Body::Register { stream_id },
        }
    }

    /// A data section for `stream_id`, with the length field set from the payload
    pub fn data(stream_id: u32, payload: Vec<u8>) -> Self {
        let declared = (HEADER_LEN + payload.len()) as u32;
        Self {
            offset: 0,
            header: Header::new(stream_id, declared, 0),
            body: Body::Data(payload),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn type_code(&self) -> u32 {
        self.header.type_code()
    }

    pub fn declared_length(&self) -> u32 {
        self.header.declared_length()
    }

    pub fn is_end(&self) -> bool {
        matches!(self.body, Body::End)
    }

    pub fn is_registration(&self) -> bool {
        matches!(self.body, Body::Register { .. })
    }

    /// The stream id this section speaks for: the registered id for a
    /// registration, the type code otherwise
    pub fn format_code(&self) -> u32 {
        match self.body {
            Body::Register { stream_id } => stream_id,
            _ => self.type_code(),
        }
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Data(payload) => Some(payload),
            _ => None,
        }
    }

    /// Bytes this section occupies when written out
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload().map_or(0, <[u8]>::len)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.header.as_bytes());
        if let Some(payload) = self.payload() {
            out.extend_from_slice(payload);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        out
    }
}

/// A fully decoded container
#[derive(Debug, Clone)]
pub struct Container {
    sections: Vec<Section>,
    /// Registered stream ids, in registration order
    streams: Vec<u32>,
    terminated: bool,
    /// Bytes left unread after the end marker
    trailing: usize,
}

impl Container {
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    pub fn streams(&self) -> &[u32] {
        &self.streams
    }

    /// Whether decoding stopped on an end marker
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }

    /// Re-encode the container
    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(&self.sections)
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Forward-only cursor over a container buffer
struct SdtReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SdtReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_header(&mut self) -> Result<Header, DecodeError> {
        let offset = self.pos;
        let bytes: [u8; HEADER_LEN] = self
            .data
            .get(offset..offset + HEADER_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(DecodeError::TruncatedHeader {
                offset,
                remaining: self.remaining(),
            })?;
        self.pos += HEADER_LEN;
        Ok(Header::from_bytes(bytes))
    }

    fn read_bytes(&mut self, len: usize) -> Option<Vec<u8>> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(len)?)?.to_vec();
        self.pos += len;
        Some(bytes)
    }
}

/// Decode a whole container.
///
/// Stops at the first end marker. Reaching the end of the buffer without one
/// is tolerated in lenient mode and fails in strict mode.
pub fn decode(data: &[u8], strictness: Strictness) -> Result<Container, DecodeError> {
    let mut reader = SdtReader::new(data);
    let mut sections = Vec::new();
    let mut streams = Vec::new();
    let mut registered = HashSet::new();
    let mut terminated = false;

    while !reader.at_end() {
        let offset = reader.pos();
        let header = reader.read_header()?;
        let type_code = header.type_code();

        let body = if type_code == END_MARKER {
            terminated = true;
            Body::End
        } else if type_code == REGISTER_MARKER {
            let stream_id = header.stream_id();
            if !registered.insert(stream_id) {
                return Err(DecodeError::DuplicateStream { offset, stream_id });
            }
            streams.push(stream_id);
            tracing::debug!(
                "0x{:08X}: register stream {:08X} ({})",
                offset,
                stream_id,
                crate::registry::classify(stream_id)
            );
            Body::Register { stream_id }
        } else if registered.contains(&type_code) {
            let declared = header.declared_length();
            let payload_len = (declared as usize)
                .checked_sub(HEADER_LEN)
                .ok_or(DecodeError::InvalidLength { offset, declared })?;
            let available = reader.remaining();
            let payload = reader
                .read_bytes(payload_len)
                .ok_or(DecodeError::TruncatedPayload {
                    offset,
                    expected: payload_len,
                    available,
                })?;
            tracing::trace!("0x{:08X}: {:08X} data, {} bytes", offset, type_code, payload_len);
            Body::Data(payload)
        } else {
            return Err(DecodeError::UnregisteredStream { offset, type_code });
        };

        sections.push(Section {
            offset,
            header,
            body,
        });

        if terminated {
            break;
        }
    }

    let trailing = reader.remaining();
    if trailing > 0 {
        tracing::warn!("{} bytes after end-of-stream marker ignored", trailing);
    }

    if !terminated {
        if strictness.is_strict() {
            return Err(DecodeError::MissingTerminator { length: data.len() });
        }
        tracing::warn!(
            "No end-of-stream marker before end of file ({} bytes)",
            data.len()
        );
    }

    Ok(Container {
        sections,
        streams,
        terminated,
        trailing,
    })
}

// ============================================================================
// Serializer
// ============================================================================

/// Concatenate sections back into container bytes. Length fields are written
/// as decoded, never recomputed.
pub fn serialize<'a, I>(sections: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Section>,
{
    let mut out = Vec::new();
    for section in sections {
        section.write_to(&mut out);
    }
    out
}
