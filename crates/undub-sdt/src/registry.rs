//! Type-code to payload-format table
//!
//! Stream ids registered in a container double as the type code of their data
//! sections. The id encodes what the stream carries; this table maps the ids
//! seen across the PS2/Xbox originals and the HD remasters to a format tag.
//! Subtitle tags are made up: the executables give no hint of a real format.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Payload format of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// ADPCM, wrapped as GENH
    Genh,
    Dmx,
    Nrm,
    Pacb,
    Bpx,
    /// Xbox MPEG-2 video
    Pac,
    /// PS2 MPEG-2 video
    Pss,
    Ipu,
    /// Present on every HD remaster regardless of platform
    M2v,
    Sdx1,
    Sdx2,
    /// PS3 audio
    Msf,
    /// Xbox 360 audio
    Xwma,
    /// PS Vita audio
    Tav9,
    /// VAG1/VAG2 audio
    Vag,
    Mtaf,
    SubEn,
    SubFr,
    SubDe,
    SubIt,
    SubEs,
    SubJp,
    /// Anything not in the table
    Bin,
}

/// Coarse grouping of format tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Audio,
    Video,
    Subtitle,
    Other,
}

impl FormatTag {
    pub const ALL: [FormatTag; 23] = [
        FormatTag::Genh,
        FormatTag::Dmx,
        FormatTag::Nrm,
        FormatTag::Pacb,
        FormatTag::Bpx,
        FormatTag::Pac,
        FormatTag::Pss,
        FormatTag::Ipu,
        FormatTag::M2v,
        FormatTag::Sdx1,
        FormatTag::Sdx2,
        FormatTag::Msf,
        FormatTag::Xwma,
        FormatTag::Tav9,
        FormatTag::Vag,
        FormatTag::Mtaf,
        FormatTag::SubEn,
        FormatTag::SubFr,
        FormatTag::SubDe,
        FormatTag::SubIt,
        FormatTag::SubEs,
        FormatTag::SubJp,
        FormatTag::Bin,
    ];

    /// Tag name as used in config files (no dot)
    pub fn name(&self) -> &'static str {
        match self {
            FormatTag::Genh => "genh",
            FormatTag::Dmx => "dmx",
            FormatTag::Nrm => "nrm",
            FormatTag::Pacb => "pacb",
            FormatTag::Bpx => "bpx",
            FormatTag::Pac => "pac",
            FormatTag::Pss => "pss",
            FormatTag::Ipu => "ipu",
            FormatTag::M2v => "m2v",
            FormatTag::Sdx1 => "sdx_1",
            FormatTag::Sdx2 => "sdx_2",
            FormatTag::Msf => "msf",
            FormatTag::Xwma => "xwma",
            FormatTag::Tav9 => "9tav",
            FormatTag::Vag => "vag",
            FormatTag::Mtaf => "mtaf",
            FormatTag::SubEn => "sub_en",
            FormatTag::SubFr => "sub_fr",
            FormatTag::SubDe => "sub_de",
            FormatTag::SubIt => "sub_it",
            FormatTag::SubEs => "sub_es",
            FormatTag::SubJp => "sub_jp",
            FormatTag::Bin => "bin",
        }
    }

    /// File extension for a demuxed stream of this format, e.g. `.vag`
    pub fn extension(&self) -> String {
        format!(".{}", self.name())
    }

    pub fn kind(&self) -> FormatKind {
        match self {
            FormatTag::Genh
            | FormatTag::Sdx1
            | FormatTag::Sdx2
            | FormatTag::Msf
            | FormatTag::Xwma
            | FormatTag::Tav9
            | FormatTag::Vag
            | FormatTag::Mtaf => FormatKind::Audio,
            FormatTag::Pac | FormatTag::Pss | FormatTag::Ipu | FormatTag::M2v => {
                FormatKind::Video
            }
            FormatTag::SubEn
            | FormatTag::SubFr
            | FormatTag::SubDe
            | FormatTag::SubIt
            | FormatTag::SubEs
            | FormatTag::SubJp => FormatKind::Subtitle,
            FormatTag::Dmx | FormatTag::Nrm | FormatTag::Pacb | FormatTag::Bpx | FormatTag::Bin => {
                FormatKind::Other
            }
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for FormatTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown format tag '{0}'")]
pub struct UnknownFormat(pub String);

impl FromStr for FormatTag {
    type Err = UnknownFormat;

    /// Accepts `vag`, `.vag`, `VAG`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        FormatTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name() == wanted)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

const TYPE_TABLE: &[(u32, FormatTag)] = &[
    (0x0000_0001, FormatTag::Genh),
    (0x0000_0002, FormatTag::Dmx),
    (0x0000_0003, FormatTag::Nrm),
    (0x0000_0004, FormatTag::Pacb),
    (0x0000_0005, FormatTag::Dmx),
    (0x0000_0006, FormatTag::Bpx),
    (0x0000_000C, FormatTag::Pac),
    (0x0000_000D, FormatTag::Pac),
    (0x0000_000E, FormatTag::Pss),
    (0x0000_000F, FormatTag::Ipu),
    (0x0000_0020, FormatTag::M2v),
    (0x0001_0001, FormatTag::Sdx1),
    (0x0001_0004, FormatTag::SubEn),
    (0x0002_0001, FormatTag::Sdx2),
    (0x0002_0004, FormatTag::SubFr),
    (0x0003_0001, FormatTag::Msf),
    (0x0003_0004, FormatTag::SubDe),
    (0x0004_0001, FormatTag::Xwma),
    (0x0004_0004, FormatTag::SubIt),
    (0x0005_0001, FormatTag::Tav9),
    (0x0005_0004, FormatTag::SubEs),
    (0x0006_0004, FormatTag::SubJp),
    (0x0007_0004, FormatTag::SubJp),
    (0x0010_0001, FormatTag::Vag),
    (0x0011_0001, FormatTag::Mtaf),
];

static TABLE: OnceLock<HashMap<u32, FormatTag>> = OnceLock::new();

fn table() -> &'static HashMap<u32, FormatTag> {
    TABLE.get_or_init(|| TYPE_TABLE.iter().copied().collect())
}

/// Classify a stream id / type code. Unknown codes are `Bin`.
pub fn classify(code: u32) -> FormatTag {
    table().get(&code).copied().unwrap_or(FormatTag::Bin)
}

/// Every code the table knows, in table order
pub fn known_codes() -> impl Iterator<Item = (u32, FormatTag)> {
    TYPE_TABLE.iter().copied()
}
