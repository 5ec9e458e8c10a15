//! Audio stitching between two containers
//!
//! The target container supplies the structure (registrations, video,
//! subtitles, end marker); the source container supplies the audio. Audio
//! chunks are matched by occurrence order: the n-th audio chunk of the target
//! is replaced by the n-th audio chunk of the source. Stream ids and offsets
//! are not used for alignment since the two dubs were authored separately.

use std::path::Path;

use undub_common::{Strictness, UndubConfig, DEFAULT_EXTENSION};

use crate::chunk::{group, Chunk};
use crate::error::{Result, StitchError};
use crate::file::read_container;
use crate::registry::{classify, FormatTag, UnknownFormat};
use crate::section::{decode, serialize, Container, Section};

/// Knobs for a stitch run
#[derive(Debug, Clone)]
pub struct StitchOptions {
    /// Formats whose chunks are taken from the source
    pub audio_formats: Vec<FormatTag>,
    pub strictness: Strictness,
    /// Required input extension, without the dot
    pub extension: String,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            audio_formats: vec![FormatTag::Vag, FormatTag::Xwma],
            strictness: Strictness::Lenient,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl StitchOptions {
    pub fn from_config(config: &UndubConfig) -> std::result::Result<Self, UnknownFormat> {
        let audio_formats = config
            .audio_formats
            .iter()
            .map(|name| name.parse())
            .collect::<std::result::Result<Vec<FormatTag>, _>>()?;
        Ok(Self {
            audio_formats,
            strictness: config.strictness(),
            extension: config.extension.clone(),
        })
    }

    pub fn is_audio(&self, format: FormatTag) -> bool {
        self.audio_formats.contains(&format)
    }

    /// An audio data chunk, i.e. a slot the source fills
    fn is_audio_slot(&self, chunk: &Chunk<'_>) -> bool {
        !chunk.is_registration() && self.is_audio(chunk.format())
    }
}

/// What a stitch did, for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StitchStats {
    /// The source held a single audio stream and was copied whole
    pub audio_only_source: bool,
    pub source_audio_chunks: usize,
    pub target_audio_chunks: usize,
    /// Target audio chunks replaced by source audio
    pub replaced: usize,
    /// Target audio chunks dropped because the source ran out
    pub dropped: usize,
    /// Surplus source audio chunks appended at the end
    pub appended: usize,
}

/// Output section order, computed in full before any bytes are written
#[derive(Debug, Clone)]
pub struct StitchPlan<'a> {
    sections: Vec<&'a Section>,
    stats: StitchStats,
}

impl<'a> StitchPlan<'a> {
    pub fn sections(&self) -> &[&'a Section] {
        &self.sections
    }

    pub fn stats(&self) -> StitchStats {
        self.stats
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(self.sections.iter().copied())
    }
}

/// Work out the output section order for two decoded containers
pub fn plan<'a>(
    source: &'a Container,
    target: &'a Container,
    options: &StitchOptions,
) -> Result<StitchPlan<'a>> {
    let source_chunks = group(source.sections());
    let target_chunks = group(target.sections());

    let source_audio: Vec<Chunk<'a>> = source_chunks
        .into_iter()
        .filter(|chunk| options.is_audio_slot(chunk))
        .collect();
    let target_audio_count = target_chunks
        .iter()
        .filter(|chunk| options.is_audio_slot(chunk))
        .count();

    let mut stats = StitchStats {
        source_audio_chunks: source_audio.len(),
        target_audio_chunks: target_audio_count,
        ..StitchStats::default()
    };

    // Audio-only source: nothing of the target is worth keeping
    if let [stream_id] = source.streams() {
        if options.is_audio(classify(*stream_id)) {
            stats.audio_only_source = true;
            return Ok(StitchPlan {
                sections: source.sections().iter().collect(),
                stats,
            });
        }
    }

    let mut sections = Vec::with_capacity(target.sections().len());
    let mut cursor = 0;

    for chunk in &target_chunks {
        if !options.is_audio_slot(chunk) {
            sections.extend(chunk.sections());
            continue;
        }

        let Some(replacement) = source_audio.get(cursor) else {
            // Source ran out of audio: the slot is dropped, not kept
            stats.dropped += 1;
            continue;
        };

        if replacement.format() != chunk.format() {
            return Err(StitchError::FormatMismatch {
                index: cursor,
                expected: chunk.format(),
                found: replacement.format(),
            });
        }

        sections.extend(replacement.sections());
        stats.replaced += 1;
        cursor += 1;
    }

    for leftover in &source_audio[cursor..] {
        sections.extend(leftover.sections());
        stats.appended += 1;
    }

    Ok(StitchPlan { sections, stats })
}

/// A finished stitch
#[derive(Debug, Clone)]
pub struct Stitched {
    pub bytes: Vec<u8>,
    pub stats: StitchStats,
}

/// Stitch source audio into the target structure, both given as raw bytes
pub fn stitch(source: &[u8], target: &[u8], options: &StitchOptions) -> Result<Vec<u8>> {
    stitch_bytes(source, target, options).map(|stitched| stitched.bytes)
}

/// Like [`stitch`], also reporting what was replaced
pub fn stitch_bytes(source: &[u8], target: &[u8], options: &StitchOptions) -> Result<Stitched> {
    let source = decode(source, options.strictness).map_err(StitchError::SourceDecode)?;
    let target = decode(target, options.strictness).map_err(StitchError::TargetDecode)?;

    let plan = plan(&source, &target, options)?;
    let stats = plan.stats();
    tracing::debug!(
        "audio chunks: source={} target={} replaced={} dropped={} appended={} audio_only={}",
        stats.source_audio_chunks,
        stats.target_audio_chunks,
        stats.replaced,
        stats.dropped,
        stats.appended,
        stats.audio_only_source,
    );
    if stats.dropped > 0 {
        tracing::warn!(
            "Source has {} fewer audio chunks than target; extra target audio dropped",
            stats.dropped
        );
    }

    Ok(Stitched {
        bytes: plan.to_bytes(),
        stats,
    })
}

/// Read two container files and stitch them
pub fn stitch_files(
    source_path: impl AsRef<Path>,
    target_path: impl AsRef<Path>,
    options: &StitchOptions,
) -> Result<Stitched> {
    let source = read_container(source_path.as_ref(), &options.extension)?;
    let target = read_container(target_path.as_ref(), &options.extension)?;
    stitch_bytes(&source, &target, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::section::HEADER_LEN;

    const VAG: u32 = 0x0010_0001;
    const XWMA: u32 = 0x0004_0001;
    const SUB_EN: u32 = 0x0001_0004;
    const M2V: u32 = 0x0000_0020;

    fn bytes(sections: &[Section]) -> Vec<u8> {
        serialize(sections)
    }

    fn decode_ok(data: &[u8]) -> Container {
        decode(data, Strictness::Strict).unwrap()
    }

    fn audio_payloads(data: &[u8], options: &StitchOptions) -> Vec<Vec<u8>> {
        let container = decode_ok(data);
        group(container.sections())
            .iter()
            .filter(|chunk| options.is_audio_slot(chunk))
            .map(|chunk| {
                chunk
                    .sections()
                    .iter()
                    .flat_map(|s| s.payload().unwrap_or_default().to_vec())
                    .collect()
            })
            .collect()
    }

    /// Target with video interleaved between three vag chunks
    fn interleaved_target() -> Vec<u8> {
        bytes(&[
            Section::register(M2V),
            Section::register(VAG),
            Section::register(SUB_EN),
            Section::data(M2V, vec![0xE0; 32]),
            Section::data(VAG, vec![0xAA; 10]),
            Section::data(SUB_EN, vec![0x5E; 6]),
            Section::data(M2V, vec![0xE1; 32]),
            Section::data(VAG, vec![0xAB; 10]),
            Section::data(VAG, vec![0xAC; 10]),
            Section::data(M2V, vec![0xE2; 32]),
            Section::data(VAG, vec![0xAD; 10]),
            Section::end(),
        ])
    }

    fn interleaved_source(audio: &[u8]) -> Vec<u8> {
        let mut sections = vec![Section::register(VAG), Section::register(M2V)];
        for &fill in audio {
            sections.push(Section::data(M2V, vec![0x11; 4]));
            sections.push(Section::data(VAG, vec![fill; 12]));
        }
        sections.push(Section::end());
        bytes(&sections)
    }

    #[test]
    fn test_example_single_audio_source() {
        let source = bytes(&[
            Section::register(VAG),
            Section::data(VAG, vec![0x01; 200]),
            Section::end(),
        ]);
        let target_sections = vec![
            Section::register(VAG),
            Section::register(SUB_EN),
            Section::data(VAG, vec![0x02; 150]),
            Section::data(VAG, vec![0x03; 150]),
            Section::data(SUB_EN, vec![0x04; 50]),
            Section::end(),
        ];
        let target = bytes(&target_sections);

        // Audio-only source is copied whole
        let options = StitchOptions::default();
        let out = stitch_bytes(&source, &target, &options).unwrap();
        assert!(out.stats.audio_only_source);
        assert_eq!(out.bytes, source);

        // The same source carrying a second, non-audio stream goes through
        // the general merge
        let source = bytes(&[
            Section::register(VAG),
            Section::register(M2V),
            Section::data(VAG, vec![0x01; 200]),
            Section::end(),
        ]);
        let out = stitch_bytes(&source, &target, &options).unwrap();
        assert!(!out.stats.audio_only_source);
        assert_eq!(out.stats.replaced, 1);
        assert_eq!(
            out.bytes.len(),
            target.len() - (2 * HEADER_LEN + 300) + (HEADER_LEN + 200)
        );
        let expected = bytes(&[
            Section::register(VAG),
            Section::register(SUB_EN),
            Section::data(VAG, vec![0x01; 200]),
            Section::data(SUB_EN, vec![0x04; 50]),
            Section::end(),
        ]);
        assert_eq!(out.bytes, expected);
    }

    #[test]
    fn test_non_audio_structure_preserved() {
        let target = interleaved_target();
        let source = interleaved_source(&[1, 2, 3]);
        let options = StitchOptions::default();
        let out = stitch(&source, &target, &options).unwrap();

        let target_container = decode_ok(&target);
        let kept_in: Vec<Vec<u8>> = target_container
            .sections()
            .iter()
            .filter(|s| s.type_code() != VAG)
            .map(Section::to_bytes)
            .collect();
        let out_container = decode_ok(&out);
        let kept_out: Vec<Vec<u8>> = out_container
            .sections()
            .iter()
            .filter(|s| s.type_code() != VAG)
            .map(Section::to_bytes)
            .collect();
        assert_eq!(kept_in, kept_out);
    }

    #[test]
    fn test_audio_follows_occurrence_order() {
        let target = interleaved_target();
        let source = interleaved_source(&[1, 2, 3]);
        let options = StitchOptions::default();
        let out = stitch_bytes(&source, &target, &options).unwrap();
        assert_eq!(out.stats.replaced, 3);
        assert_eq!(out.stats.dropped, 0);
        assert_eq!(out.stats.appended, 0);

        assert_eq!(
            audio_payloads(&out.bytes, &options),
            vec![vec![1; 12], vec![2; 12], vec![3; 12]]
        );
    }

    #[test]
    fn test_source_overflow_appended() {
        let target = interleaved_target();
        let source = interleaved_source(&[1, 2, 3, 4, 5]);
        let options = StitchOptions::default();
        let out = stitch_bytes(&source, &target, &options).unwrap();
        assert_eq!(out.stats.replaced, 3);
        assert_eq!(out.stats.appended, 2);

        // Surplus lands after the target's end marker, in source order
        let tail = bytes(&[Section::data(VAG, vec![4; 12]), Section::data(VAG, vec![5; 12])]);
        assert!(out.bytes.ends_with(&tail));
        let end = Section::end().to_bytes();
        assert_eq!(
            &out.bytes[out.bytes.len() - tail.len() - end.len()..out.bytes.len() - tail.len()],
            &end[..]
        );

        // A decoder stops at the marker and sees the target layout
        let container = decode_ok(&out.bytes);
        assert_eq!(container.trailing_bytes(), tail.len());
    }

    #[test]
    fn test_source_underflow_drops_target_audio() {
        let target = interleaved_target();
        let source = interleaved_source(&[1]);
        let options = StitchOptions::default();
        let out = stitch_bytes(&source, &target, &options).unwrap();
        assert_eq!(out.stats.replaced, 1);
        assert_eq!(out.stats.dropped, 2);

        assert_eq!(audio_payloads(&out.bytes, &options), vec![vec![1; 12]]);
        // No target audio survives
        let container = decode_ok(&out.bytes);
        assert!(container
            .sections()
            .iter()
            .filter_map(Section::payload)
            .all(|p| !p.starts_with(&[0xAA]) && !p.starts_with(&[0xAB]) && !p.starts_with(&[0xAD])));
    }

    #[test]
    fn test_format_mismatch() {
        let target = bytes(&[
            Section::register(VAG),
            Section::register(M2V),
            Section::data(VAG, vec![0; 4]),
            Section::data(M2V, vec![0; 4]),
            Section::data(VAG, vec![0; 4]),
            Section::end(),
        ]);
        let source = bytes(&[
            Section::register(VAG),
            Section::register(XWMA),
            Section::data(VAG, vec![1; 4]),
            Section::data(XWMA, vec![2; 4]),
            Section::end(),
        ]);
        let err = stitch(&source, &target, &StitchOptions::default()).unwrap_err();
        match err {
            StitchError::FormatMismatch {
                index,
                expected,
                found,
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected, FormatTag::Vag);
                assert_eq!(found, FormatTag::Xwma);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_audio_passes_through() {
        // msf is audio but not in the default set, so the target keeps its own
        const MSF: u32 = 0x0003_0001;
        let target = bytes(&[
            Section::register(MSF),
            Section::register(M2V),
            Section::data(MSF, vec![9; 4]),
            Section::data(M2V, vec![0; 4]),
            Section::end(),
        ]);
        let source = bytes(&[
            Section::register(MSF),
            Section::register(M2V),
            Section::data(MSF, vec![1; 4]),
            Section::end(),
        ]);
        let out = stitch(&source, &target, &StitchOptions::default()).unwrap();
        assert_eq!(out, target);

        let options = StitchOptions {
            audio_formats: vec![FormatTag::Msf],
            ..StitchOptions::default()
        };
        let out = stitch(&source, &target, &options).unwrap();
        assert_eq!(audio_payloads(&out, &options), vec![vec![1; 4]]);
    }

    #[test]
    fn test_lone_unsupported_stream_is_merged() {
        // One registered stream, but not one we substitute: no whole-file copy
        const MSF: u32 = 0x0003_0001;
        let source = bytes(&[
            Section::register(MSF),
            Section::data(MSF, vec![1; 4]),
            Section::end(),
        ]);

        let out = stitch_bytes(&source, &interleaved_target(), &StitchOptions::default()).unwrap();
        assert!(!out.stats.audio_only_source);
        assert_eq!(out.stats.source_audio_chunks, 0);
        assert_eq!(out.stats.target_audio_chunks, 3);
        assert_eq!(out.stats.dropped, 3);
        assert_eq!(
            out.bytes,
            bytes(&[
                Section::register(M2V),
                Section::register(VAG),
                Section::register(SUB_EN),
                Section::data(M2V, vec![0xE0; 32]),
                Section::data(SUB_EN, vec![0x5E; 6]),
                Section::data(M2V, vec![0xE1; 32]),
                Section::data(M2V, vec![0xE2; 32]),
                Section::end(),
            ])
        );

        // Target msf slots are not audio slots either, so they stay
        let target = bytes(&[
            Section::register(MSF),
            Section::register(M2V),
            Section::data(MSF, vec![9; 4]),
            Section::data(M2V, vec![0; 4]),
            Section::end(),
        ]);
        let out = stitch_bytes(&source, &target, &StitchOptions::default()).unwrap();
        assert!(!out.stats.audio_only_source);
        assert_eq!(out.bytes, target);
    }

    #[test]
    fn test_decode_errors_name_the_side() {
        let good = interleaved_target();
        let bad = bytes(&[Section::data(0x55, vec![0; 4])]);
        let options = StitchOptions::default();

        let err = stitch(&bad, &good, &options).unwrap_err();
        assert!(matches!(
            err,
            StitchError::SourceDecode(DecodeError::UnregisteredStream { offset: 0, type_code: 0x55 })
        ));
        let err = stitch(&good, &bad, &options).unwrap_err();
        assert!(matches!(err, StitchError::TargetDecode(_)));
    }

    #[test]
    fn test_strict_rejects_unterminated() {
        let source = bytes(&[Section::register(VAG), Section::data(VAG, vec![1; 4])]);
        let target = interleaved_target();
        let strict = StitchOptions {
            strictness: Strictness::Strict,
            ..StitchOptions::default()
        };
        assert!(matches!(
            stitch(&source, &target, &strict),
            Err(StitchError::SourceDecode(DecodeError::MissingTerminator { .. }))
        ));
        assert!(stitch(&source, &target, &StitchOptions::default()).is_ok());
    }

    #[test]
    fn test_options_from_config() {
        let config = UndubConfig {
            audio_formats: vec!["vag".into(), ".MSF".into()],
            strict: true,
            ..UndubConfig::default()
        };
        let options = StitchOptions::from_config(&config).unwrap();
        assert_eq!(options.audio_formats, vec![FormatTag::Vag, FormatTag::Msf]);
        assert!(options.strictness.is_strict());

        let config = UndubConfig {
            audio_formats: vec!["ogg".into()],
            ..UndubConfig::default()
        };
        assert!(StitchOptions::from_config(&config).is_err());
    }
}
