//! # Metadata Extraction
//!
//! Captures stream properties from the STREAMINFO block reported by the
//! decoder. Every other block type is counted and dropped.

use crate::error::{CodecError, Result};
use crate::status::MetadataKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Contents of a STREAMINFO block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub min_block_size: u32,
    pub max_block_size: u32,
    pub min_frame_size: u32,
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    /// Total samples per channel; 0 when the encoder did not know it.
    pub total_samples: u64,
    pub md5: [u8; 16],
}

impl StreamInfo {
    /// Whether the encoder stored an MD5 signature of the audio.
    pub fn has_md5(&self) -> bool {
        self.md5.iter().any(|&byte| byte != 0)
    }
}

/// Metadata block as seen by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEvent {
    StreamInfo(StreamInfo),
    Other(MetadataKind),
}

impl MetadataEvent {
    pub fn kind(&self) -> MetadataKind {
        match self {
            MetadataEvent::StreamInfo(_) => MetadataKind::StreamInfo,
            MetadataEvent::Other(kind) => *kind,
        }
    }
}

/// Audio format of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProperties {
    pub channels: u16,
    pub bits_per_sample: u32,
    pub sample_rate: u32,
    /// Samples per channel, if known.
    pub total_samples: Option<u64>,
}

impl StreamProperties {
    /// Playback duration, when the total sample count is known.
    pub fn duration(&self) -> Option<Duration> {
        let total = self.total_samples?;
        if self.sample_rate == 0 {
            return None;
        }
        let rate = u64::from(self.sample_rate);
        let secs = total / rate;
        let nanos = (total % rate) * 1_000_000_000 / rate;
        Some(Duration::new(secs, nanos as u32))
    }
}

impl From<&StreamInfo> for StreamProperties {
    fn from(info: &StreamInfo) -> Self {
        Self {
            channels: info.channels as u16,
            bits_per_sample: info.bits_per_sample,
            sample_rate: info.sample_rate,
            total_samples: (info.total_samples > 0).then_some(info.total_samples),
        }
    }
}

/// Collects stream properties from decoder metadata events.
#[derive(Debug, Default)]
pub struct MetadataExtractor {
    stream_info: Option<StreamInfo>,
    properties: Option<StreamProperties>,
    other_blocks: usize,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one metadata block.
    ///
    /// The first STREAMINFO fixes the stream properties; any later one is
    /// ignored.
    pub fn observe(&mut self, event: MetadataEvent) {
        match event {
            MetadataEvent::StreamInfo(info) => {
                if self.properties.is_some() {
                    warn!("Ignoring repeated STREAMINFO block");
                    return;
                }
                let properties = StreamProperties::from(&info);
                debug!(
                    channels = properties.channels,
                    bits_per_sample = properties.bits_per_sample,
                    sample_rate = properties.sample_rate,
                    total_samples = ?properties.total_samples,
                    "Stream properties captured"
                );
                self.properties = Some(properties);
                self.stream_info = Some(info);
            }
            MetadataEvent::Other(kind) => {
                debug!(kind = %kind, "Skipping metadata block");
                self.other_blocks += 1;
            }
        }
    }

    /// Stream properties, once STREAMINFO has been seen.
    pub fn properties(&self) -> Result<StreamProperties> {
        self.properties.ok_or(CodecError::UninitializedProperties)
    }

    pub fn has_properties(&self) -> bool {
        self.properties.is_some()
    }

    /// Raw STREAMINFO contents, including block and frame size bounds.
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    /// Number of non-STREAMINFO blocks seen.
    pub fn other_blocks(&self) -> usize {
        self.other_blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_info(channels: u32, sample_rate: u32, total_samples: u64) -> StreamInfo {
        StreamInfo {
            min_block_size: 4096,
            max_block_size: 4096,
            min_frame_size: 0,
            max_frame_size: 0,
            sample_rate,
            channels,
            bits_per_sample: 16,
            total_samples,
            md5: [0; 16],
        }
    }

    #[test]
    fn test_properties_before_streaminfo() {
        let extractor = MetadataExtractor::new();
        assert!(matches!(
            extractor.properties(),
            Err(CodecError::UninitializedProperties)
        ));
        assert!(extractor.stream_info().is_none());
    }

    #[test]
    fn test_streaminfo_populates_once() {
        let mut extractor = MetadataExtractor::new();
        extractor.observe(MetadataEvent::StreamInfo(stream_info(2, 44100, 88200)));
        extractor.observe(MetadataEvent::StreamInfo(stream_info(1, 8000, 10)));

        let properties = extractor.properties().unwrap();
        assert_eq!(properties.channels, 2);
        assert_eq!(properties.sample_rate, 44100);
        assert_eq!(properties.total_samples, Some(88200));
        assert_eq!(properties.duration(), Some(Duration::from_secs(2)));
        assert_eq!(extractor.stream_info().unwrap().max_block_size, 4096);
    }

    #[test]
    fn test_other_blocks_are_counted() {
        let mut extractor = MetadataExtractor::new();
        extractor.observe(MetadataEvent::Other(MetadataKind::VorbisComment));
        extractor.observe(MetadataEvent::Other(MetadataKind::Unknown(99)));
        assert_eq!(extractor.other_blocks(), 2);
        assert!(!extractor.has_properties());
    }

    #[test]
    fn test_unknown_total_samples() {
        let properties = StreamProperties::from(&stream_info(1, 48000, 0));
        assert_eq!(properties.total_samples, None);
        assert_eq!(properties.duration(), None);
        assert!(!stream_info(1, 48000, 0).has_md5());
    }

    #[test]
    fn test_properties_serialize() {
        let properties = StreamProperties::from(&stream_info(2, 96000, 0));
        let json = serde_json::to_value(properties).unwrap();
        assert_eq!(json["sample_rate"], 96000);
        assert!(json["total_samples"].is_null());
    }
}
