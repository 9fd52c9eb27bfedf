//! # Session Configuration
//!
//! Configuration types for decoder and encoder sessions.

use crate::convert::MAX_CHANNELS;
use serde::{Deserialize, Serialize};

/// Sample widths allowed in the streamable subset.
const SUBSET_BITS_PER_SAMPLE: [u32; 5] = [8, 12, 16, 20, 24];

/// Block sizes a subset frame header can encode without a trailing field.
const SUBSET_BLOCK_SIZES: [u32; 12] = [
    192, 256, 512, 576, 1024, 1152, 2048, 2304, 4096, 4608, 8192, 16384,
];

/// Decoder session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Verify the decoded audio against the MD5 signature in STREAMINFO.
    ///
    /// Checked when the session is closed after reaching end of stream.
    /// Seeking turns the check off for the rest of the session.
    ///
    /// Default: true.
    #[serde(default = "default_md5_checking")]
    pub md5_checking: bool,

    /// Report every metadata block type to the extractor instead of only
    /// STREAMINFO.
    ///
    /// Default: false.
    #[serde(default)]
    pub respond_all_metadata: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            md5_checking: default_md5_checking(),
            respond_all_metadata: false,
        }
    }
}

/// Encoder session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Number of interleaved channels per block.
    ///
    /// Default: 2.
    #[serde(default = "default_channels")]
    pub channels: u16,

    /// Sample width. Samples outside the signed range for this width are
    /// rejected.
    ///
    /// Default: 16.
    #[serde(default = "default_bits_per_sample")]
    pub bits_per_sample: u32,

    /// Default: 44100.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// libFLAC compression preset, 0 (fastest) to 8 (smallest).
    ///
    /// Default: 5.
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,

    /// Fixed block size in samples per channel. `None` lets the compression
    /// preset choose.
    #[serde(default)]
    pub block_size: Option<u32>,

    /// Decode every frame while encoding and compare it with the input.
    ///
    /// Default: false.
    #[serde(default)]
    pub verify: bool,

    /// Total samples per channel written into STREAMINFO up front, for sinks
    /// that cannot seek back and patch the header.
    #[serde(default)]
    pub total_samples_estimate: Option<u64>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            bits_per_sample: default_bits_per_sample(),
            sample_rate: default_sample_rate(),
            compression_level: default_compression_level(),
            block_size: None,
            verify: false,
            total_samples_estimate: None,
        }
    }
}

impl EncoderConfig {
    /// 16-bit stereo at 44.1 kHz.
    pub fn cd_quality() -> Self {
        Self::default()
    }

    /// 24-bit stereo at 96 kHz, maximum compression.
    pub fn hi_res() -> Self {
        Self {
            bits_per_sample: 24,
            sample_rate: 96000,
            compression_level: 8,
            ..Default::default()
        }
    }

    /// Format with the given channel layout, default compression.
    pub fn new(channels: u16, bits_per_sample: u32, sample_rate: u32) -> Self {
        Self {
            channels,
            bits_per_sample,
            sample_rate,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels == 0 || usize::from(self.channels) > MAX_CHANNELS {
            return Err(format!(
                "channels must be between 1 and {} (got {})",
                MAX_CHANNELS, self.channels
            ));
        }

        if !(4..=32).contains(&self.bits_per_sample) {
            return Err(format!(
                "bits_per_sample must be between 4 and 32 (got {})",
                self.bits_per_sample
            ));
        }

        if !(1..=655_350).contains(&self.sample_rate) {
            return Err(format!(
                "sample_rate must be between 1 and 655350 (got {})",
                self.sample_rate
            ));
        }

        if self.compression_level > 8 {
            return Err(format!(
                "compression_level must be between 0 and 8 (got {})",
                self.compression_level
            ));
        }

        if let Some(block_size) = self.block_size {
            if !(16..=65_535).contains(&block_size) {
                return Err(format!(
                    "block_size must be between 16 and 65535 (got {})",
                    block_size
                ));
            }
        }

        Ok(())
    }

    /// Inclusive sample range for the configured width.
    pub fn sample_range(&self) -> (i64, i64) {
        let bits = self.bits_per_sample.clamp(1, 32);
        let max = (1i64 << (bits - 1)) - 1;
        (-max - 1, max)
    }

    /// Whether the output can stay within the FLAC streamable subset.
    ///
    /// Mirrors the checks libFLAC applies at init when subset mode is on:
    /// a standard bit depth, a sample rate that frame headers can encode
    /// without STREAMINFO, and a standard block size (at most 4608 samples
    /// up to 48 kHz). Preset block sizes always qualify.
    pub fn is_streamable_subset(&self) -> bool {
        let rate_fits = (1..=655_350).contains(&self.sample_rate)
            && (self.sample_rate < 65_536 || self.sample_rate % 10 == 0);
        let block_fits = self.block_size.map_or(true, |size| {
            SUBSET_BLOCK_SIZES.contains(&size) && (self.sample_rate > 48_000 || size <= 4608)
        });

        SUBSET_BITS_PER_SAMPLE.contains(&self.bits_per_sample) && rate_fits && block_fits
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_md5_checking() -> bool {
    true
}

fn default_channels() -> u16 {
    2
}

fn default_bits_per_sample() -> u32 {
    16
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_compression_level() -> u32 {
    5
}
