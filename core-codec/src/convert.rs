//! # Sample Plane Converter
//!
//! Converts between the codec's planar layout (one slice per channel) and the
//! interleaved layout applications work with (`L R L R ...` for stereo).
//!
//! Samples are carried as `i32` end to end; nothing is narrowed, scaled or
//! dithered here.

use crate::error::{CodecError, Result};

/// Largest channel count a FLAC stream can carry.
pub const MAX_CHANNELS: usize = 8;

/// Borrowed planar block: `N` channel slices of identical length `M`.
///
/// Built once at the codec boundary from the codec's per-channel buffers, so
/// everything downstream works with checked slices instead of raw pointers.
#[derive(Debug, Clone)]
pub struct PlanarView<'a> {
    planes: Vec<&'a [i32]>,
    block_size: usize,
}

impl<'a> PlanarView<'a> {
    /// Validate and wrap channel planes.
    ///
    /// Fails unless there are `1..=MAX_CHANNELS` planes of equal length.
    pub fn new(planes: Vec<&'a [i32]>) -> Result<Self> {
        if planes.is_empty() || planes.len() > MAX_CHANNELS {
            return Err(CodecError::InvalidBlock(format!(
                "{} channel planes (expected 1..={})",
                planes.len(),
                MAX_CHANNELS
            )));
        }

        let block_size = planes[0].len();
        if let Some((channel, plane)) = planes
            .iter()
            .enumerate()
            .find(|(_, plane)| plane.len() != block_size)
        {
            return Err(CodecError::InvalidBlock(format!(
                "channel {} has {} samples, channel 0 has {}",
                channel,
                plane.len(),
                block_size
            )));
        }

        Ok(Self { planes, block_size })
    }

    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    /// Samples per channel.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn planes(&self) -> &[&'a [i32]] {
        &self.planes
    }

    pub fn is_empty(&self) -> bool {
        self.block_size == 0
    }
}

/// Owned interleaved sample buffer.
///
/// Invariant: `samples.len() == block_size * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBlock {
    samples: Vec<i32>,
    channels: usize,
}

impl SampleBlock {
    /// Wrap interleaved samples.
    ///
    /// Fails if `channels` is outside `1..=MAX_CHANNELS` or the sample count
    /// is not a whole number of frames.
    pub fn from_interleaved(samples: Vec<i32>, channels: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(CodecError::InvalidBlock(format!(
                "{} channels (expected 1..={})",
                channels, MAX_CHANNELS
            )));
        }
        if samples.len() % channels != 0 {
            return Err(CodecError::InvalidBlock(format!(
                "{} samples is not a multiple of {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self { samples, channels })
    }

    /// Block with no samples.
    pub fn empty(channels: usize) -> Result<Self> {
        Self::from_interleaved(Vec::new(), channels)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples per channel.
    pub fn block_size(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<i32> {
        self.samples
    }

    /// Iterate over frames (one sample per channel).
    pub fn frames(&self) -> std::slice::ChunksExact<'_, i32> {
        self.samples.chunks_exact(self.channels)
    }
}

/// Stateless planar/interleaved converter.
///
/// Method names follow the target layout: [`interleave`](Self::interleave)
/// turns the codec's planes into one flat buffer (the decode direction,
/// sometimes called "deinterleaving" the codec output), and
/// [`deinterleave`](Self::deinterleave) splits a flat buffer into planes for
/// the encoder.
pub struct SampleConverter;

impl SampleConverter {
    /// Planar to interleaved: `flat[i * N + j] = planes[j][i]`.
    ///
    /// # Example
    ///
    /// ```
    /// use core_codec::convert::{PlanarView, SampleConverter};
    ///
    /// let left = [1, 2, 3];
    /// let right = [10, 20, 30];
    /// let view = PlanarView::new(vec![&left[..], &right[..]]).unwrap();
    /// let block = SampleConverter::interleave(&view).unwrap();
    /// assert_eq!(block.samples(), &[1, 10, 2, 20, 3, 30]);
    /// ```
    pub fn interleave(view: &PlanarView<'_>) -> Result<SampleBlock> {
        let channels = view.channels();
        let total = view.block_size().checked_mul(channels).ok_or_else(|| {
            CodecError::InvalidBlock(format!(
                "{} x {} samples overflows",
                view.block_size(),
                channels
            ))
        })?;

        let mut samples = Vec::with_capacity(total);
        for index in 0..view.block_size() {
            samples.extend(view.planes().iter().map(|plane| plane[index]));
        }

        Ok(SampleBlock { samples, channels })
    }

    /// Interleaved to planar, one `Vec` per channel.
    pub fn deinterleave(block: &SampleBlock) -> Vec<Vec<i32>> {
        let mut planes = vec![Vec::with_capacity(block.block_size()); block.channels()];
        for frame in block.frames() {
            for (plane, &sample) in planes.iter_mut().zip(frame) {
                plane.push(sample);
            }
        }
        planes
    }
}
