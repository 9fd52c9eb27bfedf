//! # Codec Engine Seam
//!
//! Traits separating sessions from the codec that drives them.
//!
//! An engine owns the codec handle. Each engine call receives the session's
//! callback handler and may invoke it any number of times, synchronously, on
//! the calling thread, before returning. The handler is only borrowed for
//! that call.
//!
//! [`LibFlacDecoder`] and [`LibFlacEncoder`] are the production engines; tests
//! drive sessions with scripted fakes.

mod libflac;

pub use libflac::{LibFlacDecoder, LibFlacEncoder};

use crate::convert::PlanarView;
use crate::metadata::MetadataEvent;
use crate::status::{
    DecoderInitStatus, DecoderState, EncoderInitStatus, EncoderSeekStatus, EncoderState,
    EncoderTellStatus, EncoderWriteStatus, ErrorKind, LengthStatus, ReadStatus, SeekStatus,
    TellStatus, WriteStatus,
};

/// Header of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Samples per channel.
    pub block_size: u32,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
}

/// Callbacks a decoder engine issues while processing.
pub trait DecoderCallbacks {
    /// Fill `buf` with stream bytes, returning the status and byte count.
    fn read(&mut self, buf: &mut [u8]) -> (ReadStatus, usize);

    /// Reposition the stream to an absolute byte offset.
    fn seek(&mut self, offset: u64) -> SeekStatus;

    /// Current absolute byte offset.
    fn tell(&mut self) -> (TellStatus, u64);

    /// Total stream length in bytes.
    fn length(&mut self) -> (LengthStatus, u64);

    fn eof(&mut self) -> bool;

    /// Deliver one decoded frame.
    fn write(&mut self, header: &FrameHeader, planes: PlanarView<'_>) -> WriteStatus;

    fn metadata(&mut self, event: MetadataEvent);

    /// Report a bitstream fault. Decoding continues after the report.
    fn error(&mut self, kind: ErrorKind);
}

/// Callbacks an encoder engine issues while encoding.
pub trait EncoderCallbacks {
    /// Write encoded bytes. `samples` is non-zero when the bytes complete a
    /// frame; `current_frame` is that frame's number.
    fn write(&mut self, bytes: &[u8], samples: u32, current_frame: u32) -> EncoderWriteStatus;

    /// Reposition the sink, used to patch STREAMINFO on finish.
    fn seek(&mut self, offset: u64) -> EncoderSeekStatus;

    fn tell(&mut self) -> (EncoderTellStatus, u64);
}

/// Streaming decoder driven through [`DecoderCallbacks`].
///
/// Boolean results follow the codec: `false` means the operation stopped
/// early and [`DecoderEngine::state`] says why.
pub trait DecoderEngine {
    /// Register the callbacks and prepare to decode.
    fn init(&mut self, callbacks: &mut dyn DecoderCallbacks) -> Result<(), DecoderInitStatus>;

    /// Process metadata blocks up to the first audio frame.
    fn process_until_end_of_metadata(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool;

    /// Process one metadata block or one audio frame.
    fn process_single(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool;

    /// Seek so that the next delivered frame starts at `sample`.
    fn seek_absolute(&mut self, callbacks: &mut dyn DecoderCallbacks, sample: u64) -> bool;

    /// Drop buffered input and resynchronize.
    fn flush(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool;

    fn state(&self) -> DecoderState;

    /// Finish decoding and release codec resources. Returns `false` when the
    /// MD5 check failed.
    fn finish(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool;
}

/// Streaming encoder driven through [`EncoderCallbacks`].
pub trait EncoderEngine {
    /// Register the callbacks. The stream header may be written here.
    fn init(&mut self, callbacks: &mut dyn EncoderCallbacks) -> Result<(), EncoderInitStatus>;

    /// Encode one planar block.
    fn process(&mut self, callbacks: &mut dyn EncoderCallbacks, planes: &PlanarView<'_>) -> bool;

    /// Flush remaining samples, patch the header if possible and release
    /// codec resources.
    fn finish(&mut self, callbacks: &mut dyn EncoderCallbacks) -> bool;

    fn state(&self) -> EncoderState;
}
