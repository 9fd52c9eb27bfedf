//! # I/O Callback Router
//!
//! Answers codec callbacks by calling the session's [`ByteStream`] and
//! translating the outcome into the codec's status vocabulary.
//!
//! Faults cannot be returned through a callback, so the router keeps the
//! first one it sees (a failing stream, a corrupted-bitstream report, a frame
//! arriving before STREAMINFO) and the session takes it after the engine call
//! returns.

use crate::convert::{PlanarView, SampleBlock, SampleConverter};
use crate::engine::{DecoderCallbacks, EncoderCallbacks, FrameHeader};
use crate::error::CodecError;
use crate::metadata::{MetadataEvent, MetadataExtractor};
use crate::status::{
    EncoderSeekStatus, EncoderTellStatus, EncoderWriteStatus, ErrorKind, LengthStatus,
    ReadStatus, SeekStatus, TellStatus, WriteStatus,
};
use bridge_traits::{BridgeError, ByteStream};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// How a forwarded seek/tell/length call turned out.
enum Forwarded<T> {
    Done(T),
    Unsupported,
    Failed,
}

/// Keeps the first fault and remembers unsupported-capability fallbacks.
#[derive(Debug, Default)]
struct FaultSlot {
    error: Option<CodecError>,
    unsupported_seen: bool,
    fallback_logged: bool,
}

impl FaultSlot {
    fn record(&mut self, error: CodecError) {
        if self.error.is_none() {
            warn!(%error, "Recorded codec fault");
            self.error = Some(error);
        } else {
            debug!(%error, "Dropping fault, an earlier one is pending");
        }
    }

    fn forward<T>(&mut self, operation: &'static str, result: bridge_traits::Result<T>) -> Forwarded<T> {
        match result {
            Ok(value) => Forwarded::Done(value),
            Err(BridgeError::Unsupported(_)) => {
                self.unsupported_seen = true;
                if !self.fallback_logged {
                    debug!(operation, "Stream cannot {}, continuing without it", operation);
                    self.fallback_logged = true;
                }
                Forwarded::Unsupported
            }
            Err(error) => {
                self.record(CodecError::Io(error));
                Forwarded::Failed
            }
        }
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// Routes decoder callbacks to a byte stream.
pub struct DecoderRouter<S> {
    stream: S,
    extractor: MetadataExtractor,
    pending: VecDeque<SampleBlock>,
    faults: FaultSlot,
    seeking: bool,
    bytes_read: u64,
    samples_decoded: u64,
}

impl<S: ByteStream> DecoderRouter<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            extractor: MetadataExtractor::new(),
            pending: VecDeque::new(),
            faults: FaultSlot::default(),
            seeking: false,
            bytes_read: 0,
            samples_decoded: 0,
        }
    }

    /// Take the first fault recorded since the last call.
    pub fn take_error(&mut self) -> Option<CodecError> {
        self.faults.error.take()
    }

    pub fn has_error(&self) -> bool {
        self.faults.error.is_some()
    }

    /// Whether any seek/tell/length call was refused as unsupported since the
    /// last call. Clears the flag.
    pub fn take_unsupported(&mut self) -> bool {
        std::mem::take(&mut self.faults.unsupported_seen)
    }

    /// While seeking, bitstream reports come from probing the stream and
    /// are not faults of the stream itself.
    pub fn set_seeking(&mut self, seeking: bool) {
        self.seeking = seeking;
    }

    /// Next decoded block, oldest first.
    pub fn take_block(&mut self) -> Option<SampleBlock> {
        self.pending.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn extractor(&self) -> &MetadataExtractor {
        &self.extractor
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Samples per channel delivered by the codec so far.
    pub fn samples_decoded(&self) -> u64 {
        self.samples_decoded
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }
}

impl<S: ByteStream> DecoderCallbacks for DecoderRouter<S> {
    fn read(&mut self, buf: &mut [u8]) -> (ReadStatus, usize) {
        if buf.is_empty() {
            return (ReadStatus::Abort, 0);
        }
        match self.stream.read(buf) {
            Ok(0) if self.stream.eof() => (ReadStatus::EndOfStream, 0),
            Ok(count) => {
                let count = count.min(buf.len());
                self.bytes_read += count as u64;
                (ReadStatus::Continue, count)
            }
            Err(error) => {
                self.faults.record(CodecError::Io(error));
                (ReadStatus::Abort, 0)
            }
        }
    }

    fn seek(&mut self, offset: u64) -> SeekStatus {
        let result = self.stream.seek(offset);
        match self.faults.forward("seek", result) {
            Forwarded::Done(()) => SeekStatus::Ok,
            Forwarded::Unsupported => SeekStatus::Unsupported,
            Forwarded::Failed => SeekStatus::Error,
        }
    }

    fn tell(&mut self) -> (TellStatus, u64) {
        let result = self.stream.tell();
        match self.faults.forward("tell", result) {
            Forwarded::Done(offset) => (TellStatus::Ok, offset),
            Forwarded::Unsupported => (TellStatus::Unsupported, 0),
            Forwarded::Failed => (TellStatus::Error, 0),
        }
    }

    fn length(&mut self) -> (LengthStatus, u64) {
        let result = self.stream.length();
        match self.faults.forward("length", result) {
            Forwarded::Done(length) => (LengthStatus::Ok, length),
            Forwarded::Unsupported => (LengthStatus::Unsupported, 0),
            Forwarded::Failed => (LengthStatus::Error, 0),
        }
    }

    fn eof(&mut self) -> bool {
        self.stream.eof()
    }

    fn write(&mut self, header: &FrameHeader, planes: PlanarView<'_>) -> WriteStatus {
        if !self.extractor.has_properties() {
            self.faults.record(CodecError::UninitializedProperties);
            return WriteStatus::Abort;
        }
        match SampleConverter::interleave(&planes) {
            Ok(block) => {
                trace!(
                    block_size = header.block_size,
                    sample_rate = header.sample_rate,
                    "Queued decoded block"
                );
                self.samples_decoded += block.block_size() as u64;
                self.pending.push_back(block);
                WriteStatus::Continue
            }
            Err(error) => {
                self.faults.record(error);
                WriteStatus::Abort
            }
        }
    }

    fn metadata(&mut self, event: MetadataEvent) {
        self.extractor.observe(event);
    }

    fn error(&mut self, kind: ErrorKind) {
        if self.seeking {
            debug!(kind = %kind, "Ignoring bitstream report while seeking");
            return;
        }
        self.faults.record(CodecError::StreamIntegrity(kind));
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Routes encoder callbacks to a byte stream.
pub struct EncoderRouter<S> {
    stream: S,
    faults: FaultSlot,
    bytes_written: u64,
    frames_written: u64,
}

impl<S: ByteStream> EncoderRouter<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            faults: FaultSlot::default(),
            bytes_written: 0,
            frames_written: 0,
        }
    }

    /// Take the first fault recorded since the last call.
    pub fn take_error(&mut self) -> Option<CodecError> {
        self.faults.error.take()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Completed frames handed to the stream.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }
}

impl<S: ByteStream> EncoderCallbacks for EncoderRouter<S> {
    fn write(&mut self, bytes: &[u8], samples: u32, current_frame: u32) -> EncoderWriteStatus {
        match self.stream.write(bytes) {
            Ok(()) => {
                self.bytes_written += bytes.len() as u64;
                if samples > 0 {
                    self.frames_written += 1;
                    trace!(current_frame, samples, "Frame written");
                }
                EncoderWriteStatus::Ok
            }
            Err(error) => {
                self.faults.record(CodecError::Io(error));
                EncoderWriteStatus::FatalError
            }
        }
    }

    fn seek(&mut self, offset: u64) -> EncoderSeekStatus {
        let result = self.stream.seek(offset);
        match self.faults.forward("seek", result) {
            Forwarded::Done(()) => EncoderSeekStatus::Ok,
            Forwarded::Unsupported => EncoderSeekStatus::Unsupported,
            Forwarded::Failed => EncoderSeekStatus::Error,
        }
    }

    fn tell(&mut self) -> (EncoderTellStatus, u64) {
        let result = self.stream.tell();
        match self.faults.forward("tell", result) {
            Forwarded::Done(offset) => (EncoderTellStatus::Ok, offset),
            Forwarded::Unsupported => (EncoderTellStatus::Unsupported, 0),
            Forwarded::Failed => (EncoderTellStatus::Error, 0),
        }
    }
}
