//! libFLAC engines over `libflac-sys`.
//!
//! libFLAC calls back into C function pointers with an opaque `client_data`
//! pointer. Each engine owns a boxed [`HandlerSlot`] whose address is
//! registered as `client_data` once, at init. For the duration of every
//! engine call the slot points at the caller's handler; between calls it is
//! null and the trampolines answer with the codec's abort status.

use super::{DecoderCallbacks, DecoderEngine, EncoderCallbacks, EncoderEngine, FrameHeader};
use crate::config::{DecoderConfig, EncoderConfig};
use crate::convert::PlanarView;
use crate::error::{CodecError, Result};
use crate::metadata::{MetadataEvent, StreamInfo};
use crate::status::{
    DecoderInitStatus, DecoderState, EncoderInitStatus, EncoderSeekStatus, EncoderState,
    EncoderTellStatus, EncoderWriteStatus, ErrorKind, LengthStatus, MetadataKind, ReadStatus,
    SeekStatus, TellStatus, WriteStatus,
};
use libflac_sys as sys;
use std::cell::Cell;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::slice;
use tracing::{error, trace};

/// Stable `client_data` target holding the active handler, if any.
struct HandlerSlot(Cell<*mut c_void>);

impl HandlerSlot {
    fn new() -> Box<Self> {
        Box::new(Self(Cell::new(ptr::null_mut())))
    }

    fn client_data(&self) -> *mut c_void {
        self as *const Self as *mut c_void
    }
}

/// Run a handler, turning a panic into the given abort value.
fn guarded<R>(fallback: R, f: impl FnOnce() -> R) -> R {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|_| {
        error!("Panic inside codec callback, aborting the codec call");
        fallback
    })
}

fn to_bool(value: sys::FLAC__bool) -> bool {
    value != 0
}

fn from_bool(value: bool) -> sys::FLAC__bool {
    sys::FLAC__bool::from(value)
}

// ============================================================================
// Decoder
// ============================================================================

/// Stream decoder backed by libFLAC.
pub struct LibFlacDecoder {
    raw: NonNull<sys::FLAC__StreamDecoder>,
    slot: Box<HandlerSlot>,
}

// The slot is empty between calls and the handle is only used through
// `&mut self`, so the engine can move to another thread.
unsafe impl Send for LibFlacDecoder {}

impl LibFlacDecoder {
    /// Allocate and configure a decoder. Callbacks are registered by
    /// [`DecoderEngine::init`].
    pub fn new(config: &DecoderConfig) -> Result<Self> {
        let raw = NonNull::new(unsafe { sys::FLAC__stream_decoder_new() })
            .ok_or_else(|| CodecError::Init("libFLAC could not allocate a decoder".into()))?;
        let decoder = Self {
            raw,
            slot: HandlerSlot::new(),
        };

        let configured = unsafe {
            let mut ok = to_bool(sys::FLAC__stream_decoder_set_md5_checking(
                raw.as_ptr(),
                from_bool(config.md5_checking),
            ));
            if config.respond_all_metadata {
                ok &= to_bool(sys::FLAC__stream_decoder_set_metadata_respond_all(
                    raw.as_ptr(),
                ));
            }
            ok
        };
        if !configured {
            return Err(CodecError::Init(
                "libFLAC rejected the decoder settings".into(),
            ));
        }

        Ok(decoder)
    }

    fn call<R>(
        &mut self,
        callbacks: &mut dyn DecoderCallbacks,
        f: impl FnOnce(*mut sys::FLAC__StreamDecoder) -> R,
    ) -> R {
        let mut handler: &mut dyn DecoderCallbacks = callbacks;
        self.slot
            .0
            .set(&mut handler as *mut &mut dyn DecoderCallbacks as *mut c_void);
        let result = f(self.raw.as_ptr());
        self.slot.0.set(ptr::null_mut());
        result
    }
}

impl DecoderEngine for LibFlacDecoder {
    fn init(
        &mut self,
        callbacks: &mut dyn DecoderCallbacks,
    ) -> std::result::Result<(), DecoderInitStatus> {
        let client_data = self.slot.client_data();
        let status = self.call(callbacks, |raw| unsafe {
            sys::FLAC__stream_decoder_init_stream(
                raw,
                Some(decoder_read),
                Some(decoder_seek),
                Some(decoder_tell),
                Some(decoder_length),
                Some(decoder_eof),
                Some(decoder_write),
                Some(decoder_metadata),
                Some(decoder_error),
                client_data,
            )
        });
        match DecoderInitStatus::from_native(status as u32) {
            DecoderInitStatus::Ok => Ok(()),
            other => Err(other),
        }
    }

    fn process_until_end_of_metadata(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool {
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_decoder_process_until_end_of_metadata(raw))
        })
    }

    fn process_single(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool {
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_decoder_process_single(raw))
        })
    }

    fn seek_absolute(&mut self, callbacks: &mut dyn DecoderCallbacks, sample: u64) -> bool {
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_decoder_seek_absolute(raw, sample))
        })
    }

    fn flush(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool {
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_decoder_flush(raw))
        })
    }

    fn state(&self) -> DecoderState {
        let state = unsafe { sys::FLAC__stream_decoder_get_state(self.raw.as_ptr()) };
        DecoderState::from_native(state as u32)
    }

    fn finish(&mut self, callbacks: &mut dyn DecoderCallbacks) -> bool {
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_decoder_finish(raw))
        })
    }
}

impl Drop for LibFlacDecoder {
    fn drop(&mut self) {
        unsafe { sys::FLAC__stream_decoder_delete(self.raw.as_ptr()) }
    }
}

unsafe fn decoder_handler<'a>(client_data: *mut c_void) -> Option<&'a mut dyn DecoderCallbacks> {
    let slot = (client_data as *const HandlerSlot).as_ref()?;
    let handler = slot.0.get() as *mut &'a mut dyn DecoderCallbacks;
    handler.as_mut().map(|handler| &mut **handler)
}

unsafe extern "C" fn decoder_read(
    _decoder: *const sys::FLAC__StreamDecoder,
    buffer: *mut sys::FLAC__byte,
    bytes: *mut usize,
    client_data: *mut c_void,
) -> sys::FLAC__StreamDecoderReadStatus {
    if bytes.is_null() {
        return ReadStatus::Abort.as_native() as _;
    }
    let capacity = *bytes;
    *bytes = 0;
    let Some(handler) = decoder_handler(client_data) else {
        return ReadStatus::Abort.as_native() as _;
    };

    let buf: &mut [u8] = if buffer.is_null() || capacity == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(buffer, capacity)
    };
    let (status, count) = guarded((ReadStatus::Abort, 0), || handler.read(buf));
    *bytes = count.min(capacity);
    trace!(requested = capacity, read = count, status = %status, "Read callback");
    status.as_native() as _
}

unsafe extern "C" fn decoder_seek(
    _decoder: *const sys::FLAC__StreamDecoder,
    absolute_byte_offset: sys::FLAC__uint64,
    client_data: *mut c_void,
) -> sys::FLAC__StreamDecoderSeekStatus {
    let Some(handler) = decoder_handler(client_data) else {
        return SeekStatus::Error.as_native() as _;
    };
    let status = guarded(SeekStatus::Error, || handler.seek(absolute_byte_offset));
    trace!(offset = absolute_byte_offset, status = %status, "Seek callback");
    status.as_native() as _
}

unsafe extern "C" fn decoder_tell(
    _decoder: *const sys::FLAC__StreamDecoder,
    absolute_byte_offset: *mut sys::FLAC__uint64,
    client_data: *mut c_void,
) -> sys::FLAC__StreamDecoderTellStatus {
    let Some(handler) = decoder_handler(client_data) else {
        return TellStatus::Error.as_native() as _;
    };
    if absolute_byte_offset.is_null() {
        return TellStatus::Error.as_native() as _;
    }
    let (status, offset) = guarded((TellStatus::Error, 0), || handler.tell());
    *absolute_byte_offset = offset;
    status.as_native() as _
}

unsafe extern "C" fn decoder_length(
    _decoder: *const sys::FLAC__StreamDecoder,
    stream_length: *mut sys::FLAC__uint64,
    client_data: *mut c_void,
) -> sys::FLAC__StreamDecoderLengthStatus {
    let Some(handler) = decoder_handler(client_data) else {
        return LengthStatus::Error.as_native() as _;
    };
    if stream_length.is_null() {
        return LengthStatus::Error.as_native() as _;
    }
    let (status, length) = guarded((LengthStatus::Error, 0), || handler.length());
    *stream_length = length;
    status.as_native() as _
}

unsafe extern "C" fn decoder_eof(
    _decoder: *const sys::FLAC__StreamDecoder,
    client_data: *mut c_void,
) -> sys::FLAC__bool {
    let Some(handler) = decoder_handler(client_data) else {
        return from_bool(true);
    };
    from_bool(guarded(true, || handler.eof()))
}

unsafe extern "C" fn decoder_write(
    _decoder: *const sys::FLAC__StreamDecoder,
    frame: *const sys::FLAC__Frame,
    buffer: *const *const sys::FLAC__int32,
    client_data: *mut c_void,
) -> sys::FLAC__StreamDecoderWriteStatus {
    let (Some(handler), Some(frame)) = (decoder_handler(client_data), frame.as_ref()) else {
        return WriteStatus::Abort.as_native() as _;
    };
    if buffer.is_null() {
        return WriteStatus::Abort.as_native() as _;
    }

    let header = FrameHeader {
        block_size: frame.header.blocksize,
        sample_rate: frame.header.sample_rate,
        channels: frame.header.channels,
        bits_per_sample: frame.header.bits_per_sample,
    };
    let block_size = header.block_size as usize;
    let planes: Vec<&[i32]> = (0..header.channels as usize)
        .map(|channel| {
            let plane = unsafe { *buffer.add(channel) };
            if plane.is_null() || block_size == 0 {
                &[][..]
            } else {
                unsafe { slice::from_raw_parts(plane, block_size) }
            }
        })
        .collect();

    let status = guarded(WriteStatus::Abort, || match PlanarView::new(planes) {
        Ok(view) => handler.write(&header, view),
        Err(err) => {
            error!(%err, "Codec delivered a malformed frame");
            WriteStatus::Abort
        }
    });
    trace!(block_size, channels = header.channels, status = %status, "Write callback");
    status.as_native() as _
}

unsafe extern "C" fn decoder_metadata(
    _decoder: *const sys::FLAC__StreamDecoder,
    metadata: *const sys::FLAC__StreamMetadata,
    client_data: *mut c_void,
) {
    let (Some(handler), Some(metadata)) = (decoder_handler(client_data), metadata.as_ref()) else {
        return;
    };

    let kind = MetadataKind::from_native(metadata.type_ as u32);
    let event = if kind == MetadataKind::StreamInfo {
        let info = &metadata.data.stream_info;
        MetadataEvent::StreamInfo(StreamInfo {
            min_block_size: info.min_blocksize,
            max_block_size: info.max_blocksize,
            min_frame_size: info.min_framesize,
            max_frame_size: info.max_framesize,
            sample_rate: info.sample_rate,
            channels: info.channels,
            bits_per_sample: info.bits_per_sample,
            total_samples: info.total_samples,
            md5: info.md5sum,
        })
    } else {
        MetadataEvent::Other(kind)
    };
    guarded((), || handler.metadata(event));
}

unsafe extern "C" fn decoder_error(
    _decoder: *const sys::FLAC__StreamDecoder,
    status: sys::FLAC__StreamDecoderErrorStatus,
    client_data: *mut c_void,
) {
    let Some(handler) = decoder_handler(client_data) else {
        return;
    };
    let kind = ErrorKind::from_native(status as u32);
    guarded((), || handler.error(kind));
}

// ============================================================================
// Encoder
// ============================================================================

/// Stream encoder backed by libFLAC.
pub struct LibFlacEncoder {
    raw: NonNull<sys::FLAC__StreamEncoder>,
    slot: Box<HandlerSlot>,
}

// Same reasoning as `LibFlacDecoder`.
unsafe impl Send for LibFlacEncoder {}

impl LibFlacEncoder {
    /// Allocate an encoder and apply the stream format and tuning from
    /// `config`. Callbacks are registered by [`EncoderEngine::init`].
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        let raw = NonNull::new(unsafe { sys::FLAC__stream_encoder_new() })
            .ok_or_else(|| CodecError::Init("libFLAC could not allocate an encoder".into()))?;
        let encoder = Self {
            raw,
            slot: HandlerSlot::new(),
        };

        let encoder_ptr = raw.as_ptr();
        let configured = unsafe {
            let mut ok = to_bool(sys::FLAC__stream_encoder_set_channels(
                encoder_ptr,
                u32::from(config.channels),
            ));
            ok &= to_bool(sys::FLAC__stream_encoder_set_bits_per_sample(
                encoder_ptr,
                config.bits_per_sample,
            ));
            ok &= to_bool(sys::FLAC__stream_encoder_set_sample_rate(
                encoder_ptr,
                config.sample_rate,
            ));
            ok &= to_bool(sys::FLAC__stream_encoder_set_compression_level(
                encoder_ptr,
                config.compression_level,
            ));
            ok &= to_bool(sys::FLAC__stream_encoder_set_streamable_subset(
                encoder_ptr,
                from_bool(config.is_streamable_subset()),
            ));
            ok &= to_bool(sys::FLAC__stream_encoder_set_verify(
                encoder_ptr,
                from_bool(config.verify),
            ));
            if let Some(block_size) = config.block_size {
                ok &= to_bool(sys::FLAC__stream_encoder_set_blocksize(
                    encoder_ptr,
                    block_size,
                ));
            }
            if let Some(total) = config.total_samples_estimate {
                ok &= to_bool(sys::FLAC__stream_encoder_set_total_samples_estimate(
                    encoder_ptr,
                    total,
                ));
            }
            ok
        };
        if !configured {
            return Err(CodecError::Init(
                "libFLAC rejected the encoder settings".into(),
            ));
        }

        Ok(encoder)
    }

    fn call<R>(
        &mut self,
        callbacks: &mut dyn EncoderCallbacks,
        f: impl FnOnce(*mut sys::FLAC__StreamEncoder) -> R,
    ) -> R {
        let mut handler: &mut dyn EncoderCallbacks = callbacks;
        self.slot
            .0
            .set(&mut handler as *mut &mut dyn EncoderCallbacks as *mut c_void);
        let result = f(self.raw.as_ptr());
        self.slot.0.set(ptr::null_mut());
        result
    }
}

impl EncoderEngine for LibFlacEncoder {
    fn init(
        &mut self,
        callbacks: &mut dyn EncoderCallbacks,
    ) -> std::result::Result<(), EncoderInitStatus> {
        let client_data = self.slot.client_data();
        let status = self.call(callbacks, |raw| unsafe {
            sys::FLAC__stream_encoder_init_stream(
                raw,
                Some(encoder_write),
                Some(encoder_seek),
                Some(encoder_tell),
                None,
                client_data,
            )
        });
        match EncoderInitStatus::from_native(status as u32) {
            EncoderInitStatus::Ok => Ok(()),
            other => Err(other),
        }
    }

    fn process(&mut self, callbacks: &mut dyn EncoderCallbacks, planes: &PlanarView<'_>) -> bool {
        let Ok(samples) = u32::try_from(planes.block_size()) else {
            return false;
        };
        let pointers: Vec<*const sys::FLAC__int32> =
            planes.planes().iter().map(|plane| plane.as_ptr()).collect();
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_encoder_process(
                raw,
                pointers.as_ptr(),
                samples,
            ))
        })
    }

    fn finish(&mut self, callbacks: &mut dyn EncoderCallbacks) -> bool {
        self.call(callbacks, |raw| unsafe {
            to_bool(sys::FLAC__stream_encoder_finish(raw))
        })
    }

    fn state(&self) -> EncoderState {
        let state = unsafe { sys::FLAC__stream_encoder_get_state(self.raw.as_ptr()) };
        EncoderState::from_native(state as u32)
    }
}

impl Drop for LibFlacEncoder {
    fn drop(&mut self) {
        unsafe { sys::FLAC__stream_encoder_delete(self.raw.as_ptr()) }
    }
}

unsafe fn encoder_handler<'a>(client_data: *mut c_void) -> Option<&'a mut dyn EncoderCallbacks> {
    let slot = (client_data as *const HandlerSlot).as_ref()?;
    let handler = slot.0.get() as *mut &'a mut dyn EncoderCallbacks;
    handler.as_mut().map(|handler| &mut **handler)
}

unsafe extern "C" fn encoder_write(
    _encoder: *const sys::FLAC__StreamEncoder,
    buffer: *const sys::FLAC__byte,
    bytes: usize,
    samples: u32,
    current_frame: u32,
    client_data: *mut c_void,
) -> sys::FLAC__StreamEncoderWriteStatus {
    let Some(handler) = encoder_handler(client_data) else {
        return EncoderWriteStatus::FatalError.as_native() as _;
    };
    let data: &[u8] = if buffer.is_null() || bytes == 0 {
        &[]
    } else {
        slice::from_raw_parts(buffer, bytes)
    };
    let status = guarded(EncoderWriteStatus::FatalError, || {
        handler.write(data, samples, current_frame)
    });
    trace!(bytes, samples, current_frame, status = %status, "Encoder write callback");
    status.as_native() as _
}

unsafe extern "C" fn encoder_seek(
    _encoder: *const sys::FLAC__StreamEncoder,
    absolute_byte_offset: sys::FLAC__uint64,
    client_data: *mut c_void,
) -> sys::FLAC__StreamEncoderSeekStatus {
    let Some(handler) = encoder_handler(client_data) else {
        return EncoderSeekStatus::Error.as_native() as _;
    };
    let status = guarded(EncoderSeekStatus::Error, || {
        handler.seek(absolute_byte_offset)
    });
    status.as_native() as _
}

unsafe extern "C" fn encoder_tell(
    _encoder: *const sys::FLAC__StreamEncoder,
    absolute_byte_offset: *mut sys::FLAC__uint64,
    client_data: *mut c_void,
) -> sys::FLAC__StreamEncoderTellStatus {
    let Some(handler) = encoder_handler(client_data) else {
        return EncoderTellStatus::Error.as_native() as _;
    };
    if absolute_byte_offset.is_null() {
        return EncoderTellStatus::Error.as_native() as _;
    }
    let (status, offset) = guarded((EncoderTellStatus::Error, 0), || handler.tell());
    *absolute_byte_offset = offset;
    status.as_native() as _
}
