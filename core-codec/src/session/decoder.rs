//! Decoder session: pulls FLAC bytes from a stream and yields interleaved
//! sample blocks.

use super::{DecodedFrame, Lifecycle, Progress, SessionState};
use crate::config::DecoderConfig;
use crate::engine::{DecoderEngine, LibFlacDecoder};
use crate::error::{CodecError, Result};
use crate::metadata::{StreamInfo, StreamProperties};
use crate::router::DecoderRouter;
use crate::status::DecoderState;
use bridge_traits::ByteStream;
use std::cell::Cell;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};

/// Streaming FLAC decoder bound to one byte stream.
///
/// # Example
///
/// ```ignore
/// use bridge_desktop::FileStream;
/// use core_codec::{DecodedFrame, DecoderConfig, DecoderSession};
///
/// let mut file = FileStream::open("track.flac")?;
/// let mut session = DecoderSession::open(&mut file, DecoderConfig::default())?;
/// let properties = session.read_metadata()?;
///
/// while let DecodedFrame::Block(block) = session.decode_frame()? {
///     // block.samples() holds block.block_size() * properties.channels samples
/// }
/// session.close()?;
/// ```
pub struct DecoderSession<S: ByteStream, E: DecoderEngine = LibFlacDecoder> {
    engine: E,
    router: DecoderRouter<S>,
    lifecycle: Lifecycle,
    end_of_stream: bool,
    released: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl<S: ByteStream> DecoderSession<S, LibFlacDecoder> {
    /// Open a libFLAC decoder over `stream`.
    ///
    /// Nothing is read until the first decode, metadata or seek call.
    #[instrument(skip_all, fields(md5_checking = config.md5_checking))]
    pub fn open(stream: S, config: DecoderConfig) -> Result<Self> {
        let engine = LibFlacDecoder::new(&config)?;
        Self::with_engine(stream, engine)
    }
}

impl<S: ByteStream, E: DecoderEngine> DecoderSession<S, E> {
    /// Open a session over `stream` driven by `engine`.
    pub fn with_engine(stream: S, mut engine: E) -> Result<Self> {
        let mut router = DecoderRouter::new(stream);
        let mut lifecycle = Lifecycle::new();

        engine
            .init(&mut router)
            .map_err(|status| CodecError::Init(status.to_string()))?;
        lifecycle.state = SessionState::Initialized;
        info!("Decoder session opened");

        Ok(Self {
            engine,
            router,
            lifecycle,
            end_of_stream: false,
            released: false,
            _not_sync: PhantomData,
        })
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state
    }

    /// Whether the decoder has consumed the whole stream.
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream && !self.router.has_pending()
    }

    /// Samples per channel decoded so far.
    pub fn samples_decoded(&self) -> u64 {
        self.router.samples_decoded()
    }

    /// Full STREAMINFO contents, once read.
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.router.extractor().stream_info()
    }

    pub fn stream(&self) -> &S {
        self.router.stream()
    }

    /// Stream properties. Fails with
    /// [`CodecError::UninitializedProperties`] until STREAMINFO has been read.
    pub fn properties(&self) -> Result<StreamProperties> {
        self.lifecycle.ensure_active()?;
        self.router.extractor().properties()
    }

    /// Process metadata up to the first audio frame and return the stream
    /// properties.
    #[instrument(skip(self), level = "debug")]
    pub fn read_metadata(&mut self) -> Result<StreamProperties> {
        self.lifecycle.ensure_active()?;
        if let Ok(properties) = self.router.extractor().properties() {
            return Ok(properties);
        }

        self.lifecycle.mark_running();
        let ok = self.engine.process_until_end_of_metadata(&mut self.router);
        self.check_step(ok)?;
        self.router.extractor().properties()
    }

    /// Run one codec step: one metadata block or one audio frame.
    ///
    /// A block already decoded (for instance by a seek) is returned without
    /// stepping the codec.
    #[instrument(skip(self), level = "trace")]
    pub fn process_single(&mut self) -> Result<Progress> {
        self.lifecycle.ensure_active()?;
        if let Some(block) = self.router.take_block() {
            return Ok(Progress::Block(block));
        }
        if self.end_of_stream {
            return Ok(Progress::EndOfStream);
        }

        self.lifecycle.mark_running();
        let ok = self.engine.process_single(&mut self.router);
        self.check_step(ok)?;

        Ok(match self.router.take_block() {
            Some(block) => Progress::Block(block),
            None if self.end_of_stream => Progress::EndOfStream,
            None => Progress::Continue,
        })
    }

    /// Decode until the next block of audio or the end of the stream.
    pub fn decode_frame(&mut self) -> Result<DecodedFrame> {
        loop {
            match self.process_single()? {
                Progress::Block(block) => return Ok(DecodedFrame::Block(block)),
                Progress::EndOfStream => return Ok(DecodedFrame::EndOfStream),
                Progress::Continue => {}
            }
        }
    }

    /// Reposition so the next block starts at `sample` (per channel).
    ///
    /// A failed seek leaves the session usable. Streams that cannot seek or
    /// report their length yield [`CodecError::Unsupported`].
    #[instrument(skip(self))]
    pub fn seek(&mut self, sample: u64) -> Result<()> {
        self.lifecycle.ensure_active()?;
        if let Ok(StreamProperties {
            total_samples: Some(total),
            ..
        }) = self.router.extractor().properties()
        {
            if sample >= total {
                return Err(CodecError::SeekOutOfRange(sample));
            }
        }

        self.lifecycle.mark_running();
        self.router.clear_pending();
        self.router.take_unsupported();

        self.router.set_seeking(true);
        let ok = self.engine.seek_absolute(&mut self.router, sample);
        self.router.set_seeking(false);

        let unsupported = self.router.take_unsupported();
        let cause = self.router.take_error();
        if ok && cause.is_none() {
            self.end_of_stream = false;
            debug!(sample, "Seek completed");
            return Ok(());
        }

        let state = self.engine.state();
        if state == DecoderState::SeekError {
            self.router.clear_pending();
            let flushed = self.engine.flush(&mut self.router);
            self.router.take_error();
            if !flushed {
                let state = self.engine.state();
                return Err(self.fail(CodecError::Decoder(state)));
            }
        }

        let error = if unsupported {
            CodecError::Unsupported("seek")
        } else if let Some(cause) = cause {
            cause
        } else {
            CodecError::Decoder(state)
        };
        warn!(%error, sample, "Seek failed");
        Err(error)
    }

    /// Finish decoding and release the codec.
    ///
    /// When MD5 checking is on and the whole stream was decoded, a mismatch
    /// is reported as [`CodecError::ChecksumMismatch`].
    ///
    /// Closing a session that already failed releases the codec and returns
    /// `Ok(())`; the state stays [`SessionState::Errored`] so the failure
    /// remains visible. Closing twice is a no-op.
    #[instrument(skip(self))]
    pub fn close(&mut self) -> Result<()> {
        match self.lifecycle.state {
            SessionState::Finished => return Ok(()),
            SessionState::Errored => {
                self.release();
                return Ok(());
            }
            _ => {}
        }

        let verified = self.release();
        self.router.clear_pending();
        if !verified && self.end_of_stream {
            return Err(self.fail(CodecError::ChecksumMismatch));
        }

        self.lifecycle.state = SessionState::Finished;
        info!(
            samples = self.router.samples_decoded(),
            bytes = self.router.bytes_read(),
            "Decoder session closed"
        );
        Ok(())
    }

    /// Surface a recorded fault or a stopped engine after a codec call.
    fn check_step(&mut self, ok: bool) -> Result<()> {
        if let Some(error) = self.router.take_error() {
            return Err(self.fail(error));
        }

        let state = self.engine.state();
        if state == DecoderState::EndOfStream {
            if !self.end_of_stream {
                debug!(samples = self.router.samples_decoded(), "End of stream");
            }
            self.end_of_stream = true;
            return Ok(());
        }

        if !ok || !state.is_usable() {
            return Err(self.fail(CodecError::Decoder(state)));
        }
        Ok(())
    }

    fn release(&mut self) -> bool {
        if self.released {
            return true;
        }
        self.released = true;
        self.engine.finish(&mut self.router)
    }

    fn fail(&mut self, error: CodecError) -> CodecError {
        warn!(%error, "Decoder session failed");
        self.lifecycle.fail(error)
    }
}
