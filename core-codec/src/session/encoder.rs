//! Encoder session: accepts interleaved sample blocks and pushes FLAC bytes
//! into a stream.

use super::{Lifecycle, SessionState};
use crate::config::EncoderConfig;
use crate::convert::{PlanarView, SampleBlock, SampleConverter};
use crate::engine::{EncoderEngine, LibFlacEncoder};
use crate::error::{CodecError, Result};
use crate::metadata::StreamProperties;
use crate::router::EncoderRouter;
use bridge_traits::ByteStream;
use std::cell::Cell;
use std::marker::PhantomData;
use tracing::{info, instrument, warn};

/// Streaming FLAC encoder bound to one byte stream.
///
/// The stream header is written when the session opens. When the stream
/// supports seeking, `close` rewrites STREAMINFO with the final totals.
///
/// Dropping a session that was never closed still finishes the stream, but
/// any error from that final flush is only logged.
pub struct EncoderSession<S: ByteStream, E: EncoderEngine = LibFlacEncoder> {
    engine: E,
    router: EncoderRouter<S>,
    config: EncoderConfig,
    lifecycle: Lifecycle,
    samples_written: u64,
    released: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl<S: ByteStream> EncoderSession<S, LibFlacEncoder> {
    /// Open a libFLAC encoder over `stream`.
    #[instrument(skip_all, fields(
        channels = config.channels,
        bits = config.bits_per_sample,
        rate = config.sample_rate
    ))]
    pub fn open(stream: S, config: EncoderConfig) -> Result<Self> {
        config.validate().map_err(CodecError::InvalidConfig)?;
        let engine = LibFlacEncoder::new(&config)?;
        Self::with_engine(stream, config, engine)
    }
}

impl<S: ByteStream, E: EncoderEngine> EncoderSession<S, E> {
    /// Open a session over `stream` driven by `engine`, which must already
    /// be configured to match `config`.
    pub fn with_engine(stream: S, config: EncoderConfig, mut engine: E) -> Result<Self> {
        config.validate().map_err(CodecError::InvalidConfig)?;

        let mut router = EncoderRouter::new(stream);
        let mut lifecycle = Lifecycle::new();

        let init = engine.init(&mut router);
        let cause = router.take_error();
        match (init, cause) {
            (Ok(()), None) => {}
            (Err(status), Some(cause)) => {
                return Err(CodecError::Init(format!("{}: {}", status, cause)))
            }
            (Err(status), None) => return Err(CodecError::Init(status.to_string())),
            (Ok(()), Some(cause)) => return Err(CodecError::Init(cause.to_string())),
        }
        lifecycle.state = SessionState::Initialized;
        info!(
            channels = config.channels,
            bits = config.bits_per_sample,
            rate = config.sample_rate,
            "Encoder session opened"
        );

        Ok(Self {
            engine,
            router,
            config,
            lifecycle,
            samples_written: 0,
            released: false,
            _not_sync: PhantomData,
        })
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Samples per channel accepted so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Encoded bytes pushed to the stream so far.
    pub fn bytes_written(&self) -> u64 {
        self.router.bytes_written()
    }

    pub fn stream(&self) -> &S {
        self.router.stream()
    }

    /// Format the session was opened with.
    pub fn properties(&self) -> Result<StreamProperties> {
        self.lifecycle.ensure_active()?;
        Ok(StreamProperties {
            channels: self.config.channels,
            bits_per_sample: self.config.bits_per_sample,
            sample_rate: self.config.sample_rate,
            total_samples: self.config.total_samples_estimate,
        })
    }

    /// Encode one interleaved block.
    ///
    /// Blocks with the wrong channel count or out-of-range samples are
    /// rejected with [`CodecError::InvalidBlock`] without affecting the
    /// session. An empty block is a no-op.
    #[instrument(skip(self, block), level = "trace", fields(frames = block.block_size()))]
    pub fn encode_frame(&mut self, block: &SampleBlock) -> Result<()> {
        self.lifecycle.ensure_active()?;

        let channels = usize::from(self.config.channels);
        if block.channels() != channels {
            return Err(CodecError::InvalidBlock(format!(
                "expected {} channels, got {}",
                channels,
                block.channels()
            )));
        }
        if block.is_empty() {
            return Ok(());
        }

        let (min, max) = self.config.sample_range();
        if let Some(sample) = block
            .samples()
            .iter()
            .map(|&s| i64::from(s))
            .find(|&s| s < min || s > max)
        {
            return Err(CodecError::InvalidBlock(format!(
                "sample {} does not fit in {} bits",
                sample, self.config.bits_per_sample
            )));
        }

        let planes = SampleConverter::deinterleave(block);
        let view = PlanarView::new(planes.iter().map(Vec::as_slice).collect())?;

        self.lifecycle.mark_running();
        let ok = self.engine.process(&mut self.router, &view);
        if let Some(error) = self.router.take_error() {
            return Err(self.fail(error));
        }
        if !ok {
            let state = self.engine.state();
            return Err(self.fail(CodecError::Encoder(state)));
        }

        self.samples_written += block.block_size() as u64;
        Ok(())
    }

    /// Flush buffered samples, finalize the stream and release the codec.
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

        let ok = self.release();
        if let Some(error) = self.router.take_error() {
            return Err(self.fail(error));
        }
        if !ok {
            let state = self.engine.state();
            return Err(self.fail(CodecError::Encoder(state)));
        }

        self.lifecycle.state = SessionState::Finished;
        info!(
            samples = self.samples_written,
            bytes = self.router.bytes_written(),
            frames = self.router.frames_written(),
            "Encoder session closed"
        );
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
        warn!(%error, "Encoder session failed");
        self.lifecycle.fail(error)
    }
}

impl<S: ByteStream, E: EncoderEngine> Drop for EncoderSession<S, E> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!("Encoder session dropped without close; finishing stream");
        if !self.release() {
            warn!(state = %self.engine.state(), "Finishing dropped encoder failed");
        }
        if let Some(error) = self.router.take_error() {
            warn!(%error, "Stream error while finishing dropped encoder");
        }
    }
}
