//! Encoder session behaviour driven by a scripted engine.

use bridge_desktop::MemoryStream;
use bridge_traits::{BridgeError, ByteStream, Result as BridgeResult};
use core_codec::engine::{EncoderCallbacks, EncoderEngine};
use core_codec::status::{EncoderInitStatus, EncoderState, EncoderWriteStatus};
use core_codec::{CodecError, EncoderConfig, EncoderSession, PlanarView, SampleBlock, SessionState};
use std::cell::Cell;
use std::rc::Rc;

const HEADER: &[u8] = b"fLaC";

/// Writes a fixed header on init and one byte per sample-frame on process.
struct ScriptedEncoder {
    state: EncoderState,
    frame: u32,
    finish_state: EncoderState,
    processed: Rc<Cell<usize>>,
    finishes: Rc<Cell<usize>>,
}

impl ScriptedEncoder {
    fn new() -> Self {
        Self {
            state: EncoderState::Uninitialized,
            frame: 0,
            finish_state: EncoderState::Uninitialized,
            processed: Rc::new(Cell::new(0)),
            finishes: Rc::new(Cell::new(0)),
        }
    }
}

impl EncoderEngine for ScriptedEncoder {
    fn init(&mut self, callbacks: &mut dyn EncoderCallbacks) -> Result<(), EncoderInitStatus> {
        if callbacks.write(HEADER, 0, 0) != EncoderWriteStatus::Ok {
            self.state = EncoderState::ClientError;
            return Err(EncoderInitStatus::EncoderError);
        }
        self.state = EncoderState::Ok;
        Ok(())
    }

    fn process(&mut self, callbacks: &mut dyn EncoderCallbacks, planes: &PlanarView<'_>) -> bool {
        self.processed.set(self.processed.get() + 1);
        let frame = vec![0xAB; planes.block_size()];
        if callbacks.write(&frame, planes.block_size() as u32, self.frame) != EncoderWriteStatus::Ok
        {
            self.state = EncoderState::ClientError;
            return false;
        }
        self.frame += 1;
        true
    }

    fn finish(&mut self, callbacks: &mut dyn EncoderCallbacks) -> bool {
        self.finishes.set(self.finishes.get() + 1);
        callbacks.seek(0);
        self.state = self.finish_state;
        self.finish_state == EncoderState::Uninitialized
    }

    fn state(&self) -> EncoderState {
        self.state
    }
}

/// Sink that accepts a fixed number of writes and then fails.
struct FlakySink {
    writes_left: usize,
}

impl ByteStream for FlakySink {
    fn write(&mut self, _buf: &[u8]) -> BridgeResult<()> {
        if self.writes_left == 0 {
            return Err(BridgeError::OperationFailed("disk full".into()));
        }
        self.writes_left -= 1;
        Ok(())
    }
}

fn stereo(frames: &[(i32, i32)]) -> SampleBlock {
    let samples = frames.iter().flat_map(|&(l, r)| [l, r]).collect();
    SampleBlock::from_interleaved(samples, 2).unwrap()
}

#[test]
fn test_encodes_blocks_into_stream() {
    let mut sink = MemoryStream::new();
    let engine = ScriptedEncoder::new();
    let finishes = engine.finishes.clone();

    {
        let mut session =
            EncoderSession::with_engine(&mut sink, EncoderConfig::default(), engine).unwrap();
        assert_eq!(session.state(), SessionState::Initialized);

        session.encode_frame(&stereo(&[(1, -1), (2, -2), (3, -3)])).unwrap();
        session.encode_frame(&stereo(&[(4, -4)])).unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.samples_written(), 4);
        assert_eq!(session.bytes_written(), HEADER.len() as u64 + 4);

        session.close().unwrap();
        assert_eq!(session.state(), SessionState::Finished);
    }

    assert_eq!(finishes.get(), 1);
    assert_eq!(&sink.as_slice()[..4], HEADER);
    assert_eq!(sink.len(), HEADER.len() + 4);
}

#[test]
fn test_rejects_mismatched_channels() {
    let mut session =
        EncoderSession::with_engine(MemoryStream::new(), EncoderConfig::default(), ScriptedEncoder::new())
            .unwrap();
    let mono = SampleBlock::from_interleaved(vec![1, 2, 3], 1).unwrap();

    match session.encode_frame(&mono) {
        Err(CodecError::InvalidBlock(reason)) => assert!(reason.contains("expected 2 channels")),
        other => panic!("unexpected: {:?}", other),
    }
    assert!(session.state().is_active());
}

#[test]
fn test_rejects_out_of_range_samples() {
    let engine = ScriptedEncoder::new();
    let processed = engine.processed.clone();
    let mut session =
        EncoderSession::with_engine(MemoryStream::new(), EncoderConfig::default(), engine).unwrap();

    assert!(matches!(
        session.encode_frame(&stereo(&[(0, 40_000)])),
        Err(CodecError::InvalidBlock(_))
    ));
    assert!(session.encode_frame(&stereo(&[(32_767, -32_768)])).is_ok());
    assert_eq!(processed.get(), 1);
}

#[test]
fn test_empty_block_is_noop() {
    let engine = ScriptedEncoder::new();
    let processed = engine.processed.clone();
    let mut session =
        EncoderSession::with_engine(MemoryStream::new(), EncoderConfig::default(), engine).unwrap();

    session.encode_frame(&SampleBlock::empty(2).unwrap()).unwrap();
    assert_eq!(processed.get(), 0);
    assert_eq!(session.samples_written(), 0);
    assert_eq!(session.state(), SessionState::Initialized);
}

#[test]
fn test_sink_failure_fails_session() {
    let engine = ScriptedEncoder::new();
    let finishes = engine.finishes.clone();
    let mut session = EncoderSession::with_engine(
        FlakySink { writes_left: 1 },
        EncoderConfig::default(),
        engine,
    )
    .unwrap();

    match session.encode_frame(&stereo(&[(1, 1)])) {
        Err(CodecError::Io(error)) => assert!(error.to_string().contains("disk full")),
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(session.state(), SessionState::Errored);

    match session.encode_frame(&stereo(&[(1, 1)])) {
        Err(CodecError::SessionFailed(reason)) => assert!(reason.contains("disk full")),
        other => panic!("unexpected: {:?}", other),
    }

    session.close().unwrap();
    session.close().unwrap();
    drop(session);
    assert_eq!(finishes.get(), 1);
}

#[test]
fn test_header_write_failure_fails_init() {
    let result = EncoderSession::with_engine(
        FlakySink { writes_left: 0 },
        EncoderConfig::default(),
        ScriptedEncoder::new(),
    );

    match result {
        Err(CodecError::Init(reason)) => {
            assert!(reason.contains("ENCODER_ERROR"));
            assert!(reason.contains("disk full"));
        }
        Err(other) => panic!("unexpected: {:?}", other),
        Ok(_) => panic!("init should fail"),
    }
}

#[test]
fn test_invalid_config_rejected() {
    let config = EncoderConfig {
        channels: 0,
        ..Default::default()
    };

    let result = EncoderSession::with_engine(MemoryStream::new(), config, ScriptedEncoder::new());
    assert!(matches!(result, Err(CodecError::InvalidConfig(_))));
}

#[test]
fn test_drop_without_close_finishes_stream() {
    let engine = ScriptedEncoder::new();
    let finishes = engine.finishes.clone();
    let mut session =
        EncoderSession::with_engine(MemoryStream::new(), EncoderConfig::default(), engine).unwrap();
    session.encode_frame(&stereo(&[(5, 5)])).unwrap();

    drop(session);
    assert_eq!(finishes.get(), 1);
}

#[test]
fn test_closed_session_rejects_operations() {
    let mut session =
        EncoderSession::with_engine(MemoryStream::new(), EncoderConfig::default(), ScriptedEncoder::new())
            .unwrap();
    session.close().unwrap();
    session.close().unwrap();

    assert!(matches!(
        session.encode_frame(&stereo(&[(1, 1)])),
        Err(CodecError::SessionClosed)
    ));
    assert!(matches!(session.properties(), Err(CodecError::SessionClosed)));
}

#[test]
fn test_properties_follow_config() {
    let config = EncoderConfig {
        total_samples_estimate: Some(88_200),
        ..EncoderConfig::hi_res()
    };
    let session =
        EncoderSession::with_engine(MemoryStream::new(), config, ScriptedEncoder::new()).unwrap();

    let properties = session.properties().unwrap();
    assert_eq!(properties.channels, 2);
    assert_eq!(properties.bits_per_sample, 24);
    assert_eq!(properties.sample_rate, 96_000);
    assert_eq!(properties.total_samples, Some(88_200));
}

#[test]
fn test_finish_failure_reported_on_close() {
    let mut engine = ScriptedEncoder::new();
    engine.finish_state = EncoderState::VerifyMismatchInAudioData;
    let mut session =
        EncoderSession::with_engine(MemoryStream::new(), EncoderConfig::default(), engine).unwrap();
    session.encode_frame(&stereo(&[(1, 2)])).unwrap();

    assert!(matches!(
        session.close(),
        Err(CodecError::Encoder(EncoderState::VerifyMismatchInAudioData))
    ));
    assert_eq!(session.state(), SessionState::Errored);
}
