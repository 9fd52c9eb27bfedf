//! End-to-end tests against the bundled libFLAC.

use bridge_desktop::{FileStream, MemoryStream, ReaderStream, WriterStream};
use bridge_traits::ByteStream;
use core_codec::{
    CodecError, DecodedFrame, DecoderConfig, DecoderSession, EncoderConfig, EncoderSession,
    SampleBlock, SessionState,
};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

const CHUNK_FRAMES: usize = 1000;

/// Deterministic test signal: a sine per channel plus a little noise.
fn signal(frames: usize, channels: usize, bits: u32) -> Vec<i32> {
    let amplitude = ((1i64 << (bits - 1)) - 1) as f64 * 0.5;
    let mut noise: u32 = 0x2545_f491;
    let mut samples = Vec::with_capacity(frames * channels);

    for frame in 0..frames {
        for channel in 0..channels {
            noise = noise.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let jitter = f64::from((noise >> 24) as u8) - 128.0;
            let freq = 440.0 + 110.0 * channel as f64;
            let phase = 2.0 * std::f64::consts::PI * freq * frame as f64 / 44_100.0;
            samples.push((amplitude * phase.sin() + jitter) as i32);
        }
    }
    samples
}

fn encode<S: ByteStream>(stream: S, config: &EncoderConfig, samples: &[i32]) {
    let channels = usize::from(config.channels);
    let mut session = EncoderSession::open(stream, config.clone()).unwrap();
    for chunk in samples.chunks(CHUNK_FRAMES * channels) {
        let block = SampleBlock::from_interleaved(chunk.to_vec(), channels).unwrap();
        session.encode_frame(&block).unwrap();
    }
    session.close().unwrap();
}

fn decode_all<S: ByteStream>(session: &mut DecoderSession<S>) -> Vec<i32> {
    let mut samples = Vec::new();
    while let DecodedFrame::Block(block) = session.decode_frame().unwrap() {
        samples.extend_from_slice(block.samples());
    }
    samples
}

fn encoded(config: &EncoderConfig, samples: &[i32]) -> Vec<u8> {
    let mut sink = MemoryStream::new();
    encode(&mut sink, config, samples);
    sink.as_slice().to_vec()
}

#[test]
fn test_memory_roundtrip_is_lossless() {
    let config = EncoderConfig::cd_quality();
    let original = signal(20_000, 2, 16);
    let bytes = encoded(&config, &original);
    assert_eq!(&bytes[..4], b"fLaC");

    let mut session =
        DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
    let properties = session.read_metadata().unwrap();
    assert_eq!(properties.channels, 2);
    assert_eq!(properties.bits_per_sample, 16);
    assert_eq!(properties.sample_rate, 44_100);
    assert_eq!(properties.total_samples, Some(20_000));
    assert!(session.stream_info().unwrap().has_md5());

    let decoded = decode_all(&mut session);
    assert_eq!(decoded, original);
    assert_eq!(session.samples_decoded(), 20_000);

    session.close().unwrap();
    assert_eq!(session.state(), SessionState::Finished);
}

#[test]
fn test_hi_res_mono_roundtrip() {
    let config = EncoderConfig {
        channels: 1,
        ..EncoderConfig::hi_res()
    };
    let original = signal(9_000, 1, 24);
    let bytes = encoded(&config, &original);

    let mut session =
        DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
    let properties = session.read_metadata().unwrap();
    assert_eq!(properties.channels, 1);
    assert_eq!(properties.bits_per_sample, 24);
    assert_eq!(properties.sample_rate, 96_000);

    assert_eq!(decode_all(&mut session), original);
    session.close().unwrap();
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.flac");
    let config = EncoderConfig::new(2, 16, 48_000);
    let original = signal(12_345, 2, 16);

    encode(FileStream::create(&path).unwrap(), &config, &original);

    let mut session =
        DecoderSession::open(FileStream::open(&path).unwrap(), DecoderConfig::default()).unwrap();
    assert_eq!(session.read_metadata().unwrap().sample_rate, 48_000);
    assert_eq!(decode_all(&mut session), original);
    session.close().unwrap();
}

#[test]
fn test_non_subset_formats_roundtrip() {
    for config in [
        EncoderConfig::new(2, 10, 44_100),
        EncoderConfig::new(1, 18, 44_100),
        EncoderConfig::new(2, 16, 70_001),
    ] {
        assert!(!config.is_streamable_subset());
        let channels = usize::from(config.channels);
        let original = signal(6_000, channels, config.bits_per_sample);
        let bytes = encoded(&config, &original);

        let mut session =
            DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
        let properties = session.read_metadata().unwrap();
        assert_eq!(properties.bits_per_sample, config.bits_per_sample);
        assert_eq!(properties.sample_rate, config.sample_rate);
        assert_eq!(decode_all(&mut session), original);
        session.close().unwrap();
    }
}

#[test]
fn test_forward_only_source_decodes() {
    let config = EncoderConfig::cd_quality();
    let original = signal(10_000, 2, 16);
    let bytes = encoded(&config, &original);

    let mut session = DecoderSession::open(
        ReaderStream::new(Cursor::new(bytes)),
        DecoderConfig::default(),
    )
    .unwrap();
    assert_eq!(decode_all(&mut session), original);
    assert!(session.is_end_of_stream());
    session.close().unwrap();
}

#[test]
fn test_forward_only_source_cannot_seek() {
    let bytes = encoded(&EncoderConfig::cd_quality(), &signal(10_000, 2, 16));

    let mut session = DecoderSession::open(
        ReaderStream::new(Cursor::new(bytes)),
        DecoderConfig::default(),
    )
    .unwrap();
    session.read_metadata().unwrap();

    assert!(matches!(
        session.seek(5_000),
        Err(CodecError::Unsupported("seek"))
    ));
    assert!(session.state().is_active());
}

#[test]
fn test_non_seekable_sink_leaves_total_unknown() {
    let config = EncoderConfig::cd_quality();
    let original = signal(8_000, 2, 16);

    let mut writer = WriterStream::new(Vec::new());
    encode(&mut writer, &config, &original);
    let bytes = writer.into_inner().unwrap();

    let mut session =
        DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
    let properties = session.read_metadata().unwrap();
    assert_eq!(properties.total_samples, None);
    assert!(properties.duration().is_none());

    assert_eq!(decode_all(&mut session), original);
    session.close().unwrap();
}

#[test]
fn test_total_samples_estimate_for_non_seekable_sink() {
    let config = EncoderConfig {
        total_samples_estimate: Some(8_000),
        ..EncoderConfig::cd_quality()
    };

    let mut writer = WriterStream::new(Vec::new());
    encode(&mut writer, &config, &signal(8_000, 2, 16));
    let bytes = writer.into_inner().unwrap();

    let mut session =
        DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
    assert_eq!(session.read_metadata().unwrap().total_samples, Some(8_000));
}

#[test]
fn test_seek_lands_on_target_sample() {
    let original = signal(30_000, 2, 16);
    let bytes = encoded(&EncoderConfig::cd_quality(), &original);

    let mut session =
        DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
    session.read_metadata().unwrap();
    session.decode_frame().unwrap();

    session.seek(17_000).unwrap();
    let block = session.decode_frame().unwrap().into_block().unwrap();
    assert_eq!(&block.samples()[..2], &original[34_000..34_002]);

    let mut rest = block.into_samples();
    rest.extend(decode_all(&mut session));
    assert_eq!(rest, &original[34_000..]);

    assert!(matches!(
        session.seek(30_000),
        Err(CodecError::SeekOutOfRange(30_000))
    ));
    session.close().unwrap();
}

#[test]
fn test_corrupted_frame_fails_session() {
    let mut bytes = encoded(&EncoderConfig::cd_quality(), &signal(20_000, 2, 16));
    let middle = bytes.len() / 2;
    for byte in &mut bytes[middle..middle + 32] {
        *byte ^= 0x5A;
    }

    let mut session =
        DecoderSession::open(MemoryStream::from(bytes), DecoderConfig::default()).unwrap();
    let error = loop {
        match session.decode_frame() {
            Ok(DecodedFrame::Block(_)) => continue,
            Ok(DecodedFrame::EndOfStream) => panic!("corruption went unnoticed"),
            Err(error) => break error,
        }
    };

    assert!(error.is_integrity_error(), "unexpected: {:?}", error);
    assert_eq!(session.state(), SessionState::Errored);
    assert!(matches!(
        session.decode_frame(),
        Err(CodecError::SessionFailed(_))
    ));
    session.close().unwrap();
}

#[test]
fn test_non_flac_input_has_no_properties() {
    let garbage = b"this is certainly not a FLAC stream. ".repeat(64);
    let mut session =
        DecoderSession::open(MemoryStream::from(garbage), DecoderConfig::default()).unwrap();

    assert!(session.read_metadata().is_err());
    assert!(session.properties().is_err());
}

#[test]
fn test_invalid_encoder_config() {
    let config = EncoderConfig {
        compression_level: 12,
        ..Default::default()
    };
    assert!(matches!(
        EncoderSession::open(MemoryStream::new(), config),
        Err(CodecError::InvalidConfig(_))
    ));
}

/// Decode with symphonia's independent FLAC reader.
fn symphonia_decode(bytes: Vec<u8>) -> anyhow::Result<(u32, Vec<i32>)> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    hint.with_extension("flac");

    let probed = symphonia::default::get_probe().format(
        &hint,
        source,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow::anyhow!("no audio track"))?;
    let track_id = track.id;
    let bits = track.codec_params.bits_per_sample.unwrap_or(32);
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(error))
                if error.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(error) => return Err(error.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet)?;
        let mut buffer = SampleBuffer::<i32>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }
    Ok((bits, samples))
}

#[test]
fn test_output_readable_by_symphonia() -> anyhow::Result<()> {
    let original = signal(15_000, 2, 16);
    let bytes = encoded(&EncoderConfig::cd_quality(), &original);

    let (bits, decoded) = symphonia_decode(bytes)?;
    assert_eq!(bits, 16);
    assert_eq!(decoded.len(), original.len());

    // symphonia widens samples to the full i32 range
    let limit = 1u32 << (bits - 1);
    let shift = if decoded.iter().any(|&s| s.unsigned_abs() > limit) {
        32 - bits
    } else {
        0
    };
    let rescaled: Vec<i32> = decoded.iter().map(|&s| s >> shift).collect();
    assert_eq!(rescaled, original);
    Ok(())
}
