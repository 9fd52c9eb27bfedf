//! # Transcode Example
//!
//! Decodes a FLAC file and re-encodes it at a different compression level,
//! streaming one block at a time.
//!
//! Run with:
//! `cargo run --example transcode_demo --package core-codec -- in.flac out.flac [level]`
//!
//! Without arguments a short test tone is encoded to a temporary file first.

use anyhow::{bail, Context};
use bridge_desktop::FileStream;
use core_codec::{
    DecodedFrame, DecoderConfig, DecoderSession, EncoderConfig, EncoderSession, SampleBlock,
};
use core_runtime::logging::{
    init_logging, strip_path, LogFormat, LogLevel, LogOutput, LoggingConfig,
};
use std::path::{Path, PathBuf};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug)
            .with_output(LogOutput::Stderr),
    )?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let scratch = tempfile::tempdir()?;
    let (input, output, level) = match args.as_slice() {
        [] => {
            let input = scratch.path().join("tone.flac");
            write_tone(&input)?;
            (input, scratch.path().join("tone-8.flac"), 8)
        }
        [input, output] => (PathBuf::from(input), PathBuf::from(output), 8),
        [input, output, level] => (
            PathBuf::from(input),
            PathBuf::from(output),
            level.parse().context("compression level must be 0-8")?,
        ),
        _ => bail!("usage: transcode_demo [<input.flac> <output.flac> [level]]"),
    };

    transcode(&input, &output, level)
}

fn transcode(input: &Path, output: &Path, level: u32) -> anyhow::Result<()> {
    let source = FileStream::open(input).with_context(|| format!("opening {}", input.display()))?;
    let mut decoder = DecoderSession::open(source, DecoderConfig::default())?;
    let properties = decoder.read_metadata()?;
    info!(
        file = %strip_path(&input.to_string_lossy()),
        channels = properties.channels,
        bits = properties.bits_per_sample,
        rate = properties.sample_rate,
        duration = ?properties.duration(),
        "Source stream"
    );

    let config = EncoderConfig {
        compression_level: level,
        total_samples_estimate: properties.total_samples,
        ..EncoderConfig::new(
            properties.channels,
            properties.bits_per_sample,
            properties.sample_rate,
        )
    };
    let sink = FileStream::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut encoder = EncoderSession::open(sink, config)?;

    while let DecodedFrame::Block(block) = decoder.decode_frame()? {
        encoder.encode_frame(&block)?;
    }
    decoder.close()?;
    encoder.close()?;

    info!(
        samples = encoder.samples_written(),
        input_bytes = decoder.stream().path().metadata()?.len(),
        output_bytes = encoder.bytes_written(),
        "Transcode complete"
    );
    Ok(())
}

/// One second of a 440 Hz stereo tone at compression level 0.
fn write_tone(path: &Path) -> anyhow::Result<()> {
    let config = EncoderConfig {
        compression_level: 0,
        ..EncoderConfig::cd_quality()
    };
    let mut encoder = EncoderSession::open(FileStream::create(path)?, config)?;

    let rate = 44_100usize;
    let samples: Vec<i32> = (0..rate)
        .flat_map(|i| {
            let phase = 2.0 * std::f64::consts::PI * 440.0 * i as f64 / rate as f64;
            let value = (phase.sin() * 12_000.0) as i32;
            [value, value]
        })
        .collect();

    for chunk in samples.chunks(4096 * 2) {
        encoder.encode_frame(&SampleBlock::from_interleaved(chunk.to_vec(), 2)?)?;
    }
    encoder.close()?;
    Ok(())
}
