//! # FLAC Codec Sessions
//!
//! Streaming FLAC decoding and encoding over caller-supplied byte streams.
//!
//! ## Overview
//!
//! This crate handles:
//! - Decoder and encoder sessions bound to any [`ByteStream`](bridge_traits::ByteStream)
//! - Routing libFLAC's read/seek/tell/length/eof/write callbacks to the stream
//! - Conversion between the codec's per-channel planes and interleaved blocks
//! - STREAMINFO extraction into [`StreamProperties`]
//! - Translation of native status codes into typed enums and [`CodecError`]
//!
//! Samples are signed integers right-aligned in `i32`, interleaved by frame.

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod router;
pub mod session;
pub mod status;

pub use config::{DecoderConfig, EncoderConfig};
pub use convert::{PlanarView, SampleBlock, SampleConverter, MAX_CHANNELS};
pub use engine::{
    DecoderCallbacks, DecoderEngine, EncoderCallbacks, EncoderEngine, FrameHeader,
    LibFlacDecoder, LibFlacEncoder,
};
pub use error::{CodecError, Result};
pub use metadata::{MetadataEvent, MetadataExtractor, StreamInfo, StreamProperties};
pub use session::{DecodedFrame, DecoderSession, EncoderSession, Progress, SessionState};
