//! # Status Translation
//!
//! Closed Rust enums for every libFLAC status, state and error code the
//! bridge exchanges with the codec.
//!
//! Each enum converts from the raw native code with `from_native`, falling
//! back to a catch-all variant that keeps the raw value, and back again with
//! `as_native` when the bridge has to hand a status to the codec. Display
//! renders the libFLAC constant name.

use std::fmt;

/// Label used for codes outside a known range.
pub const UNKNOWN_STATUS: &str = "UNKNOWN_STATUS";

macro_rules! native_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident fallback $fallback:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $code:literal => $label:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// Code outside the range this bridge knows about.
            $fallback(u32),
        }

        impl $name {
            /// Map a raw libFLAC code.
            pub fn from_native(code: u32) -> Self {
                match code {
                    $( $code => Self::$variant, )+
                    other => Self::$fallback(other),
                }
            }

            /// Raw libFLAC code for this value.
            pub fn as_native(self) -> u32 {
                match self {
                    $( Self::$variant => $code, )+
                    Self::$fallback(code) => code,
                }
            }

            /// libFLAC constant name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                    Self::$fallback(_) => UNKNOWN_STATUS,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Self::$fallback(code) => write!(f, "{} ({})", UNKNOWN_STATUS, code),
                    other => f.write_str(other.as_str()),
                }
            }
        }
    };
}

// ============================================================================
// Decoder callback statuses (returned to the codec)
// ============================================================================

native_enum! {
    /// Result of a decoder read callback.
    pub enum ReadStatus fallback Unknown {
        Continue = 0 => "FLAC__STREAM_DECODER_READ_STATUS_CONTINUE",
        EndOfStream = 1 => "FLAC__STREAM_DECODER_READ_STATUS_END_OF_STREAM",
        Abort = 2 => "FLAC__STREAM_DECODER_READ_STATUS_ABORT",
    }
}

native_enum! {
    /// Result of a decoder seek callback.
    pub enum SeekStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_DECODER_SEEK_STATUS_OK",
        Error = 1 => "FLAC__STREAM_DECODER_SEEK_STATUS_ERROR",
        Unsupported = 2 => "FLAC__STREAM_DECODER_SEEK_STATUS_UNSUPPORTED",
    }
}

native_enum! {
    /// Result of a decoder tell callback.
    pub enum TellStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_DECODER_TELL_STATUS_OK",
        Error = 1 => "FLAC__STREAM_DECODER_TELL_STATUS_ERROR",
        Unsupported = 2 => "FLAC__STREAM_DECODER_TELL_STATUS_UNSUPPORTED",
    }
}

native_enum! {
    /// Result of a decoder length callback.
    pub enum LengthStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_DECODER_LENGTH_STATUS_OK",
        Error = 1 => "FLAC__STREAM_DECODER_LENGTH_STATUS_ERROR",
        Unsupported = 2 => "FLAC__STREAM_DECODER_LENGTH_STATUS_UNSUPPORTED",
    }
}

native_enum! {
    /// Result of a decoder write (decoded frame) callback.
    pub enum WriteStatus fallback Unknown {
        Continue = 0 => "FLAC__STREAM_DECODER_WRITE_STATUS_CONTINUE",
        Abort = 1 => "FLAC__STREAM_DECODER_WRITE_STATUS_ABORT",
    }
}

// ============================================================================
// Decoder reports (received from the codec)
// ============================================================================

native_enum! {
    /// Bitstream fault reported through the decoder error callback.
    pub enum ErrorKind fallback Unspecified {
        /// Lost synchronization while scanning for a frame.
        LostSync = 0 => "FLAC__STREAM_DECODER_ERROR_STATUS_LOST_SYNC",
        /// Corrupted frame header.
        BadHeader = 1 => "FLAC__STREAM_DECODER_ERROR_STATUS_BAD_HEADER",
        /// Frame CRC did not match its contents.
        FrameCrcMismatch = 2 => "FLAC__STREAM_DECODER_ERROR_STATUS_FRAME_CRC_MISMATCH",
        /// Reserved fields or unsupported features in the stream.
        UnparseableStream = 3 => "FLAC__STREAM_DECODER_ERROR_STATUS_UNPARSEABLE_STREAM",
        /// Metadata block failed validation.
        BadMetadata = 4 => "FLAC__STREAM_DECODER_ERROR_STATUS_BAD_METADATA",
    }
}

native_enum! {
    /// Outcome of registering callbacks with a decoder.
    pub enum DecoderInitStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_DECODER_INIT_STATUS_OK",
        UnsupportedContainer = 1 => "FLAC__STREAM_DECODER_INIT_STATUS_UNSUPPORTED_CONTAINER",
        InvalidCallbacks = 2 => "FLAC__STREAM_DECODER_INIT_STATUS_INVALID_CALLBACKS",
        MemoryAllocationError = 3 => "FLAC__STREAM_DECODER_INIT_STATUS_MEMORY_ALLOCATION_ERROR",
        ErrorOpeningFile = 4 => "FLAC__STREAM_DECODER_INIT_STATUS_ERROR_OPENING_FILE",
        AlreadyInitialized = 5 => "FLAC__STREAM_DECODER_INIT_STATUS_ALREADY_INITIALIZED",
    }
}

native_enum! {
    /// Decoder engine state.
    pub enum DecoderState fallback Unknown {
        SearchForMetadata = 0 => "FLAC__STREAM_DECODER_SEARCH_FOR_METADATA",
        ReadMetadata = 1 => "FLAC__STREAM_DECODER_READ_METADATA",
        SearchForFrameSync = 2 => "FLAC__STREAM_DECODER_SEARCH_FOR_FRAME_SYNC",
        ReadFrame = 3 => "FLAC__STREAM_DECODER_READ_FRAME",
        EndOfStream = 4 => "FLAC__STREAM_DECODER_END_OF_STREAM",
        OggError = 5 => "FLAC__STREAM_DECODER_OGG_ERROR",
        SeekError = 6 => "FLAC__STREAM_DECODER_SEEK_ERROR",
        Aborted = 7 => "FLAC__STREAM_DECODER_ABORTED",
        MemoryAllocationError = 8 => "FLAC__STREAM_DECODER_MEMORY_ALLOCATION_ERROR",
        Uninitialized = 9 => "FLAC__STREAM_DECODER_UNINITIALIZED",
    }
}

impl DecoderState {
    /// Returns `true` if the decoder can keep processing in this state.
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            Self::SearchForMetadata
                | Self::ReadMetadata
                | Self::SearchForFrameSync
                | Self::ReadFrame
                | Self::EndOfStream
        )
    }
}

// ============================================================================
// Encoder callback statuses (returned to the codec)
// ============================================================================

native_enum! {
    /// Result of an encoder write callback.
    pub enum EncoderWriteStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_ENCODER_WRITE_STATUS_OK",
        FatalError = 1 => "FLAC__STREAM_ENCODER_WRITE_STATUS_FATAL_ERROR",
    }
}

native_enum! {
    /// Result of an encoder seek callback.
    pub enum EncoderSeekStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_ENCODER_SEEK_STATUS_OK",
        Error = 1 => "FLAC__STREAM_ENCODER_SEEK_STATUS_ERROR",
        Unsupported = 2 => "FLAC__STREAM_ENCODER_SEEK_STATUS_UNSUPPORTED",
    }
}

native_enum! {
    /// Result of an encoder tell callback.
    pub enum EncoderTellStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_ENCODER_TELL_STATUS_OK",
        Error = 1 => "FLAC__STREAM_ENCODER_TELL_STATUS_ERROR",
        Unsupported = 2 => "FLAC__STREAM_ENCODER_TELL_STATUS_UNSUPPORTED",
    }
}

// ============================================================================
// Encoder reports (received from the codec)
// ============================================================================

native_enum! {
    /// Outcome of configuring and registering callbacks with an encoder.
    pub enum EncoderInitStatus fallback Unknown {
        Ok = 0 => "FLAC__STREAM_ENCODER_INIT_STATUS_OK",
        EncoderError = 1 => "FLAC__STREAM_ENCODER_INIT_STATUS_ENCODER_ERROR",
        UnsupportedContainer = 2 => "FLAC__STREAM_ENCODER_INIT_STATUS_UNSUPPORTED_CONTAINER",
        InvalidCallbacks = 3 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_CALLBACKS",
        InvalidNumberOfChannels = 4 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_NUMBER_OF_CHANNELS",
        InvalidBitsPerSample = 5 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_BITS_PER_SAMPLE",
        InvalidSampleRate = 6 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_SAMPLE_RATE",
        InvalidBlockSize = 7 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_BLOCK_SIZE",
        InvalidMaxLpcOrder = 8 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_MAX_LPC_ORDER",
        InvalidQlpCoeffPrecision = 9 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_QLP_COEFF_PRECISION",
        BlockSizeTooSmallForLpcOrder = 10 => "FLAC__STREAM_ENCODER_INIT_STATUS_BLOCK_SIZE_TOO_SMALL_FOR_LPC_ORDER",
        NotStreamable = 11 => "FLAC__STREAM_ENCODER_INIT_STATUS_NOT_STREAMABLE",
        InvalidMetadata = 12 => "FLAC__STREAM_ENCODER_INIT_STATUS_INVALID_METADATA",
        AlreadyInitialized = 13 => "FLAC__STREAM_ENCODER_INIT_STATUS_ALREADY_INITIALIZED",
    }
}

native_enum! {
    /// Encoder engine state.
    pub enum EncoderState fallback Unknown {
        Ok = 0 => "FLAC__STREAM_ENCODER_OK",
        Uninitialized = 1 => "FLAC__STREAM_ENCODER_UNINITIALIZED",
        OggError = 2 => "FLAC__STREAM_ENCODER_OGG_ERROR",
        VerifyDecoderError = 3 => "FLAC__STREAM_ENCODER_VERIFY_DECODER_ERROR",
        VerifyMismatchInAudioData = 4 => "FLAC__STREAM_ENCODER_VERIFY_MISMATCH_IN_AUDIO_DATA",
        ClientError = 5 => "FLAC__STREAM_ENCODER_CLIENT_ERROR",
        IoError = 6 => "FLAC__STREAM_ENCODER_IO_ERROR",
        FramingError = 7 => "FLAC__STREAM_ENCODER_FRAMING_ERROR",
        MemoryAllocationError = 8 => "FLAC__STREAM_ENCODER_MEMORY_ALLOCATION_ERROR",
    }
}

// ============================================================================
// Metadata
// ============================================================================

native_enum! {
    /// Metadata block type.
    pub enum MetadataKind fallback Unknown {
        StreamInfo = 0 => "STREAMINFO",
        Padding = 1 => "PADDING",
        Application = 2 => "APPLICATION",
        SeekTable = 3 => "SEEKTABLE",
        VorbisComment = 4 => "VORBIS_COMMENT",
        CueSheet = 5 => "CUESHEET",
        Picture = 6 => "PICTURE",
    }
}

const ERROR_STATUS_STRINGS: [&str; 5] = [
    "FLAC__STREAM_DECODER_ERROR_STATUS_LOST_SYNC",
    "FLAC__STREAM_DECODER_ERROR_STATUS_BAD_HEADER",
    "FLAC__STREAM_DECODER_ERROR_STATUS_FRAME_CRC_MISMATCH",
    "FLAC__STREAM_DECODER_ERROR_STATUS_UNPARSEABLE_STREAM",
    "FLAC__STREAM_DECODER_ERROR_STATUS_BAD_METADATA",
];

/// Human-readable name of a decoder error status code.
///
/// Total over `u32`: codes past the end of the table return
/// [`UNKNOWN_STATUS`].
pub fn error_status_str(code: u32) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|index| ERROR_STATUS_STRINGS.get(index))
        .copied()
        .unwrap_or(UNKNOWN_STATUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_defined_error_code_is_specific() {
        for code in 0..5 {
            let kind = ErrorKind::from_native(code);
            assert!(!matches!(kind, ErrorKind::Unspecified(_)), "code {code}");
            assert_eq!(kind.as_native(), code);
            assert_eq!(kind.as_str(), error_status_str(code));
        }
    }

    #[test]
    fn test_out_of_range_error_codes() {
        assert_eq!(ErrorKind::from_native(5), ErrorKind::Unspecified(5));
        assert_eq!(
            ErrorKind::from_native(u32::MAX),
            ErrorKind::Unspecified(u32::MAX)
        );
        assert_eq!(error_status_str(5), UNKNOWN_STATUS);
        assert_eq!(error_status_str(u32::MAX), UNKNOWN_STATUS);
    }

    #[test]
    fn test_callback_statuses_match_native_codes() {
        assert_eq!(ReadStatus::Continue.as_native(), 0);
        assert_eq!(ReadStatus::EndOfStream.as_native(), 1);
        assert_eq!(ReadStatus::Abort.as_native(), 2);
        assert_eq!(SeekStatus::Unsupported.as_native(), 2);
        assert_eq!(TellStatus::Error.as_native(), 1);
        assert_eq!(LengthStatus::Unsupported.as_native(), 2);
        assert_eq!(WriteStatus::Abort.as_native(), 1);
        assert_eq!(EncoderWriteStatus::FatalError.as_native(), 1);
        assert_eq!(EncoderSeekStatus::Unsupported.as_native(), 2);
        assert_eq!(EncoderTellStatus::Ok.as_native(), 0);
    }

    #[test]
    fn test_states_round_trip_and_fall_back() {
        assert_eq!(DecoderState::from_native(4), DecoderState::EndOfStream);
        assert_eq!(DecoderState::from_native(42), DecoderState::Unknown(42));
        assert_eq!(EncoderState::from_native(5), EncoderState::ClientError);
        assert_eq!(
            EncoderInitStatus::from_native(11),
            EncoderInitStatus::NotStreamable
        );
        assert_eq!(DecoderInitStatus::from_native(0), DecoderInitStatus::Ok);
        assert_eq!(MetadataKind::from_native(6), MetadataKind::Picture);
        assert_eq!(MetadataKind::from_native(126), MetadataKind::Unknown(126));
    }

    #[test]
    fn test_usable_states() {
        assert!(DecoderState::ReadFrame.is_usable());
        assert!(DecoderState::EndOfStream.is_usable());
        assert!(!DecoderState::Aborted.is_usable());
        assert!(!DecoderState::SeekError.is_usable());
    }

    #[test]
    fn test_display_uses_native_names() {
        assert_eq!(
            DecoderState::Aborted.to_string(),
            "FLAC__STREAM_DECODER_ABORTED"
        );
        assert_eq!(
            EncoderState::Unknown(99).to_string(),
            "UNKNOWN_STATUS (99)"
        );
    }
}
