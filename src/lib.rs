//! Workspace facade crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-codec`, `bridge-desktop`, `core-runtime`). Host applications
//! can depend on `flac-bridge` and enable the documented features without
//! wiring each crate individually.

pub use bridge_traits as traits;
pub use core_codec as codec;

pub use bridge_traits::{BridgeError, ByteStream};
pub use core_codec::{
    CodecError, DecodedFrame, DecoderConfig, DecoderSession, EncoderConfig, EncoderSession,
    SampleBlock, StreamProperties,
};

#[cfg(feature = "desktop-adapters")]
pub use bridge_desktop as adapters;

#[cfg(feature = "logging")]
pub use core_runtime::logging;
