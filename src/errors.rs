//! Error taxonomy for the container reader.
//!
//! Every accessor and advance operation reports through [`SimtelError`];
//! there are no sentinel-coded return values anywhere in the public surface.

use std::io;

pub type Result<T> = std::result::Result<T, SimtelError>;

/// Errors raised while opening, advancing through, or querying a stream.
#[derive(Debug, thiserror::Error)]
pub enum SimtelError {
    /// Fewer bytes remain than a block or field declares. Fatal to the
    /// current advance; previously decoded state is untouched.
    #[error("truncated stream at byte {position}: needed {needed} bytes, {remaining} remain")]
    TruncatedStream {
        position: usize,
        needed: usize,
        remaining: usize,
    },

    /// A recognised block whose payload is internally inconsistent,
    /// e.g. the declared length does not match the decoded field count.
    #[error("malformed block: {0}")]
    MalformedBlock(String),

    /// A stream is already open through the process-global wrapper.
    #[error("a stream is already open; close it first")]
    StreamAlreadyOpen,

    /// No stream is open through the process-global wrapper.
    #[error("no stream is open")]
    NoStreamOpen,

    /// The telescope id is not present in the run configuration.
    #[error("no telescope with id {0}")]
    InvalidTelescopeId(i32),

    /// The gain-channel index is outside the configured channel count.
    #[error("telescope {tel_id} has {num_gains} gain channel(s), no channel {channel}")]
    InvalidChannelIndex {
        tel_id: i32,
        channel: usize,
        num_gains: usize,
    },

    /// The pixel index is outside the configured pixel count.
    #[error("telescope {tel_id} has {num_pixels} pixel(s), no pixel {pixel}")]
    InvalidPixelIndex {
        tel_id: i32,
        pixel: usize,
        num_pixels: usize,
    },

    /// Indices are valid but the requested field was never populated for
    /// the current run or event. Ask again after a different event.
    #[error("{0} not available")]
    DataNotAvailable(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
