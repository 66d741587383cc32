//! Block framing and the type registry/dispatcher.
//!
//! Every unit of the container is framed as
//!
//! ```text
//! u16 block_type | u16 version | i32 ident | u32 length | payload[length]
//! ```
//!
//! `ident` carries the telescope id for per-telescope configuration blocks
//! and the event/shower id for event-level blocks. Unknown block types are
//! skipped using only the declared length, which is what keeps the reader
//! forward-compatible with newer writers.

use ndarray::{Array1, Array2};
use tracing::debug;

use crate::errors::{Result, SimtelError};
use crate::parser::cursor::Cursor;
use crate::parser::{config, event};
use crate::types::{CameraGeometry, EventRecord, McEvent, McRunHeader, McShower, PixelSettings};

// Block type registry. Numbering follows the original container.
pub const RUN_HEADER: u16 = 2000;
pub const MC_RUN_HEADER: u16 = 2001;
pub const CAMERA_SETTINGS: u16 = 2002;
pub const PIXEL_SETTINGS: u16 = 2004;
pub const CENTRAL_TRIGGER: u16 = 2009;
pub const EVENT: u16 = 2010;
pub const TELESCOPE_EVENT: u16 = 2011;
pub const ADC_SUMS: u16 = 2012;
pub const ADC_SAMPLES: u16 = 2013;
pub const TRACKING_DATA: u16 = 2014;
pub const PIXEL_TIMING: u16 = 2016;
pub const MC_SHOWER: u16 = 2020;
pub const MC_EVENT: u16 = 2021;
pub const TEL_MONITOR: u16 = 2022;
pub const LASER_CALIB: u16 = 2023;
pub const MC_PHOTO_ELECTRONS: u16 = 2026;

/// The single payload-layout version this reader understands.
pub const SUPPORTED_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_type: u16,
    pub version: u16,
    pub ident: i32,
    pub length: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 12;

    /// Read the next block header, or `None` at a clean end of stream.
    /// Running out of bytes mid-header is a `TruncatedStream`.
    pub fn read(cur: &mut Cursor<'_>) -> Result<Option<BlockHeader>> {
        if cur.at_end() {
            return Ok(None);
        }
        let block_type = cur.read_u16()?;
        let version = cur.read_u16()?;
        let ident = cur.read_i32()?;
        let length = cur.read_u32()?;
        Ok(Some(BlockHeader {
            block_type,
            version,
            ident,
            length,
        }))
    }
}

/// A decoded top-level block, ready to be applied to the models.
#[derive(Debug)]
pub enum Block {
    RunHeader {
        run_number: i32,
        telescopes: Vec<(i32, [f64; 3])>,
    },
    McRunHeader(McRunHeader),
    CameraSettings {
        tel_id: i32,
        camera: CameraGeometry,
    },
    PixelSettings {
        tel_id: i32,
        settings: PixelSettings,
    },
    TelMonitor {
        tel_id: i32,
        pedestal: Array2<f64>,
    },
    LaserCalib {
        tel_id: i32,
        calibration: Array2<f64>,
    },
    McShower(McShower),
    McEvent(McEvent),
    McPhotoElectrons {
        event_id: i32,
        counts: Vec<(i32, Array1<i32>)>,
    },
    Event(EventRecord),
    Skipped {
        block_type: u16,
    },
}

/// Route one framed payload to the decoder registered for its type.
///
/// Decoders are pure functions of the payload bytes; they never consult the
/// models they will later be applied to. `base` is the absolute stream
/// offset of the payload, so nested diagnostics stay meaningful.
pub fn decode_block(header: &BlockHeader, payload: &[u8], base: usize) -> Result<Block> {
    if header.version != SUPPORTED_VERSION {
        debug!(
            block_type = header.block_type,
            version = header.version,
            "skipping block with unsupported version"
        );
        return Ok(Block::Skipped {
            block_type: header.block_type,
        });
    }
    let mut cur = Cursor::with_base(payload, base);
    let block = match header.block_type {
        RUN_HEADER => config::run_header(&mut cur)?,
        MC_RUN_HEADER => config::mc_run_header(&mut cur)?,
        CAMERA_SETTINGS => config::camera_settings(&mut cur, header.ident)?,
        PIXEL_SETTINGS => config::pixel_settings(&mut cur, header.ident)?,
        TEL_MONITOR => config::tel_monitor(&mut cur, header.ident)?,
        LASER_CALIB => config::laser_calib(&mut cur, header.ident)?,
        MC_SHOWER => event::mc_shower(&mut cur, header.ident)?,
        MC_EVENT => event::mc_event(&mut cur, header.ident)?,
        MC_PHOTO_ELECTRONS => event::mc_photo_electrons(&mut cur, header.ident)?,
        EVENT => event::event_record(&mut cur, header.ident)?,
        other => {
            debug!(block_type = other, length = header.length, "skipping unknown block type");
            return Ok(Block::Skipped { block_type: other });
        }
    };
    if !cur.at_end() {
        return Err(SimtelError::MalformedBlock(format!(
            "block type {} declared {} payload bytes but {} were left undecoded",
            header.block_type,
            header.length,
            cur.remaining()
        )));
    }
    Ok(block)
}
