//! Decoders for run-configuration blocks.

use ndarray::{Array1, Array2};

use crate::errors::{Result, SimtelError};
use crate::parser::block::Block;
use crate::parser::cursor::{Cursor, table_elements};
use crate::types::{CameraGeometry, McRunHeader, PixelSettings};

fn tel_id(cur: &mut Cursor<'_>) -> Result<i32> {
    let raw = cur.read_uvarint()?;
    i32::try_from(raw)
        .map_err(|_| SimtelError::MalformedBlock(format!("telescope id {raw} out of range")))
}

/// Run header: run number plus the full telescope id/position table. This
/// is the block that fixes the id -> index mapping for the whole stream.
pub(crate) fn run_header(cur: &mut Cursor<'_>) -> Result<Block> {
    let run_number = cur.read_i32()?;
    let ntel = cur.read_count()?;
    let mut telescopes = Vec::with_capacity(ntel);
    for _ in 0..ntel {
        let id = tel_id(cur)?;
        let x = cur.read_f64()?;
        let y = cur.read_f64()?;
        let z = cur.read_f64()?;
        telescopes.push((id, [x, y, z]));
    }
    Ok(Block::RunHeader {
        run_number,
        telescopes,
    })
}

pub(crate) fn mc_run_header(cur: &mut Cursor<'_>) -> Result<Block> {
    let obsheight = cur.read_f64()?;
    let num_showers = cur.read_i32()?;
    let e_range_min = cur.read_f64()?;
    let e_range_max = cur.read_f64()?;
    let spectral_index = cur.read_f64()?;
    let viewcone_min = cur.read_f64()?;
    let viewcone_max = cur.read_f64()?;
    let core_range_x = cur.read_f64()?;
    let core_range_y = cur.read_f64()?;
    let diffuse = cur.read_i32()?;
    let injection_height = cur.read_f64()?;
    let direction_az = cur.read_f64()?;
    let direction_alt = cur.read_f64()?;
    Ok(Block::McRunHeader(
        McRunHeader::builder()
            .obsheight(obsheight)
            .num_showers(num_showers)
            .e_range_min(e_range_min)
            .e_range_max(e_range_max)
            .spectral_index(spectral_index)
            .viewcone_min(viewcone_min)
            .viewcone_max(viewcone_max)
            .core_range_x(core_range_x)
            .core_range_y(core_range_y)
            .diffuse(diffuse)
            .injection_height(injection_height)
            .direction([direction_az, direction_alt])
            .build(),
    ))
}

/// Camera geometry for one telescope; the telescope id rides in the block
/// header's ident field.
pub(crate) fn camera_settings(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    let num_pixels = cur.read_count()?;
    let focal_length = cur.read_f64()?;
    let mirror_area = cur.read_f64()?;
    let num_mirrors = cur.read_count()?;
    let cam_rot = cur.read_f64()?;
    let xpix = Array1::from_vec(cur.read_f64_vec(num_pixels)?);
    let ypix = Array1::from_vec(cur.read_f64_vec(num_pixels)?);
    let pixel_shape = Array1::from_vec(cur.read_f64_vec(num_pixels)?);
    let pixel_area = Array1::from_vec(cur.read_f64_vec(num_pixels)?);
    Ok(Block::CameraSettings {
        tel_id: ident,
        camera: CameraGeometry::builder()
            .num_pixels(num_pixels)
            .focal_length(focal_length)
            .mirror_area(mirror_area)
            .num_mirrors(num_mirrors)
            .cam_rot(cam_rot)
            .xpix(xpix)
            .ypix(ypix)
            .pixel_shape(pixel_shape)
            .pixel_area(pixel_area)
            .build(),
    })
}

pub(crate) fn pixel_settings(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    let num_gains = cur.read_count()?;
    if !(1..=2).contains(&num_gains) {
        return Err(SimtelError::MalformedBlock(format!(
            "telescope {ident} declares {num_gains} gain channels, expected 1 or 2"
        )));
    }
    let time_slice = cur.read_f64()?;
    let ref_step = cur.read_f64()?;
    let nrefshape = cur.read_count()?;
    let lrefshape = cur.read_count()?;
    let flat = cur.read_f64_vec(table_elements(&[nrefshape, lrefshape])?)?;
    let refshape = Array2::from_shape_vec((nrefshape, lrefshape), flat)
        .map_err(|e| SimtelError::MalformedBlock(format!("reference pulse shapes: {e}")))?;
    Ok(Block::PixelSettings {
        tel_id: ident,
        settings: PixelSettings::builder()
            .num_gains(num_gains)
            .time_slice(time_slice)
            .ref_step(ref_step)
            .refshape(refshape)
            .build(),
    })
}

fn gain_pixel_table(cur: &mut Cursor<'_>, what: &str) -> Result<Array2<f64>> {
    let num_gains = cur.read_count()?;
    let num_pixels = cur.read_count()?;
    let flat = cur.read_f64_vec(table_elements(&[num_gains, num_pixels])?)?;
    Array2::from_shape_vec((num_gains, num_pixels), flat)
        .map_err(|e| SimtelError::MalformedBlock(format!("{what} table: {e}")))
}

/// Telescope monitor block: pedestal table. May appear mid-stream as a
/// live recalibration update.
pub(crate) fn tel_monitor(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    Ok(Block::TelMonitor {
        tel_id: ident,
        pedestal: gain_pixel_table(cur, "pedestal")?,
    })
}

/// Laser/LED calibration block: ADC-to-p.e. conversion table.
pub(crate) fn laser_calib(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    Ok(Block::LaserCalib {
        tel_id: ident,
        calibration: gain_pixel_table(cur, "calibration")?,
    })
}
