//! Run-level configuration model.
//!
//! Built incrementally while configuration blocks stream in at the start of
//! a run. Geometry is fixed once the header phase is over; calibration and
//! pedestal tables may still be replaced by mid-stream recalibration blocks.

use std::collections::HashMap;

use bon::Builder;
use ndarray::{Array1, Array2};

use crate::errors::{Result, SimtelError};

/// Camera geometry and optics for one telescope, from a CameraSettings block.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct CameraGeometry {
    pub num_pixels: usize,
    /// Focal length of the optics [m].
    pub focal_length: f64,
    /// Total mirror area corrected for inclination [m^2].
    pub mirror_area: f64,
    pub num_mirrors: usize,
    /// Camera rotation angle [rad], counter-clock-wise from the back side.
    pub cam_rot: f64,
    pub xpix: Array1<f64>,
    pub ypix: Array1<f64>,
    pub pixel_shape: Array1<f64>,
    pub pixel_area: Array1<f64>,
}

/// Readout settings for one telescope, from a PixelSettings block.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PixelSettings {
    /// Gain channels per pixel: 1 or 2 (HI_GAIN = 0, LO_GAIN = 1).
    pub num_gains: usize,
    /// Width of one readout time slice [ns].
    pub time_slice: f64,
    /// Time step between reference-shape entries [ns].
    pub ref_step: f64,
    /// Reference pulse shapes, one row per gain channel.
    pub refshape: Array2<f64>,
}

impl PixelSettings {
    pub fn nrefshape(&self) -> usize {
        self.refshape.nrows()
    }

    pub fn lrefshape(&self) -> usize {
        self.refshape.ncols()
    }
}

/// Simulation run header, decoded once per run when present.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct McRunHeader {
    /// Observation level a.s.l. [m].
    pub obsheight: f64,
    pub num_showers: i32,
    pub e_range_min: f64,
    pub e_range_max: f64,
    pub spectral_index: f64,
    pub viewcone_min: f64,
    pub viewcone_max: f64,
    pub core_range_x: f64,
    pub core_range_y: f64,
    pub diffuse: i32,
    pub injection_height: f64,
    /// Nominal array pointing, (azimuth, altitude) [rad].
    pub direction: [f64; 2],
}

/// Everything known about one telescope of the array.
///
/// `tel_id` and `position` come from the run header; the remaining fields
/// arrive in later blocks and stay `None` until then. An absent field is a
/// `DataNotAvailable` condition, distinct from an invalid telescope id.
#[derive(Debug)]
pub struct TelescopeConfig {
    pub tel_id: i32,
    /// x -> North, y -> West, z -> up, w.r.t. the array reference point [m].
    pub position: [f64; 3],
    pub camera: Option<CameraGeometry>,
    pub pixel_settings: Option<PixelSettings>,
    /// Average pedestal per gain channel and pixel.
    pub pedestal: Option<Array2<f64>>,
    /// ADC-to-p.e. conversion per gain channel and pixel.
    pub calibration: Option<Array2<f64>>,
}

impl TelescopeConfig {
    pub fn new(tel_id: i32, position: [f64; 3]) -> Self {
        Self {
            tel_id,
            position,
            camera: None,
            pixel_settings: None,
            pedestal: None,
            calibration: None,
        }
    }

    pub fn camera(&self) -> Result<&CameraGeometry> {
        self.camera
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("camera settings"))
    }

    pub fn pixel_settings(&self) -> Result<&PixelSettings> {
        self.pixel_settings
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("pixel settings"))
    }
}

/// The run configuration: one per open stream.
///
/// The telescope id -> storage index mapping is established by the run
/// header and never changes for the lifetime of the stream.
#[derive(Debug)]
pub struct RunConfig {
    pub run_number: i32,
    pub telescopes: Vec<TelescopeConfig>,
    pub mc_run_header: Option<McRunHeader>,
    index: HashMap<i32, usize>,
}

impl RunConfig {
    pub fn new(run_number: i32, telescopes: Vec<(i32, [f64; 3])>) -> Self {
        let index = telescopes
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (*id, i))
            .collect();
        let telescopes = telescopes
            .into_iter()
            .map(|(id, pos)| TelescopeConfig::new(id, pos))
            .collect();
        Self {
            run_number,
            telescopes,
            mc_run_header: None,
            index,
        }
    }

    pub fn num_telescopes(&self) -> usize {
        self.telescopes.len()
    }

    pub fn telescope_ids(&self) -> Vec<i32> {
        self.telescopes.iter().map(|t| t.tel_id).collect()
    }

    /// Storage index for a telescope id, or `InvalidTelescopeId`.
    pub fn telescope_index(&self, tel_id: i32) -> Result<usize> {
        self.index
            .get(&tel_id)
            .copied()
            .ok_or(SimtelError::InvalidTelescopeId(tel_id))
    }

    pub fn telescope(&self, tel_id: i32) -> Result<&TelescopeConfig> {
        self.telescope_index(tel_id).map(|i| &self.telescopes[i])
    }

    pub fn telescope_mut(&mut self, tel_id: i32) -> Result<&mut TelescopeConfig> {
        let i = self.telescope_index(tel_id)?;
        Ok(&mut self.telescopes[i])
    }
}
