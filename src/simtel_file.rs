//! The open-stream handle: owns the mapped bytes, the decoded run
//! configuration and the current event, and exposes the query surface.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use ndarray::{Array1, Array2, Array3};
use tracing::{debug, info, warn};

use crate::errors::{Result, SimtelError};
use crate::parser::block::{self, Block, BlockHeader};
use crate::parser::cursor::Cursor;
use crate::types::{
    AdcData, CentralTrigger, CurrentEvent, McEvent, McRunHeader, McShower, PixelTiming, RunConfig,
    TelescopeConfig, TelescopeEvent, TrackingData,
};

enum Source {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Source {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Source::Mapped(map) => map,
            Source::Owned(buf) => buf,
        }
    }
}

/// What an advance stops at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdvanceMode {
    /// Stop at the next triggered array event.
    Triggered,
    /// Stop at the next simulated shower use, triggered or not.
    McTruth,
}

/// A sequential reader over one container stream.
///
/// Blocks are decoded on demand as the reader advances; accessors answer
/// from the last fully decoded state. A decode failure leaves the
/// previously committed event intact.
pub struct SimtelFile {
    source: Source,
    pos: usize,
    run_config: Option<RunConfig>,
    event: CurrentEvent,
    finished: bool,
    /// True until the first event-family block; geometry blocks are only
    /// accepted while this holds.
    header_phase: bool,
}

impl SimtelFile {
    /// Open a container file via a read-only memory map.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file)? };
        info!(path = %path.display(), bytes = map.len(), "opened stream");
        Ok(Self::new(Source::Mapped(map)))
    }

    /// Read a container stream already held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Source::Owned(bytes))
    }

    fn new(source: Source) -> Self {
        Self {
            source,
            pos: 0,
            run_config: None,
            event: CurrentEvent::default(),
            finished: false,
            header_phase: true,
        }
    }

    /// Advance to the next triggered array event. `Ok(None)` is end of
    /// stream and stays `Ok(None)` on every later call.
    pub fn next_event(&mut self) -> Result<Option<i32>> {
        self.advance(AdvanceMode::Triggered)
    }

    /// Advance to the next simulated event, whether or not it triggered
    /// the array.
    pub fn next_mc_event(&mut self) -> Result<Option<i32>> {
        self.advance(AdvanceMode::McTruth)
    }

    /// Iterate over triggered events. `limit == 0` means unbounded; the
    /// limit counts per iterator, not per stream.
    pub fn events(&mut self, limit: usize) -> EventIter<'_> {
        EventIter {
            file: self,
            mode: AdvanceMode::Triggered,
            limit,
            yielded: 0,
            done: false,
        }
    }

    /// Iterate over all simulated events, same limit semantics as
    /// [`SimtelFile::events`].
    pub fn mc_events(&mut self, limit: usize) -> EventIter<'_> {
        EventIter {
            file: self,
            mode: AdvanceMode::McTruth,
            limit,
            yielded: 0,
            done: false,
        }
    }

    fn advance(&mut self, mode: AdvanceMode) -> Result<Option<i32>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            let (decoded, next_pos) = {
                let bytes = self.source.as_bytes();
                let mut cur = Cursor::with_base(&bytes[self.pos..], self.pos);
                let header = match BlockHeader::read(&mut cur)? {
                    Some(h) => h,
                    None => {
                        self.finished = true;
                        return Ok(None);
                    }
                };
                let payload = cur.take_bytes(header.length as usize)?;
                let base = self.pos + BlockHeader::SIZE;
                (block::decode_block(&header, payload, base), cur.position())
            };
            let block = match decoded {
                Ok(block) => block,
                Err(err @ SimtelError::MalformedBlock(_)) => {
                    // the frame boundary is known from the header, so a
                    // later advance can resume at the next block
                    self.pos = next_pos;
                    return Err(err);
                }
                Err(err) => return Err(err),
            };
            // the block decoded in full, commit it
            self.pos = next_pos;
            if let Some(id) = self.apply(block, mode)? {
                return Ok(Some(id));
            }
        }
    }

    fn apply(&mut self, block: Block, mode: AdvanceMode) -> Result<Option<i32>> {
        match block {
            Block::RunHeader {
                run_number,
                telescopes,
            } => {
                if self.run_config.is_some() {
                    warn!(run_number, "duplicate run header ignored");
                } else {
                    info!(run_number, num_telescopes = telescopes.len(), "run start");
                    self.run_config = Some(RunConfig::new(run_number, telescopes));
                }
            }
            Block::McRunHeader(header) => {
                self.config_block_target(block::MC_RUN_HEADER)?.mc_run_header = Some(header);
            }
            Block::CameraSettings { tel_id, camera } => {
                if self.header_phase {
                    self.config_telescope(tel_id, block::CAMERA_SETTINGS)?.camera = Some(camera);
                } else {
                    warn!(tel_id, "camera settings after the header phase ignored");
                }
            }
            Block::PixelSettings { tel_id, settings } => {
                if self.header_phase {
                    self.config_telescope(tel_id, block::PIXEL_SETTINGS)?
                        .pixel_settings = Some(settings);
                } else {
                    warn!(tel_id, "pixel settings after the header phase ignored");
                }
            }
            Block::TelMonitor { tel_id, pedestal } => {
                // live recalibration, valid at any point in the stream
                debug!(tel_id, "pedestal update");
                self.config_telescope(tel_id, block::TEL_MONITOR)?.pedestal = Some(pedestal);
            }
            Block::LaserCalib {
                tel_id,
                calibration,
            } => {
                debug!(tel_id, "calibration update");
                self.config_telescope(tel_id, block::LASER_CALIB)?.calibration =
                    Some(calibration);
            }
            Block::McShower(shower) => {
                self.enter_event_phase(block::MC_SHOWER)?;
                self.event.mc_shower = Some(shower);
            }
            Block::McEvent(mc) => {
                self.enter_event_phase(block::MC_EVENT)?;
                let id = mc.event_id;
                self.event.commit_mc_event(mc);
                if mode == AdvanceMode::McTruth {
                    return Ok(Some(id));
                }
            }
            Block::McPhotoElectrons { event_id, counts } => {
                self.enter_event_phase(block::MC_PHOTO_ELECTRONS)?;
                debug!(event_id, telescopes = counts.len(), "photo-electron lists");
                for (tel_id, pe) in counts {
                    self.event.mc_pe.insert(tel_id, pe);
                }
            }
            Block::Event(record) => {
                self.enter_event_phase(block::EVENT)?;
                let id = record.event_id;
                let triggered = !record.central.teltrg_list.is_empty();
                self.event.commit_event(record);
                // a record with an empty trigger list is committed but is
                // not a triggered event
                if mode == AdvanceMode::Triggered && triggered {
                    return Ok(Some(id));
                }
            }
            Block::Skipped { .. } => {}
        }
        Ok(None)
    }

    fn enter_event_phase(&mut self, block_type: u16) -> Result<()> {
        if self.run_config.is_none() {
            return Err(SimtelError::MalformedBlock(format!(
                "block type {block_type} before the run header"
            )));
        }
        self.header_phase = false;
        Ok(())
    }

    fn config_block_target(&mut self, block_type: u16) -> Result<&mut RunConfig> {
        self.run_config.as_mut().ok_or_else(|| {
            SimtelError::MalformedBlock(format!("block type {block_type} before the run header"))
        })
    }

    /// Mutable telescope config for an in-stream per-telescope block. An
    /// id the run header never announced makes the stream malformed.
    fn config_telescope(&mut self, tel_id: i32, block_type: u16) -> Result<&mut TelescopeConfig> {
        self.config_block_target(block_type)?
            .telescope_mut(tel_id)
            .map_err(|_| {
                SimtelError::MalformedBlock(format!(
                    "block type {block_type} for unconfigured telescope {tel_id}"
                ))
            })
    }

    // --- run configuration accessors -----------------------------------

    fn config(&self) -> Result<&RunConfig> {
        self.run_config
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("run configuration"))
    }

    fn tel_config(&self, tel_id: i32) -> Result<&TelescopeConfig> {
        self.config()?.telescope(tel_id)
    }

    pub fn run_number(&self) -> Result<i32> {
        Ok(self.config()?.run_number)
    }

    pub fn num_telescope(&self) -> Result<usize> {
        Ok(self.config()?.num_telescopes())
    }

    pub fn telescope_ids(&self) -> Result<Vec<i32>> {
        Ok(self.config()?.telescope_ids())
    }

    pub fn telescope_position(&self, tel_id: i32) -> Result<[f64; 3]> {
        Ok(self.tel_config(tel_id)?.position)
    }

    pub fn mirror_area(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tel_config(tel_id)?.camera()?.mirror_area)
    }

    pub fn mirror_number(&self, tel_id: i32) -> Result<usize> {
        Ok(self.tel_config(tel_id)?.camera()?.num_mirrors)
    }

    pub fn optical_foclen(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tel_config(tel_id)?.camera()?.focal_length)
    }

    pub fn camera_rotation_angle(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tel_config(tel_id)?.camera()?.cam_rot)
    }

    pub fn num_pixels(&self, tel_id: i32) -> Result<usize> {
        Ok(self.tel_config(tel_id)?.camera()?.num_pixels)
    }

    /// Pixel centre coordinates in the camera plane, (x, y) [m].
    pub fn pixel_position(&self, tel_id: i32) -> Result<(Array1<f64>, Array1<f64>)> {
        let cam = self.tel_config(tel_id)?.camera()?;
        Ok((cam.xpix.clone(), cam.ypix.clone()))
    }

    pub fn pixel_shape(&self, tel_id: i32) -> Result<Array1<f64>> {
        Ok(self.tel_config(tel_id)?.camera()?.pixel_shape.clone())
    }

    pub fn pixel_area(&self, tel_id: i32) -> Result<Array1<f64>> {
        Ok(self.tel_config(tel_id)?.camera()?.pixel_area.clone())
    }

    /// Configured gain channels per pixel, 1 or 2.
    pub fn num_gains(&self, tel_id: i32) -> Result<usize> {
        Ok(self.tel_config(tel_id)?.pixel_settings()?.num_gains)
    }

    /// ADC-to-photo-electron conversion table, channel x pixel. Reflects
    /// the most recent calibration block seen in the stream.
    pub fn calibration(&self, tel_id: i32) -> Result<Array2<f64>> {
        self.tel_config(tel_id)?
            .calibration
            .clone()
            .ok_or(SimtelError::DataNotAvailable("calibration"))
    }

    /// Average pedestal table, channel x pixel. Reflects the most recent
    /// monitor block seen in the stream.
    pub fn pedestal(&self, tel_id: i32) -> Result<Array2<f64>> {
        self.tel_config(tel_id)?
            .pedestal
            .clone()
            .ok_or(SimtelError::DataNotAvailable("pedestal"))
    }

    pub fn time_slice(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tel_config(tel_id)?.pixel_settings()?.time_slice)
    }

    pub fn ref_step(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tel_config(tel_id)?.pixel_settings()?.ref_step)
    }

    pub fn nrefshape(&self, tel_id: i32) -> Result<usize> {
        Ok(self.tel_config(tel_id)?.pixel_settings()?.nrefshape())
    }

    pub fn lrefshape(&self, tel_id: i32) -> Result<usize> {
        Ok(self.tel_config(tel_id)?.pixel_settings()?.lrefshape())
    }

    /// One sample of a reference pulse shape. Out-of-range shape or
    /// sample indices are absent data, not index errors, since the shape
    /// count is not tied to the gain-channel count.
    pub fn ref_shape(&self, tel_id: i32, shape: usize, sample: usize) -> Result<f64> {
        let ps = self.tel_config(tel_id)?.pixel_settings()?;
        if shape >= ps.nrefshape() || sample >= ps.lrefshape() {
            return Err(SimtelError::DataNotAvailable("reference pulse shape"));
        }
        Ok(ps.refshape[[shape, sample]])
    }

    pub fn ref_shapes(&self, tel_id: i32) -> Result<Array2<f64>> {
        Ok(self.tel_config(tel_id)?.pixel_settings()?.refshape.clone())
    }

    // --- MC run header accessors ---------------------------------------

    fn mc_header(&self) -> Result<&McRunHeader> {
        self.config()?
            .mc_run_header
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("MC run header"))
    }

    pub fn mc_obsheight(&self) -> Result<f64> {
        Ok(self.mc_header()?.obsheight)
    }

    pub fn mc_num_showers(&self) -> Result<i32> {
        Ok(self.mc_header()?.num_showers)
    }

    pub fn mc_e_range(&self) -> Result<(f64, f64)> {
        let h = self.mc_header()?;
        Ok((h.e_range_min, h.e_range_max))
    }

    pub fn spectral_index(&self) -> Result<f64> {
        Ok(self.mc_header()?.spectral_index)
    }

    pub fn mc_viewcone(&self) -> Result<(f64, f64)> {
        let h = self.mc_header()?;
        Ok((h.viewcone_min, h.viewcone_max))
    }

    pub fn mc_core_range(&self) -> Result<(f64, f64)> {
        let h = self.mc_header()?;
        Ok((h.core_range_x, h.core_range_y))
    }

    pub fn mc_diffuse(&self) -> Result<i32> {
        Ok(self.mc_header()?.diffuse)
    }

    pub fn mc_injection_height(&self) -> Result<f64> {
        Ok(self.mc_header()?.injection_height)
    }

    /// Nominal array pointing, (azimuth, altitude) [rad].
    pub fn mc_run_array_direction(&self) -> Result<[f64; 2]> {
        Ok(self.mc_header()?.direction)
    }

    // --- current event accessors ---------------------------------------

    fn central(&self) -> Result<&CentralTrigger> {
        self.event
            .central
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("central trigger"))
    }

    /// Telescope data for the current event. The id is validated against
    /// the run configuration first, so an unknown id is an index error
    /// even when the telescope simply has no data this event.
    fn tel_event(&self, tel_id: i32) -> Result<&TelescopeEvent> {
        self.tel_config(tel_id)?;
        self.event
            .telescope(tel_id)
            .ok_or(SimtelError::DataNotAvailable("telescope event data"))
    }

    fn adc(&self, tel_id: i32) -> Result<&AdcData> {
        self.tel_event(tel_id)?
            .adc
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("ADC data"))
    }

    fn timing(&self, tel_id: i32) -> Result<&PixelTiming> {
        self.tel_event(tel_id)?
            .timing
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("pixel timing"))
    }

    pub fn event_id(&self) -> Result<i32> {
        self.event
            .event_id
            .ok_or(SimtelError::DataNotAvailable("event id"))
    }

    pub fn global_event_count(&self) -> Result<i32> {
        Ok(self.central()?.glob_count)
    }

    /// Number of telescopes with data in the current event. Zero when the
    /// current record is an untriggered MC event.
    pub fn num_teldata(&self) -> Result<usize> {
        self.config()?;
        Ok(self
            .event
            .central
            .as_ref()
            .map_or(0, |c| c.teldata_list.len()))
    }

    pub fn teldata_list(&self) -> Result<Vec<i32>> {
        self.config()?;
        Ok(self
            .event
            .central
            .as_ref()
            .map_or_else(Vec::new, |c| c.teldata_list.clone()))
    }

    pub fn num_tel_trig(&self) -> Result<usize> {
        Ok(self.central()?.teltrg_list.len())
    }

    pub fn central_teltrg_list(&self) -> Result<Vec<i32>> {
        Ok(self.central()?.teltrg_list.clone())
    }

    /// Relative trigger time per triggered telescope [ns], same order as
    /// [`SimtelFile::central_teltrg_list`].
    pub fn central_teltrg_time(&self) -> Result<Vec<f32>> {
        Ok(self.central()?.teltrg_time.clone())
    }

    /// Central trigger GPS time as (seconds, nanoseconds).
    pub fn central_gps_time(&self) -> Result<(i64, i64)> {
        let c = self.central()?;
        Ok((c.gps_seconds, c.gps_nanoseconds))
    }

    /// Telescope event GPS time as (seconds, nanoseconds).
    pub fn tel_gps_time(&self, tel_id: i32) -> Result<(i64, i64)> {
        let t = self.tel_event(tel_id)?;
        Ok((t.gps_seconds, t.gps_nanoseconds))
    }

    /// Gain channels observed in the current event's readout, which may
    /// differ from the configured count under data reduction.
    pub fn num_channel(&self, tel_id: i32) -> Result<usize> {
        Ok(self.adc(tel_id)?.num_gains)
    }

    /// Samples per trace in the current event; zero when only sums were
    /// recorded.
    pub fn num_samples(&self, tel_id: i32) -> Result<usize> {
        Ok(self.adc(tel_id)?.num_samples())
    }

    pub fn zero_sup_mode(&self, tel_id: i32) -> Result<i32> {
        Ok(self.tel_event(tel_id)?.zero_sup_mode)
    }

    pub fn data_red_mode(&self, tel_id: i32) -> Result<i32> {
        Ok(self.tel_event(tel_id)?.data_red_mode)
    }

    /// Per-pixel significance flags for the current event.
    pub fn significant(&self, tel_id: i32) -> Result<Array1<u8>> {
        Ok(self.tel_event(tel_id)?.significant.clone())
    }

    /// ADC-known flags for one channel and pixel of the current event.
    pub fn adc_known(&self, tel_id: i32, channel: usize, pixel: usize) -> Result<u8> {
        self.check_channel(tel_id, channel)?;
        self.check_pixel(tel_id, pixel)?;
        let adc = self.adc(tel_id)?;
        if channel >= adc.num_gains || pixel >= adc.num_pixels {
            return Err(SimtelError::DataNotAvailable("ADC known flag"));
        }
        Ok(adc.adc_known[[channel, pixel]])
    }

    /// Raw ADC traces, channel x pixel x sample. Explicitly empty in the
    /// sample axis when the event carried sums only.
    pub fn adc_sample(&self, tel_id: i32) -> Result<Array3<u16>> {
        let adc = self.adc(tel_id)?;
        Ok(adc
            .samples
            .clone()
            .unwrap_or_else(|| Array3::zeros((adc.num_gains, adc.num_pixels, 0))))
    }

    /// Raw ADC sums, channel x pixel.
    pub fn adc_sum(&self, tel_id: i32) -> Result<Array2<u32>> {
        self.adc(tel_id)?
            .sums
            .clone()
            .ok_or(SimtelError::DataNotAvailable("ADC sums"))
    }

    pub fn num_trig_pixels(&self, tel_id: i32) -> Result<usize> {
        Ok(self.tel_event(tel_id)?.trig_pixels.len())
    }

    /// Indices of the pixels in the camera trigger for the current event.
    pub fn trig_pixels(&self, tel_id: i32) -> Result<Vec<i32>> {
        Ok(self.tel_event(tel_id)?.trig_pixels.clone())
    }

    pub fn pixel_timing_threshold(&self, tel_id: i32) -> Result<i32> {
        Ok(self.timing(tel_id)?.threshold)
    }

    pub fn pixel_timing_peak_global(&self, tel_id: i32) -> Result<f32> {
        Ok(self.timing(tel_id)?.peak_global)
    }

    pub fn pixel_timing_num_times_types(&self, tel_id: i32) -> Result<usize> {
        Ok(self.timing(tel_id)?.num_types())
    }

    /// Timing analysis values, pixel x time type.
    pub fn pixel_timing_timval(&self, tel_id: i32) -> Result<Array2<f32>> {
        Ok(self.timing(tel_id)?.timval.clone())
    }

    fn tracking(&self, tel_id: i32) -> Result<&TrackingData> {
        self.tel_config(tel_id)?;
        self.event
            .tracking
            .get(&tel_id)
            .ok_or(SimtelError::DataNotAvailable("tracking data"))
    }

    /// Drive-reported azimuth during the current event [rad].
    pub fn azimuth_raw(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tracking(tel_id)?.azimuth_raw)
    }

    /// Azimuth with the pointing model applied [rad].
    pub fn azimuth_cor(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tracking(tel_id)?.azimuth_cor)
    }

    pub fn altitude_raw(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tracking(tel_id)?.altitude_raw)
    }

    pub fn altitude_cor(&self, tel_id: i32) -> Result<f64> {
        Ok(self.tracking(tel_id)?.altitude_cor)
    }

    fn check_channel(&self, tel_id: i32, channel: usize) -> Result<()> {
        let num_gains = self.num_gains(tel_id)?;
        if channel >= num_gains {
            return Err(SimtelError::InvalidChannelIndex {
                tel_id,
                channel,
                num_gains,
            });
        }
        Ok(())
    }

    fn check_pixel(&self, tel_id: i32, pixel: usize) -> Result<()> {
        let num_pixels = self.num_pixels(tel_id)?;
        if pixel >= num_pixels {
            return Err(SimtelError::InvalidPixelIndex {
                tel_id,
                pixel,
                num_pixels,
            });
        }
        Ok(())
    }

    // --- MC truth accessors --------------------------------------------

    fn mc_event(&self) -> Result<&McEvent> {
        self.event
            .mc_event
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("MC event"))
    }

    fn mc_shower(&self) -> Result<&McShower> {
        self.event
            .mc_shower
            .as_ref()
            .ok_or(SimtelError::DataNotAvailable("MC shower"))
    }

    /// Core position of the simulated shower w.r.t. the array reference
    /// point [m], x -> North.
    pub fn mc_event_xcore(&self) -> Result<f64> {
        Ok(self.mc_event()?.xcore)
    }

    /// y -> West counterpart of [`SimtelFile::mc_event_xcore`].
    pub fn mc_event_ycore(&self) -> Result<f64> {
        Ok(self.mc_event()?.ycore)
    }

    pub fn mc_event_offset_fov(&self) -> Result<[f64; 2]> {
        Ok(self.mc_event()?.offset_fov)
    }

    /// Primary energy [TeV].
    pub fn mc_shower_energy(&self) -> Result<f64> {
        Ok(self.mc_shower()?.energy)
    }

    pub fn mc_shower_azimuth(&self) -> Result<f64> {
        Ok(self.mc_shower()?.azimuth)
    }

    pub fn mc_shower_altitude(&self) -> Result<f64> {
        Ok(self.mc_shower()?.altitude)
    }

    pub fn mc_shower_primary_id(&self) -> Result<i32> {
        Ok(self.mc_shower()?.primary_id)
    }

    pub fn mc_shower_h_first_int(&self) -> Result<f64> {
        Ok(self.mc_shower()?.h_first_int)
    }

    pub fn mc_shower_xmax(&self) -> Result<f64> {
        Ok(self.mc_shower()?.xmax)
    }

    /// True photo-electron count per pixel for the current MC event.
    pub fn mc_number_photon_electron(&self, tel_id: i32) -> Result<Array1<i32>> {
        self.tel_config(tel_id)?;
        self.event
            .mc_pe
            .get(&tel_id)
            .cloned()
            .ok_or(SimtelError::DataNotAvailable("photo-electron counts"))
    }
}

/// Streaming iterator over event ids; see [`SimtelFile::events`].
///
/// An advance error is yielded once and ends the iteration.
pub struct EventIter<'a> {
    file: &'a mut SimtelFile,
    mode: AdvanceMode,
    limit: usize,
    yielded: usize,
    done: bool,
}

impl Iterator for EventIter<'_> {
    type Item = Result<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || (self.limit != 0 && self.yielded == self.limit) {
            return None;
        }
        match self.file.advance(self.mode) {
            Ok(Some(id)) => {
                self.yielded += 1;
                Some(Ok(id))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
