//! Current-event model.
//!
//! A single mutable instance lives for the duration of an open stream and is
//! replaced piecewise as records stream in. Fields a record did not populate
//! are `None`, never a zero that could pass for real data.

use std::collections::HashMap;

use bon::Builder;
use ndarray::{Array1, Array2, Array3};

/// Central trigger record of one array event.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct CentralTrigger {
    /// Global count for the system trigger.
    pub glob_count: i32,
    pub gps_seconds: i64,
    pub gps_nanoseconds: i64,
    /// IDs of the telescopes whose camera trigger fired.
    pub teltrg_list: Vec<i32>,
    /// Relative trigger time per triggered telescope [ns].
    pub teltrg_time: Vec<f32>,
    /// IDs of the telescopes that carried a data record.
    pub teldata_list: Vec<i32>,
}

/// Raw ADC readings for one telescope in one event.
#[derive(Debug, Clone, PartialEq)]
pub struct AdcData {
    pub num_gains: usize,
    pub num_pixels: usize,
    /// ADC sums per gain channel and pixel.
    pub sums: Option<Array2<u32>>,
    /// ADC samples per gain channel, pixel and time slice.
    pub samples: Option<Array3<u16>>,
    /// Per channel and pixel: bit 0 = sum recorded, bit 1 = samples
    /// recorded, bit 2 = ADC was in saturation.
    pub adc_known: Array2<u8>,
}

impl AdcData {
    pub fn num_samples(&self) -> usize {
        self.samples.as_ref().map_or(0, |s| s.dim().2)
    }
}

/// Pixel-timing analysis results for one telescope in one event.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PixelTiming {
    /// Minimum base-to-peak raw amplitude difference applied in pixel
    /// selection; negative values are significance-relative.
    pub threshold: i32,
    /// Camera-wide mean peak position [time slices].
    pub peak_global: f32,
    /// Time values per pixel and time type.
    pub timval: Array2<f32>,
}

impl PixelTiming {
    pub fn num_types(&self) -> usize {
        self.timval.ncols()
    }
}

/// Everything one telescope recorded for the current event.
#[derive(Debug)]
pub struct TelescopeEvent {
    pub tel_id: i32,
    pub gps_seconds: i64,
    pub gps_nanoseconds: i64,
    /// Zero-suppression mode desired or used.
    pub zero_sup_mode: i32,
    /// Data-reduction mode desired or used.
    pub data_red_mode: i32,
    pub trig_pixels: Vec<i32>,
    /// Per pixel: bit 0 = sum significant, bit 1 = samples significant.
    pub significant: Array1<u8>,
    pub adc: Option<AdcData>,
    pub timing: Option<PixelTiming>,
}

/// Where one telescope was pointing during the event.
///
/// Raw values are the drive reports; corrected values have the pointing
/// model applied.
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct TrackingData {
    /// Raw azimuth (N -> E) [rad].
    pub azimuth_raw: f64,
    /// Raw altitude [rad].
    pub altitude_raw: f64,
    pub azimuth_cor: f64,
    pub altitude_cor: f64,
}

/// Simulated-shower truth, valid for every use of the same shower.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct McShower {
    pub shower_id: i32,
    /// Primary id: 0 gamma, 1 e-, 2 mu-, 100*A+Z for nuclei.
    pub primary_id: i32,
    /// Primary energy [TeV].
    pub energy: f64,
    /// Azimuth (N -> E) [rad].
    pub azimuth: f64,
    /// Altitude [rad].
    pub altitude: f64,
    /// Height of first interaction a.s.l. [m].
    pub h_first_int: f64,
    /// Depth of shower maximum [g/cm^2].
    pub xmax: f64,
}

/// Per-use simulated-event truth.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct McEvent {
    pub event_id: i32,
    pub shower_id: i32,
    /// Core position w.r.t. the array reference point [m], x -> N, y -> W.
    pub xcore: f64,
    pub ycore: f64,
    /// Offset of the pointing direction in the camera f.o.v. [rad].
    pub offset_fov: [f64; 2],
}

/// A fully decoded array-event record, committed in one piece.
#[derive(Debug)]
pub struct EventRecord {
    pub event_id: i32,
    pub central: CentralTrigger,
    pub telescopes: Vec<TelescopeEvent>,
    pub tracking: Vec<(i32, TrackingData)>,
}

/// The current event: one mutable instance per open stream.
#[derive(Debug, Default)]
pub struct CurrentEvent {
    pub event_id: Option<i32>,
    pub central: Option<CentralTrigger>,
    pub telescopes: Vec<TelescopeEvent>,
    /// Telescope pointing during the current event, per telescope id.
    pub tracking: HashMap<i32, TrackingData>,
    pub mc_shower: Option<McShower>,
    pub mc_event: Option<McEvent>,
    /// Photo-electron counts per telescope id, for the current MC event.
    pub mc_pe: HashMap<i32, Array1<i32>>,
}

impl CurrentEvent {
    /// Install a freshly decoded array event. The shower/MC truth read
    /// before the event record stays valid for it.
    pub fn commit_event(&mut self, record: EventRecord) {
        self.event_id = Some(record.event_id);
        self.central = Some(record.central);
        self.telescopes = record.telescopes;
        self.tracking = record.tracking.into_iter().collect();
    }

    /// Install a new MC event. Telescope readings belong to the previous
    /// record type and are dropped; the caller sees zero telescopes with
    /// data until an array event is decoded.
    pub fn commit_mc_event(&mut self, mc: McEvent) {
        self.event_id = Some(mc.event_id);
        self.mc_event = Some(mc);
        self.central = None;
        self.telescopes.clear();
        self.tracking.clear();
        self.mc_pe.clear();
    }

    pub fn telescope(&self, tel_id: i32) -> Option<&TelescopeEvent> {
        self.telescopes.iter().find(|t| t.tel_id == tel_id)
    }
}
