//! Synthetic stream construction for the integration tests.
//!
//! Builds a complete container byte stream with the layout of a small
//! gamma-ray simulation run: run header for a 126-telescope array, full
//! camera and readout configuration for telescopes 38 and 47, and one
//! simulated shower used twice, once untriggered and once as the
//! triggered array event 408.

#![allow(dead_code)]

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

pub const RUN_NUMBER: i32 = 31964;
pub const NUM_TELESCOPES: usize = 126;
pub const EVENT_ID: i32 = 408;
pub const MC_ONLY_EVENT_ID: i32 = 100;
pub const SHOWER_ID: i32 = 4080;

pub const NPIX_38: usize = 1855;
pub const NPIX_47: usize = 2048;
pub const NUM_SAMPLES_47: usize = 25;

pub const GPS_SECONDS: i64 = 1_408_549_473;
pub const GPS_NANOSECONDS: i64 = 35_597_000;

pub const MC_ENERGY: f64 = 0.3155;
pub const MC_AZIMUTH: f64 = 6.265;
pub const MC_ALTITUDE: f64 = 1.2398;
pub const MC_H_FIRST_INT: f64 = 26_699.0;
pub const MC_XMAX: f64 = 276.3;
pub const MC_XCORE_UNTRIGGERED: f64 = -591.6336669921875;
pub const MC_XCORE_TRIGGERED: f64 = 1050.278;
pub const MC_YCORE_TRIGGERED: f64 = -24.585;
pub const ARRAY_DIRECTION: [f64; 2] = [0.0, 1.2217305];
pub const AZ_RAW_38: f64 = 6.2649;
pub const ALT_RAW_38: f64 = 1.2401;
pub const AZ_RAW_47: f64 = 6.2652;
pub const ALT_RAW_47: f64 = 1.2398;
/// Offset added to a raw pointing value by the fixture's pointing model.
pub const POINTING_COR: f64 = 0.0005;

pub fn uvarint(out: &mut Vec<u8>, mut v: u64) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

pub fn varint(out: &mut Vec<u8>, v: i64) {
    uvarint(out, ((v << 1) ^ (v >> 63)) as u64);
}

pub fn f64s(out: &mut Vec<u8>, values: impl IntoIterator<Item = f64>) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// One framed block: `type | version | ident | length | payload`.
pub fn frame(block_type: u16, ident: i32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + payload.len());
    out.extend_from_slice(&block_type.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&ident.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[derive(Default)]
pub struct StreamBuilder {
    buf: Vec<u8>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, block_type: u16, ident: i32, payload: &[u8]) -> Self {
        self.buf.extend_from_slice(&frame(block_type, ident, payload));
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

pub fn telescope_position(tel_id: i32) -> [f64; 3] {
    [f64::from(tel_id) * 10.0, -f64::from(tel_id), 5.0]
}

pub fn run_header_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&RUN_NUMBER.to_le_bytes());
    uvarint(&mut p, NUM_TELESCOPES as u64);
    for tel_id in 1..=NUM_TELESCOPES as i32 {
        uvarint(&mut p, tel_id as u64);
        f64s(&mut p, telescope_position(tel_id));
    }
    p
}

pub fn mc_run_header_payload() -> Vec<u8> {
    let mut p = Vec::new();
    f64s(&mut p, [1800.0]);
    p.extend_from_slice(&1000i32.to_le_bytes());
    f64s(&mut p, [0.003, 330.0, -2.0, 0.0, 0.0, 1500.0, 1500.0]);
    p.extend_from_slice(&0i32.to_le_bytes());
    f64s(&mut p, [5000.0]);
    f64s(&mut p, ARRAY_DIRECTION);
    p
}

pub struct CameraSpec {
    pub num_pixels: usize,
    pub focal_length: f64,
    pub mirror_area: f64,
    pub num_mirrors: usize,
    pub cam_rot: f64,
    pub pixel_pitch: f64,
    pub pixel_shape: f64,
    pub pixel_area: f64,
}

pub fn camera_38() -> CameraSpec {
    CameraSpec {
        num_pixels: NPIX_38,
        focal_length: 16.0,
        mirror_area: 103.877,
        num_mirrors: 964,
        cam_rot: 0.0,
        pixel_pitch: 0.005,
        pixel_shape: 1.0,
        pixel_area: 0.0003,
    }
}

pub fn camera_47() -> CameraSpec {
    CameraSpec {
        num_pixels: NPIX_47,
        focal_length: 28.0,
        mirror_area: 386.343,
        num_mirrors: 198,
        cam_rot: 0.1,
        pixel_pitch: 0.01,
        pixel_shape: 2.0,
        pixel_area: 0.00049,
    }
}

pub fn camera_settings_payload(spec: &CameraSpec) -> Vec<u8> {
    let mut p = Vec::new();
    uvarint(&mut p, spec.num_pixels as u64);
    f64s(&mut p, [spec.focal_length, spec.mirror_area]);
    uvarint(&mut p, spec.num_mirrors as u64);
    f64s(&mut p, [spec.cam_rot]);
    f64s(&mut p, (0..spec.num_pixels).map(|i| spec.pixel_pitch * i as f64));
    f64s(&mut p, (0..spec.num_pixels).map(|i| -spec.pixel_pitch * i as f64));
    f64s(&mut p, std::iter::repeat_n(spec.pixel_shape, spec.num_pixels));
    f64s(&mut p, std::iter::repeat_n(spec.pixel_area, spec.num_pixels));
    p
}

pub fn pixel_settings_payload(
    time_slice: f64,
    ref_step: f64,
    lrefshape: usize,
    sample_step: f64,
) -> Vec<u8> {
    let mut p = Vec::new();
    uvarint(&mut p, 1); // single gain channel
    f64s(&mut p, [time_slice, ref_step]);
    uvarint(&mut p, 1);
    uvarint(&mut p, lrefshape as u64);
    f64s(&mut p, (0..lrefshape).map(|i| sample_step * i as f64));
    p
}

pub fn gain_pixel_payload(num_pixels: usize, value: f64) -> Vec<u8> {
    let mut p = Vec::new();
    uvarint(&mut p, 1);
    uvarint(&mut p, num_pixels as u64);
    f64s(&mut p, std::iter::repeat_n(value, num_pixels));
    p
}

pub fn mc_shower_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&0i32.to_le_bytes()); // gamma primary
    f64s(&mut p, [MC_ENERGY, MC_AZIMUTH, MC_ALTITUDE, MC_H_FIRST_INT, MC_XMAX]);
    p
}

pub fn mc_event_payload(xcore: f64, ycore: f64) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&SHOWER_ID.to_le_bytes());
    f64s(&mut p, [xcore, ycore, 0.0, 0.0]);
    p
}

pub fn mc_photo_electrons_payload() -> Vec<u8> {
    let mut p = Vec::new();
    uvarint(&mut p, 1);
    uvarint(&mut p, 47);
    uvarint(&mut p, NPIX_47 as u64);
    for pix in 0..NPIX_47 {
        varint(&mut p, if pix == 10 { 5 } else { 0 });
    }
    p
}

pub fn central_trigger_payload() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&EVENT_ID.to_le_bytes()); // global event count
    p.extend_from_slice(&GPS_SECONDS.to_le_bytes());
    p.extend_from_slice(&GPS_NANOSECONDS.to_le_bytes());
    uvarint(&mut p, 2);
    uvarint(&mut p, 38);
    p.extend_from_slice(&0.0f32.to_le_bytes());
    uvarint(&mut p, 47);
    p.extend_from_slice(&5.0f32.to_le_bytes());
    uvarint(&mut p, 2);
    uvarint(&mut p, 38);
    uvarint(&mut p, 47);
    p
}

fn televent_fixed_part(gps_nanoseconds: i64, trig_pixels: &[u64], num_pixels: usize) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&GPS_SECONDS.to_le_bytes());
    p.extend_from_slice(&gps_nanoseconds.to_le_bytes());
    p.extend_from_slice(&0i32.to_le_bytes()); // zero suppression off
    p.extend_from_slice(&0i32.to_le_bytes()); // data reduction off
    uvarint(&mut p, trig_pixels.len() as u64);
    for &pix in trig_pixels {
        uvarint(&mut p, pix);
    }
    uvarint(&mut p, num_pixels as u64);
    p.extend(std::iter::repeat_n(1u8, num_pixels)); // all pixels significant
    p
}

pub fn adc_sum_47(pixel: usize) -> u32 {
    3000 + pixel as u32
}

pub fn adc_sum_38(pixel: usize) -> u32 {
    2964 + (pixel as u32 % 7)
}

pub fn adc_sample_47(pixel: usize, sample: usize) -> u16 {
    ((pixel + sample) % 256) as u16
}

fn adc_sums_payload(num_pixels: usize, sum: impl Fn(usize) -> u32) -> Vec<u8> {
    let mut p = Vec::new();
    uvarint(&mut p, 1);
    uvarint(&mut p, num_pixels as u64);
    for pix in 0..num_pixels {
        p.extend_from_slice(&sum(pix).to_le_bytes());
    }
    p.extend(std::iter::repeat_n(1u8, num_pixels)); // every sum recorded
    p
}

fn adc_samples_payload_47() -> Vec<u8> {
    let mut p = Vec::new();
    uvarint(&mut p, 1);
    uvarint(&mut p, NPIX_47 as u64);
    uvarint(&mut p, NUM_SAMPLES_47 as u64);
    for pix in 0..NPIX_47 {
        for sample in 0..NUM_SAMPLES_47 {
            p.extend_from_slice(&adc_sample_47(pix, sample).to_le_bytes());
        }
    }
    p
}

pub fn timval_47(pixel: usize, time_type: usize) -> f32 {
    time_type as f32 + 0.5 + pixel as f32 * 0.001
}

fn pixel_timing_payload_47() -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&(-6i32).to_le_bytes());
    p.extend_from_slice(&11.16f32.to_le_bytes());
    uvarint(&mut p, 7);
    uvarint(&mut p, NPIX_47 as u64);
    for pix in 0..NPIX_47 {
        for t in 0..7 {
            p.extend_from_slice(&timval_47(pix, t).to_le_bytes());
        }
    }
    p
}

pub fn tracking_payload(azimuth_raw: f64, altitude_raw: f64) -> Vec<u8> {
    let mut p = Vec::new();
    f64s(&mut p, [
        azimuth_raw,
        altitude_raw,
        azimuth_raw + POINTING_COR,
        altitude_raw + POINTING_COR,
    ]);
    p
}

pub fn event_payload() -> Vec<u8> {
    let mut tel_38 = televent_fixed_part(35_599_000, &[10, 12, 208], NPIX_38);
    tel_38.extend_from_slice(&frame(ADC_SUMS, 38, &adc_sums_payload(NPIX_38, adc_sum_38)));

    let mut tel_47 = televent_fixed_part(35_601_000, &[5, 1000], NPIX_47);
    tel_47.extend_from_slice(&frame(ADC_SUMS, 47, &adc_sums_payload(NPIX_47, adc_sum_47)));
    tel_47.extend_from_slice(&frame(ADC_SAMPLES, 47, &adc_samples_payload_47()));
    tel_47.extend_from_slice(&frame(PIXEL_TIMING, 47, &pixel_timing_payload_47()));

    let mut body = frame(CENTRAL_TRIGGER, EVENT_ID, &central_trigger_payload());
    body.extend_from_slice(&frame(TELESCOPE_EVENT, 38, &tel_38));
    body.extend_from_slice(&frame(TELESCOPE_EVENT, 47, &tel_47));
    body.extend_from_slice(&frame(
        TRACKING_DATA,
        38,
        &tracking_payload(AZ_RAW_38, ALT_RAW_38),
    ));
    body.extend_from_slice(&frame(
        TRACKING_DATA,
        47,
        &tracking_payload(AZ_RAW_47, ALT_RAW_47),
    ));
    body
}

/// The full golden stream: configuration, an untriggered shower use, then
/// triggered array event 408.
pub fn gamma_fixture() -> Vec<u8> {
    let camera_38 = camera_38();
    let camera_47 = camera_47();
    StreamBuilder::new()
        .block(RUN_HEADER, RUN_NUMBER, &run_header_payload())
        .block(MC_RUN_HEADER, RUN_NUMBER, &mc_run_header_payload())
        .block(CAMERA_SETTINGS, 38, &camera_settings_payload(&camera_38))
        .block(CAMERA_SETTINGS, 47, &camera_settings_payload(&camera_47))
        .block(PIXEL_SETTINGS, 38, &pixel_settings_payload(1.0, 0.2, 8, 0.25))
        .block(PIXEL_SETTINGS, 47, &pixel_settings_payload(2.0, 0.3003, 10, 0.1))
        .block(TEL_MONITOR, 38, &gain_pixel_payload(NPIX_38, 2929.0))
        .block(TEL_MONITOR, 47, &gain_pixel_payload(NPIX_47, 2964.5))
        .block(LASER_CALIB, 38, &gain_pixel_payload(NPIX_38, 0.0173))
        .block(LASER_CALIB, 47, &gain_pixel_payload(NPIX_47, 0.02125))
        .block(MC_SHOWER, SHOWER_ID, &mc_shower_payload())
        .block(
            MC_EVENT,
            MC_ONLY_EVENT_ID,
            &mc_event_payload(MC_XCORE_UNTRIGGERED, 64.90175),
        )
        .block(
            MC_EVENT,
            EVENT_ID,
            &mc_event_payload(MC_XCORE_TRIGGERED, MC_YCORE_TRIGGERED),
        )
        .block(MC_PHOTO_ELECTRONS, EVENT_ID, &mc_photo_electrons_payload())
        .block(EVENT, EVENT_ID, &event_payload())
        .finish()
}
