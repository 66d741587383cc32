//! Decoders for event-family blocks: MC truth, photo-electron lists and
//! the nested triggered-event container.

use ndarray::{Array1, Array2, Array3};

use crate::errors::{Result, SimtelError};
use crate::parser::block::{
    self, Block, BlockHeader, ADC_SAMPLES, ADC_SUMS, CENTRAL_TRIGGER, PIXEL_TIMING,
    TELESCOPE_EVENT, TRACKING_DATA,
};
use crate::parser::cursor::{Cursor, table_elements};
use crate::types::{
    AdcData, CentralTrigger, EventRecord, McEvent, McShower, PixelTiming, TelescopeEvent,
    TrackingData,
};

pub(crate) fn mc_shower(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    let primary_id = cur.read_i32()?;
    let energy = cur.read_f64()?;
    let azimuth = cur.read_f64()?;
    let altitude = cur.read_f64()?;
    let h_first_int = cur.read_f64()?;
    let xmax = cur.read_f64()?;
    Ok(Block::McShower(
        McShower::builder()
            .shower_id(ident)
            .primary_id(primary_id)
            .energy(energy)
            .azimuth(azimuth)
            .altitude(altitude)
            .h_first_int(h_first_int)
            .xmax(xmax)
            .build(),
    ))
}

pub(crate) fn mc_event(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    let shower_id = cur.read_i32()?;
    let xcore = cur.read_f64()?;
    let ycore = cur.read_f64()?;
    let off_x = cur.read_f64()?;
    let off_y = cur.read_f64()?;
    Ok(Block::McEvent(
        McEvent::builder()
            .event_id(ident)
            .shower_id(shower_id)
            .xcore(xcore)
            .ycore(ycore)
            .offset_fov([off_x, off_y])
            .build(),
    ))
}

/// True photo-electron counts per pixel, one list per telescope that saw
/// any light. Counts are zigzag varints since simulations can encode
/// sentinel negatives.
pub(crate) fn mc_photo_electrons(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    let ntel = cur.read_count()?;
    let mut counts = Vec::with_capacity(ntel);
    for _ in 0..ntel {
        let raw = cur.read_uvarint()?;
        let tel_id = i32::try_from(raw)
            .map_err(|_| SimtelError::MalformedBlock(format!("telescope id {raw} out of range")))?;
        let num_pixels = cur.read_count()?;
        let mut pe = Vec::with_capacity(num_pixels);
        for _ in 0..num_pixels {
            let v = cur.read_varint()?;
            let v = i32::try_from(v).map_err(|_| {
                SimtelError::MalformedBlock(format!("photo-electron count {v} out of range"))
            })?;
            pe.push(v);
        }
        counts.push((tel_id, Array1::from_vec(pe)));
    }
    Ok(Block::McPhotoElectrons {
        event_id: ident,
        counts,
    })
}

fn central_trigger(cur: &mut Cursor<'_>) -> Result<CentralTrigger> {
    let glob_count = cur.read_i32()?;
    let gps_seconds = cur.read_i64()?;
    let gps_nanoseconds = cur.read_i64()?;
    let nteltrg = cur.read_count()?;
    let mut teltrg_list = Vec::with_capacity(nteltrg);
    let mut teltrg_time = Vec::with_capacity(nteltrg);
    for _ in 0..nteltrg {
        teltrg_list.push(read_tel_id(cur)?);
        teltrg_time.push(cur.read_f32()?);
    }
    let nteldata = cur.read_count()?;
    let mut teldata_list = Vec::with_capacity(nteldata);
    for _ in 0..nteldata {
        teldata_list.push(read_tel_id(cur)?);
    }
    Ok(CentralTrigger::builder()
        .glob_count(glob_count)
        .gps_seconds(gps_seconds)
        .gps_nanoseconds(gps_nanoseconds)
        .teltrg_list(teltrg_list)
        .teltrg_time(teltrg_time)
        .teldata_list(teldata_list)
        .build())
}

fn read_tel_id(cur: &mut Cursor<'_>) -> Result<i32> {
    let raw = cur.read_uvarint()?;
    i32::try_from(raw)
        .map_err(|_| SimtelError::MalformedBlock(format!("telescope id {raw} out of range")))
}

fn adc_sums(cur: &mut Cursor<'_>, adc: &mut Option<AdcData>) -> Result<()> {
    let num_gains = cur.read_count()?;
    let num_pixels = cur.read_count()?;
    let n = table_elements(&[num_gains, num_pixels])?;
    let sums = Array2::from_shape_vec((num_gains, num_pixels), cur.read_u32_vec(n)?)
        .map_err(|e| SimtelError::MalformedBlock(format!("adc sums: {e}")))?;
    let known = Array2::from_shape_vec((num_gains, num_pixels), cur.take_bytes(n)?.to_vec())
        .map_err(|e| SimtelError::MalformedBlock(format!("adc known flags: {e}")))?;
    match adc {
        Some(data) => {
            if data.num_gains != num_gains || data.num_pixels != num_pixels {
                return Err(SimtelError::MalformedBlock(format!(
                    "adc sums shape ({num_gains}, {num_pixels}) disagrees with samples ({}, {})",
                    data.num_gains, data.num_pixels
                )));
            }
            data.sums = Some(sums);
            data.adc_known = known;
        }
        None => {
            *adc = Some(AdcData {
                num_gains,
                num_pixels,
                sums: Some(sums),
                samples: None,
                adc_known: known,
            });
        }
    }
    Ok(())
}

fn adc_samples(cur: &mut Cursor<'_>, adc: &mut Option<AdcData>) -> Result<()> {
    let num_gains = cur.read_count()?;
    let num_pixels = cur.read_count()?;
    let num_samples = cur.read_count()?;
    let samples = Array3::from_shape_vec(
        (num_gains, num_pixels, num_samples),
        cur.read_u16_vec(table_elements(&[num_gains, num_pixels, num_samples])?)?,
    )
    .map_err(|e| SimtelError::MalformedBlock(format!("adc samples: {e}")))?;
    match adc {
        Some(data) => {
            if data.num_gains != num_gains || data.num_pixels != num_pixels {
                return Err(SimtelError::MalformedBlock(format!(
                    "adc samples shape ({num_gains}, {num_pixels}) disagrees with sums ({}, {})",
                    data.num_gains, data.num_pixels
                )));
            }
            data.samples = Some(samples);
        }
        None => {
            *adc = Some(AdcData {
                num_gains,
                num_pixels,
                sums: None,
                samples: Some(samples),
                // without a sums block every channel is taken as recorded
                adc_known: Array2::ones((num_gains, num_pixels)),
            });
        }
    }
    Ok(())
}

fn tracking_data(cur: &mut Cursor<'_>) -> Result<TrackingData> {
    let azimuth_raw = cur.read_f64()?;
    let altitude_raw = cur.read_f64()?;
    let azimuth_cor = cur.read_f64()?;
    let altitude_cor = cur.read_f64()?;
    Ok(TrackingData::builder()
        .azimuth_raw(azimuth_raw)
        .altitude_raw(altitude_raw)
        .azimuth_cor(azimuth_cor)
        .altitude_cor(altitude_cor)
        .build())
}

fn pixel_timing(cur: &mut Cursor<'_>) -> Result<PixelTiming> {
    let threshold = cur.read_i32()?;
    let peak_global = cur.read_f32()?;
    let num_types = cur.read_count()?;
    let num_pixels = cur.read_count()?;
    let timval = Array2::from_shape_vec(
        (num_pixels, num_types),
        cur.read_f32_vec(table_elements(&[num_pixels, num_types])?)?,
    )
    .map_err(|e| SimtelError::MalformedBlock(format!("pixel timing: {e}")))?;
    Ok(PixelTiming::builder()
        .threshold(threshold)
        .peak_global(peak_global)
        .timval(timval)
        .build())
}

/// One telescope's readout. The fixed part is followed by nested frames
/// for ADC sums, traces and timing; unknown nested types are skipped.
fn telescope_event(cur: &mut Cursor<'_>, tel_id: i32) -> Result<TelescopeEvent> {
    let gps_seconds = cur.read_i64()?;
    let gps_nanoseconds = cur.read_i64()?;
    let zero_sup_mode = cur.read_i32()?;
    let data_red_mode = cur.read_i32()?;
    let ntrig = cur.read_count()?;
    let mut trig_pixels = Vec::with_capacity(ntrig);
    for _ in 0..ntrig {
        let raw = cur.read_uvarint()?;
        let pix = i32::try_from(raw).map_err(|_| {
            SimtelError::MalformedBlock(format!("trigger pixel index {raw} out of range"))
        })?;
        trig_pixels.push(pix);
    }
    let num_pixels = cur.read_count()?;
    let significant = Array1::from_vec(cur.take_bytes(num_pixels)?.to_vec());

    let mut adc: Option<AdcData> = None;
    let mut timing: Option<PixelTiming> = None;
    while !cur.at_end() {
        let header = match BlockHeader::read(cur)? {
            Some(h) => h,
            None => break,
        };
        let mut sub = cur.sub(header.length as usize)?;
        if header.version != block::SUPPORTED_VERSION {
            tracing::debug!(
                block_type = header.block_type,
                version = header.version,
                tel_id,
                "skipping nested block with unsupported version"
            );
            sub.skip(sub.remaining())?;
            continue;
        }
        match header.block_type {
            ADC_SUMS => adc_sums(&mut sub, &mut adc)?,
            ADC_SAMPLES => adc_samples(&mut sub, &mut adc)?,
            PIXEL_TIMING => timing = Some(pixel_timing(&mut sub)?),
            other => {
                tracing::debug!(block_type = other, tel_id, "skipping nested block");
                sub.skip(sub.remaining())?;
            }
        }
        if !sub.at_end() {
            return Err(SimtelError::MalformedBlock(format!(
                "nested block {} in telescope {tel_id} leaves {} trailing bytes",
                header.block_type,
                sub.remaining()
            )));
        }
    }

    Ok(TelescopeEvent {
        tel_id,
        gps_seconds,
        gps_nanoseconds,
        zero_sup_mode,
        data_red_mode,
        trig_pixels,
        significant,
        adc,
        timing,
    })
}

/// The triggered-event container. Holds exactly one central trigger frame
/// plus one telescope-event frame per telescope with data.
pub(crate) fn event_record(cur: &mut Cursor<'_>, ident: i32) -> Result<Block> {
    let mut central: Option<CentralTrigger> = None;
    let mut telescopes = Vec::new();
    let mut tracking = Vec::new();
    while !cur.at_end() {
        let header = match BlockHeader::read(cur)? {
            Some(h) => h,
            None => break,
        };
        let mut sub = cur.sub(header.length as usize)?;
        if header.version != block::SUPPORTED_VERSION {
            tracing::debug!(
                block_type = header.block_type,
                version = header.version,
                "skipping nested block with unsupported version"
            );
            sub.skip(sub.remaining())?;
            continue;
        }
        match header.block_type {
            CENTRAL_TRIGGER => {
                if central.is_some() {
                    return Err(SimtelError::MalformedBlock(format!(
                        "event {ident} carries more than one central trigger"
                    )));
                }
                central = Some(central_trigger(&mut sub)?);
            }
            TELESCOPE_EVENT => telescopes.push(telescope_event(&mut sub, header.ident)?),
            TRACKING_DATA => tracking.push((header.ident, tracking_data(&mut sub)?)),
            other => {
                tracing::debug!(block_type = other, "skipping nested block");
                sub.skip(sub.remaining())?;
            }
        }
        if !sub.at_end() {
            return Err(SimtelError::MalformedBlock(format!(
                "nested block {} in event {ident} leaves {} trailing bytes",
                header.block_type,
                sub.remaining()
            )));
        }
    }
    let central = central.ok_or_else(|| {
        SimtelError::MalformedBlock(format!("event {ident} has no central trigger"))
    })?;
    Ok(Block::Event(EventRecord {
        event_id: ident,
        central,
        telescopes,
        tracking,
    }))
}
