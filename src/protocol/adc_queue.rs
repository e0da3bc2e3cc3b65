//! Buffered high-rate ADC samples

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::fields::{read_i16_le, read_i32_le, read_u16_le};
use crate::{AnalysisError, Result};

/// Size of one queued sample.
pub const ADC_QUEUE_SAMPLE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdcQueueSample {
    /// Device sequence counter, increments once per sample
    pub sequence: u16,
    pub marker: u16,
    pub vbus_v: f64,
    pub ibus_a: f64,
    pub power_w: f64,
    pub cc1_v: f64,
    pub cc2_v: f64,
    pub vdp_v: f64,
    pub vdm_v: f64,
}

/// Samples drained from the device queue by one AdcQueue request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdcQueueData {
    pub samples: Vec<AdcQueueSample>,
}

impl AdcQueueData {
    /// Number of sequence numbers skipped between consecutive samples.
    pub fn dropped_samples(&self) -> usize {
        self.samples
            .windows(2)
            .map(|pair| usize::from(pair[1].sequence.wrapping_sub(pair[0].sequence).saturating_sub(1)))
            .sum()
    }
}

/// Decode a queue body into its samples. A trailing partial sample is ignored.
pub fn decode_adc_queue(body: &[u8]) -> Result<AdcQueueData> {
    if body.len() < ADC_QUEUE_SAMPLE_SIZE {
        return Err(AnalysisError::too_short("ADC queue", ADC_QUEUE_SAMPLE_SIZE, body.len()));
    }

    let samples = body
        .chunks_exact(ADC_QUEUE_SAMPLE_SIZE)
        .map(decode_sample)
        .collect::<Result<Vec<_>>>()?;

    let leftover = body.len() % ADC_QUEUE_SAMPLE_SIZE;
    if leftover != 0 {
        trace!("Ignoring {} trailing bytes after {} queued samples", leftover, samples.len());
    }
    Ok(AdcQueueData { samples })
}

fn decode_sample(raw: &[u8]) -> Result<AdcQueueSample> {
    const CONTEXT: &str = "ADC queue sample";
    let vbus_v = f64::from(read_i32_le(raw, 4, CONTEXT)?) / 1_000_000.0;
    let ibus_a = f64::from(read_i32_le(raw, 8, CONTEXT)?) / 1_000_000.0;
    let line = |offset| read_i16_le(raw, offset, CONTEXT).map(|v| f64::from(v) / 10_000.0);

    Ok(AdcQueueSample {
        sequence: read_u16_le(raw, 0, CONTEXT)?,
        marker: read_u16_le(raw, 2, CONTEXT)?,
        vbus_v,
        ibus_a,
        power_w: vbus_v * ibus_a,
        cc1_v: line(12)?,
        cc2_v: line(14)?,
        vdp_v: line(16)?,
        vdm_v: line(18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sequence: u16, vbus_uv: i32, ibus_ua: i32) -> Vec<u8> {
        let mut raw = Vec::with_capacity(ADC_QUEUE_SAMPLE_SIZE);
        raw.extend(sequence.to_le_bytes());
        raw.extend(0x3cu16.to_le_bytes());
        raw.extend(vbus_uv.to_le_bytes());
        raw.extend(ibus_ua.to_le_bytes());
        raw.extend(1_000i16.to_le_bytes());
        raw.extend(0i16.to_le_bytes());
        raw.extend(6_000i16.to_le_bytes());
        raw.extend(0i16.to_le_bytes());
        raw
    }

    #[test]
    fn decodes_every_whole_sample() {
        let mut body = sample(100, 5_000_000, 2_000_000);
        body.extend(sample(101, 9_000_000, -100_000));
        body.extend([0xFF; 7]);

        let queue = decode_adc_queue(&body).unwrap();
        assert_eq!(queue.samples.len(), 2);
        assert_eq!(queue.samples[0].sequence, 100);
        assert_eq!(queue.samples[0].marker, 0x3c);
        assert!((queue.samples[0].power_w - 10.0).abs() < 1e-9);
        assert!((queue.samples[1].ibus_a + 0.1).abs() < 1e-9);
        assert!((queue.samples[1].cc1_v - 0.1).abs() < 1e-9);
        assert!((queue.samples[1].vdp_v - 0.6).abs() < 1e-9);
        assert_eq!(queue.dropped_samples(), 0);
    }

    #[test]
    fn sequence_gaps_count_as_drops() {
        let mut body = sample(u16::MAX, 0, 0);
        body.extend(sample(2, 0, 0));
        let queue = decode_adc_queue(&body).unwrap();
        assert_eq!(queue.dropped_samples(), 2);
    }

    #[test]
    fn less_than_one_sample_is_too_short() {
        let err = decode_adc_queue(&[0u8; 12]).unwrap_err();
        assert_eq!(err, AnalysisError::too_short("ADC queue", 20, 12));
    }
}
