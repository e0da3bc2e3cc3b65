//! ADC telemetry record decoding

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::fields::{read_i16_le, read_i32_le, read_u8};
use crate::{AnalysisError, Result};

/// Minimum size of an ADC logical packet body.
pub const ADC_DATA_SIZE: usize = 44;

const MICRO: f64 = 1_000_000.0;
const TENTH_MILLI: f64 = 10_000.0;

/// Device-side sampling rate reported in the ADC record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleRate {
    Sps1,
    Sps10,
    Sps50,
    Sps1000,
    Sps10000,
    Unknown(u8),
}

impl SampleRate {
    /// Samples per second, when the index is known.
    pub fn samples_per_second(self) -> Option<u32> {
        match self {
            SampleRate::Sps1 => Some(1),
            SampleRate::Sps10 => Some(10),
            SampleRate::Sps50 => Some(50),
            SampleRate::Sps1000 => Some(1_000),
            SampleRate::Sps10000 => Some(10_000),
            SampleRate::Unknown(_) => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            SampleRate::Sps1 => 0,
            SampleRate::Sps10 => 1,
            SampleRate::Sps50 => 2,
            SampleRate::Sps1000 => 3,
            SampleRate::Sps10000 => 4,
            SampleRate::Unknown(index) => index,
        }
    }
}

impl From<u8> for SampleRate {
    fn from(index: u8) -> Self {
        match index {
            0 => SampleRate::Sps1,
            1 => SampleRate::Sps10,
            2 => SampleRate::Sps50,
            3 => SampleRate::Sps1000,
            4 => SampleRate::Sps10000,
            other => SampleRate::Unknown(other),
        }
    }
}

/// One ADC record in physical units.
///
/// Voltages are volts, currents amperes, power watts, temperature degrees Celsius.
/// Values are not range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdcData {
    pub vbus_v: f64,
    pub ibus_a: f64,
    /// `vbus_v * ibus_a`
    pub power_w: f64,
    pub vbus_avg_v: f64,
    pub ibus_avg_a: f64,
    pub vbus_ori_avg_v: f64,
    pub ibus_ori_avg_a: f64,
    pub temp_c: f64,
    pub cc1_v: f64,
    pub cc2_v: f64,
    pub cc2_avg_v: f64,
    pub vdp_v: f64,
    pub vdm_v: f64,
    pub vdp_avg_v: f64,
    pub vdm_avg_v: f64,
    pub internal_vdd_v: f64,
    pub sample_rate: SampleRate,
}

/// Decode a 44-byte ADC record. Bytes past the record are ignored.
///
/// # Examples
///
/// ```rust
/// use km003c_analysis::protocol::decode_adc;
///
/// let mut body = [0u8; 44];
/// body[..4].copy_from_slice(&5_054_000i32.to_le_bytes());
/// let adc = decode_adc(&body).unwrap();
/// assert!((adc.vbus_v - 5.054).abs() < 1e-9);
/// ```
pub fn decode_adc(body: &[u8]) -> Result<AdcData> {
    if body.len() < ADC_DATA_SIZE {
        return Err(AnalysisError::too_short("ADC record", ADC_DATA_SIZE, body.len()));
    }

    let micro = |offset| read_i32_le(body, offset, "ADC record").map(|raw| f64::from(raw) / MICRO);
    let tenth_milli =
        |offset| read_i16_le(body, offset, "ADC record").map(|raw| f64::from(raw) / TENTH_MILLI);

    let vbus_v = micro(0)?;
    let ibus_a = micro(4)?;
    let temp_low = read_u8(body, 24, "ADC record")?;
    let temp_high = read_u8(body, 25, "ADC record")?;

    let adc = AdcData {
        vbus_v,
        ibus_a,
        power_w: vbus_v * ibus_a,
        vbus_avg_v: micro(8)?,
        ibus_avg_a: micro(12)?,
        vbus_ori_avg_v: micro(16)?,
        ibus_ori_avg_a: micro(20)?,
        temp_c: temperature_celsius(temp_high, temp_low),
        cc1_v: tenth_milli(26)?,
        cc2_v: tenth_milli(28)?,
        vdp_v: tenth_milli(30)?,
        vdm_v: tenth_milli(32)?,
        internal_vdd_v: tenth_milli(34)?,
        sample_rate: SampleRate::from(read_u8(body, 36, "ADC record")?),
        cc2_avg_v: tenth_milli(38)?,
        vdp_avg_v: tenth_milli(40)?,
        vdm_avg_v: tenth_milli(42)?,
    };
    trace!(
        "Decoded ADC record: vbus={:.6}V ibus={:.6}A temp={:.3}C rate={:?}",
        adc.vbus_v, adc.ibus_a, adc.temp_c, adc.sample_rate
    );
    Ok(adc)
}

/// Linear reading of the two temperature bytes.
///
/// Unverified against the sensor datasheet; kept bit-for-bit with the captures
/// this crate was validated on.
fn temperature_celsius(high: u8, low: u8) -> f64 {
    f64::from(high) * 2000.0 / 1000.0 + f64::from(low) * (1000.0 / 128.0) / 1000.0
}
