//! Bounds-checked little-endian field readers

use crate::{AnalysisError, Result};

fn window<const N: usize>(data: &[u8], offset: usize, context: &'static str) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or(AnalysisError::too_short(context, offset + N, data.len()))
}

pub(crate) fn read_u8(data: &[u8], offset: usize, context: &'static str) -> Result<u8> {
    Ok(window::<1>(data, offset, context)?[0])
}

pub(crate) fn read_u16_le(data: &[u8], offset: usize, context: &'static str) -> Result<u16> {
    window(data, offset, context).map(u16::from_le_bytes)
}

pub(crate) fn read_i16_le(data: &[u8], offset: usize, context: &'static str) -> Result<i16> {
    window(data, offset, context).map(i16::from_le_bytes)
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize, context: &'static str) -> Result<u32> {
    window(data, offset, context).map(u32::from_le_bytes)
}

pub(crate) fn read_i32_le(data: &[u8], offset: usize, context: &'static str) -> Result<i32> {
    window(data, offset, context).map(i32::from_le_bytes)
}
