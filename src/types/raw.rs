//! Ingestion records as exported by capture converters

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Endpoint, Frame, SetupPacket, StandardRequest, UrbId, parse_code};
use crate::{AnalysisError, CaptureConfig, Result};

/// One row of a capture export before interpretation.
///
/// Field names follow the dataset columns. Everything is optional at the serde
/// level so that [`Frame::from_raw`] can report exactly which required column is
/// missing instead of failing with a generic deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub frame_number: Option<u64>,
    pub timestamp: Option<f64>,
    pub transfer_type: Option<String>,
    pub endpoint_address: Option<String>,
    pub urb_type: Option<String>,
    pub urb_status: Option<String>,
    pub data_length: Option<u64>,
    pub urb_id: Option<String>,
    pub payload_hex: Option<String>,
    pub bmrequest_type: Option<String>,
    pub brequest: Option<String>,
    pub wvalue: Option<u32>,
    pub windex: Option<u32>,
    pub wlength: Option<u32>,
}

impl Frame {
    /// Interpret a raw record through the configured code table.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MissingField`] if a column the splitter relies on is absent
    /// - [`AnalysisError::InvalidField`] if a code is not in the table or a number does not parse
    pub fn from_raw(raw: &RawFrame, config: &CaptureConfig) -> Result<Self> {
        let frame_number = raw.frame_number.ok_or(AnalysisError::missing_field("frame_number"))?;
        let timestamp = raw.timestamp.ok_or(AnalysisError::missing_field("timestamp"))?;

        let transfer_raw = required(&raw.transfer_type, "transfer_type")?;
        let transfer_type = config
            .transfer_type(transfer_raw)
            .ok_or_else(|| AnalysisError::invalid_field("transfer_type", transfer_raw))?;

        let endpoint_raw = required(&raw.endpoint_address, "endpoint_address")?;
        let endpoint = parse_code(endpoint_raw)
            .and_then(|code| u8::try_from(code).ok())
            .map(Endpoint)
            .ok_or_else(|| AnalysisError::invalid_field("endpoint_address", endpoint_raw))?;

        let phase_raw = required(&raw.urb_type, "urb_type")?;
        let urb_phase = config
            .urb_phase(phase_raw)
            .ok_or_else(|| AnalysisError::invalid_field("urb_type", phase_raw))?;

        let urb_id = match required(&raw.urb_id, "urb_id")?.trim() {
            "" => None,
            id => Some(id.parse::<UrbId>()?),
        };

        let urb_status = match raw.urb_status.as_deref().map(str::trim) {
            None | Some("") => 0,
            Some(status) => status
                .parse::<i32>()
                .map_err(|_| AnalysisError::invalid_field("urb_status", status))?,
        };

        let mut frame = Frame::new(frame_number, timestamp, transfer_type, endpoint, urb_phase)
            .with_status(urb_status);
        frame.urb_id = urb_id;

        match raw.payload_hex.as_deref().map(str::trim) {
            Some(hex_str) if !hex_str.is_empty() => {
                let cleaned = hex_str.replace(':', "");
                let payload = hex::decode(&cleaned)
                    .map_err(|_| AnalysisError::invalid_field("payload_hex", hex_str))?;
                frame = frame.with_payload(payload);
            }
            _ => {
                frame.data_length = raw.data_length.unwrap_or(0) as usize;
            }
        }

        if let Some(request) = raw.brequest.as_deref() {
            frame.setup = Some(setup_from_columns(raw, request)?);
        }

        trace!(
            "Interpreted frame {}: {:?} {} {:?} len={}",
            frame.frame_number, frame.transfer_type, frame.endpoint, frame.urb_phase,
            frame.data_length
        );
        Ok(frame)
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str> {
    value.as_deref().ok_or(AnalysisError::missing_field(field))
}

fn setup_from_columns(raw: &RawFrame, request: &str) -> Result<SetupPacket> {
    let request_code = parse_code(request)
        .and_then(|code| u8::try_from(code).ok())
        .ok_or_else(|| AnalysisError::invalid_field("brequest", request))?;
    let request_type = match raw.bmrequest_type.as_deref() {
        Some(value) => parse_code(value)
            .and_then(|code| u8::try_from(code).ok())
            .ok_or_else(|| AnalysisError::invalid_field("bmrequest_type", value))?,
        None => 0,
    };

    Ok(SetupPacket {
        request_type,
        request: StandardRequest::from(request_code),
        value: setup_word(raw.wvalue, "wvalue")?,
        index: setup_word(raw.windex, "windex")?,
        length: setup_word(raw.wlength, "wlength")?,
    })
}

fn setup_word(value: Option<u32>, field: &'static str) -> Result<u16> {
    value.map_or(Ok(0), |word| {
        u16::try_from(word).map_err(|_| AnalysisError::invalid_field(field, word.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransferType, UrbPhase};

    fn bulk_command_row() -> RawFrame {
        RawFrame {
            frame_number: Some(42),
            timestamp: Some(1.25),
            transfer_type: Some("0x03".to_string()),
            endpoint_address: Some("0x01".to_string()),
            urb_type: Some("S".to_string()),
            urb_status: Some("-115".to_string()),
            data_length: Some(4),
            urb_id: Some("0xffff8a01c2d3e400".to_string()),
            payload_hex: Some("0c0a0200".to_string()),
            ..RawFrame::default()
        }
    }

    #[test]
    fn bulk_row_becomes_frame() {
        let frame = Frame::from_raw(&bulk_command_row(), &CaptureConfig::default()).unwrap();
        assert_eq!(frame.frame_number, 42);
        assert_eq!(frame.transfer_type, TransferType::Bulk);
        assert_eq!(frame.endpoint, Endpoint::BULK_OUT);
        assert_eq!(frame.urb_phase, UrbPhase::Submit);
        assert_eq!(frame.urb_status, -115);
        assert_eq!(frame.urb_id, Some(UrbId(0xffff_8a01_c2d3_e400)));
        assert_eq!(frame.payload(), Some(&[0x0C, 0x0A, 0x02, 0x00][..]));
        assert!(frame.is_bulk_command_start());
    }

    #[test]
    fn missing_required_column_is_reported() {
        let row = RawFrame { urb_type: None, ..bulk_command_row() };
        let err = Frame::from_raw(&row, &CaptureConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::missing_field("urb_type"));
    }

    #[test]
    fn unknown_transfer_code_is_invalid() {
        let row = RawFrame { transfer_type: Some("0x07".to_string()), ..bulk_command_row() };
        let err = Frame::from_raw(&row, &CaptureConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidField { field: "transfer_type", .. }));
    }

    #[test]
    fn empty_urb_id_means_no_id() {
        let row = RawFrame { urb_id: Some(String::new()), ..bulk_command_row() };
        let frame = Frame::from_raw(&row, &CaptureConfig::default()).unwrap();
        assert_eq!(frame.urb_id, None);
    }

    #[test]
    fn data_length_without_payload_is_kept() {
        let row = RawFrame {
            payload_hex: None,
            data_length: Some(64),
            endpoint_address: Some("0x81".to_string()),
            ..bulk_command_row()
        };
        let frame = Frame::from_raw(&row, &CaptureConfig::default()).unwrap();
        assert_eq!(frame.data_length, 64);
        assert!(!frame.is_bulk_reprime());
    }

    #[test]
    fn control_row_carries_setup() {
        let row = RawFrame {
            transfer_type: Some("0x02".to_string()),
            endpoint_address: Some("0x80".to_string()),
            payload_hex: None,
            data_length: Some(0),
            bmrequest_type: Some("0x80".to_string()),
            brequest: Some("6".to_string()),
            wvalue: Some(0x0100),
            wlength: Some(18),
            ..bulk_command_row()
        };
        let frame = Frame::from_raw(&row, &CaptureConfig::default()).unwrap();
        let setup = frame.setup.unwrap();
        assert_eq!(setup.request, StandardRequest::GetDescriptor);
        assert_eq!(setup.length, 18);
    }

    #[test]
    fn oversized_setup_word_is_invalid() {
        let row = RawFrame {
            transfer_type: Some("0x02".to_string()),
            endpoint_address: Some("0x80".to_string()),
            payload_hex: None,
            brequest: Some("6".to_string()),
            wvalue: Some(0x1_0100),
            ..bulk_command_row()
        };
        let err = Frame::from_raw(&row, &CaptureConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::invalid_field("wvalue", "65792"));
    }

    #[test]
    fn raw_frame_deserializes_with_missing_columns() {
        let row: RawFrame = serde_yaml_ng::from_str("frame_number: 7\nurb_type: C\n").unwrap();
        assert_eq!(row.frame_number, Some(7));
        assert!(row.transfer_type.is_none());
        let err = Frame::from_raw(&row, &CaptureConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::missing_field("timestamp"));
    }
}
