//! Captured USB bus events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::SetupPacket;
use crate::{AnalysisError, Result};

/// USB transfer type as recorded by the capturing layer.
///
/// Discriminants match the usbmon/USBPcap `transfer_type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferType {
    Isochronous,
    Interrupt,
    Control,
    Bulk,
}

impl TransferType {
    /// Map a capture-layer transfer type byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Isochronous),
            1 => Some(Self::Interrupt),
            2 => Some(Self::Control),
            3 => Some(Self::Bulk),
            _ => None,
        }
    }
}

/// Direction of a transfer relative to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Host to device
    Out,
    /// Device to host
    In,
}

/// Device endpoint address, direction carried in bit 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(pub u8);

impl Endpoint {
    /// The analyzer's bulk command endpoint.
    pub const BULK_OUT: Endpoint = Endpoint(0x01);
    /// The analyzer's bulk response endpoint.
    pub const BULK_IN: Endpoint = Endpoint(0x81);
    /// Default control pipe, host to device.
    pub const CONTROL_OUT: Endpoint = Endpoint(0x00);
    /// Default control pipe, device to host.
    pub const CONTROL_IN: Endpoint = Endpoint(0x80);

    pub fn direction(self) -> Direction {
        if self.0 & 0x80 != 0 { Direction::In } else { Direction::Out }
    }

    pub fn number(self) -> u8 {
        self.0 & 0x0F
    }

    pub fn is_in(self) -> bool {
        self.direction() == Direction::In
    }

    pub fn is_out(self) -> bool {
        self.direction() == Direction::Out
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Phase of a URB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UrbPhase {
    /// Host-issued request record
    Submit,
    /// Matching completion record, possibly cancelled
    Complete,
}

/// Opaque URB correlation identifier.
///
/// Not unique over a session: the capturing layer recycles an id once its
/// previous URB has completed or been cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UrbId(pub u64);

impl FromStr for UrbId {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        parse_code(s)
            .map(UrbId)
            .ok_or_else(|| AnalysisError::invalid_field("urb_id", s))
    }
}

impl fmt::Display for UrbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One captured USB bus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Strictly increasing within a session; the primary ordering key
    pub frame_number: u64,
    /// Seconds since capture start
    pub timestamp: f64,
    pub transfer_type: TransferType,
    pub endpoint: Endpoint,
    pub urb_phase: UrbPhase,
    /// Negative values are errno-style failures; `-2` marks a cancelled URB
    pub urb_status: i32,
    pub urb_id: Option<UrbId>,
    /// Captured data stage, shared rather than copied when frames are annotated
    pub payload: Option<Arc<[u8]>>,
    /// Transfer length in bytes; equals the payload length whenever a payload was captured
    pub data_length: usize,
    /// Decoded setup stage of a control Submit
    pub setup: Option<SetupPacket>,
}

impl Frame {
    /// Create a frame with no payload, status 0 and no URB id.
    pub fn new(
        frame_number: u64,
        timestamp: f64,
        transfer_type: TransferType,
        endpoint: Endpoint,
        urb_phase: UrbPhase,
    ) -> Self {
        Self {
            frame_number,
            timestamp,
            transfer_type,
            endpoint,
            urb_phase,
            urb_status: 0,
            urb_id: None,
            payload: None,
            data_length: 0,
            setup: None,
        }
    }

    pub fn with_urb_id(mut self, urb_id: UrbId) -> Self {
        self.urb_id = Some(urb_id);
        self
    }

    pub fn with_status(mut self, urb_status: i32) -> Self {
        self.urb_status = urb_status;
        self
    }

    /// Attach a payload; `data_length` follows it.
    pub fn with_payload(mut self, payload: impl Into<Arc<[u8]>>) -> Self {
        let payload = payload.into();
        self.data_length = payload.len();
        self.payload = Some(payload);
        self
    }

    pub fn with_setup(mut self, setup: SetupPacket) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    pub fn direction(&self) -> Direction {
        self.endpoint.direction()
    }

    pub fn is_submit(&self) -> bool {
        self.urb_phase == UrbPhase::Submit
    }

    pub fn is_complete(&self) -> bool {
        self.urb_phase == UrbPhase::Complete
    }

    /// Empty bulk IN submit: the host pre-positions a receive buffer for a later response.
    pub fn is_bulk_reprime(&self) -> bool {
        self.transfer_type == TransferType::Bulk
            && self.endpoint.is_in()
            && self.is_submit()
            && self.data_length == 0
    }

    /// Bulk OUT submit carrying a command payload.
    pub fn is_bulk_command_start(&self) -> bool {
        self.transfer_type == TransferType::Bulk
            && self.endpoint.is_out()
            && self.is_submit()
            && self.data_length > 0
    }
}

/// Parse a capture code written either as `0x`-prefixed hex or as decimal.
pub(crate) fn parse_code(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
