//! Control transfer setup stage

use serde::{Deserialize, Serialize};

use crate::{AnalysisError, Result};

/// Size of a USB setup packet in bytes.
pub const SETUP_PACKET_SIZE: usize = 8;

/// Standard USB 2.0 (chapter 9) `bRequest` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardRequest {
    GetStatus,
    ClearFeature,
    SetFeature,
    SetAddress,
    GetDescriptor,
    SetDescriptor,
    GetConfiguration,
    SetConfiguration,
    GetInterface,
    SetInterface,
    SynchFrame,
    Unknown(u8),
}

impl StandardRequest {
    pub fn code(self) -> u8 {
        match self {
            StandardRequest::GetStatus => 0x00,
            StandardRequest::ClearFeature => 0x01,
            StandardRequest::SetFeature => 0x03,
            StandardRequest::SetAddress => 0x05,
            StandardRequest::GetDescriptor => 0x06,
            StandardRequest::SetDescriptor => 0x07,
            StandardRequest::GetConfiguration => 0x08,
            StandardRequest::SetConfiguration => 0x09,
            StandardRequest::GetInterface => 0x0A,
            StandardRequest::SetInterface => 0x0B,
            StandardRequest::SynchFrame => 0x0C,
            StandardRequest::Unknown(code) => code,
        }
    }

    /// Requests a host issues while enumerating a freshly attached device.
    pub fn is_enumeration(self) -> bool {
        matches!(
            self,
            StandardRequest::GetDescriptor
                | StandardRequest::SetAddress
                | StandardRequest::SetConfiguration
        )
    }
}

impl From<u8> for StandardRequest {
    fn from(code: u8) -> Self {
        match code {
            0x00 => StandardRequest::GetStatus,
            0x01 => StandardRequest::ClearFeature,
            0x03 => StandardRequest::SetFeature,
            0x05 => StandardRequest::SetAddress,
            0x06 => StandardRequest::GetDescriptor,
            0x07 => StandardRequest::SetDescriptor,
            0x08 => StandardRequest::GetConfiguration,
            0x09 => StandardRequest::SetConfiguration,
            0x0A => StandardRequest::GetInterface,
            0x0B => StandardRequest::SetInterface,
            0x0C => StandardRequest::SynchFrame,
            other => StandardRequest::Unknown(other),
        }
    }
}

/// Decoded setup packet of a control Submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupPacket {
    /// bmRequestType: direction, type, recipient
    pub request_type: u8,
    pub request: StandardRequest,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let bytes = data
            .get(..SETUP_PACKET_SIZE)
            .ok_or(AnalysisError::too_short("setup packet", SETUP_PACKET_SIZE, data.len()))?;

        Ok(Self {
            request_type: bytes[0],
            request: StandardRequest::from(bytes[1]),
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }

    /// Standard (as opposed to class or vendor) request, per bits 5..6 of bmRequestType.
    pub fn is_standard(&self) -> bool {
        (self.request_type >> 5) & 0x03 == 0
    }

    /// Descriptor type from the high byte of wValue, meaningful for GET_DESCRIPTOR.
    pub fn descriptor_type(&self) -> u8 {
        (self.value >> 8) as u8
    }
}
