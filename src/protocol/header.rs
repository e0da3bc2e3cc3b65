//! Main and extended header decoding

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::fields::read_u32_le;
use super::{Attribute, AttributeMask, PacketType};
use crate::Result;

/// Size of every header word on the wire.
pub const HEADER_SIZE: usize = 4;

/// Main header of a control-class packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtrlHeader {
    pub packet_type: PacketType,
    pub extend: bool,
    pub transaction_id: u8,
    /// Raw 15-bit attribute field, bits 16..30
    pub attribute: u16,
}

impl CtrlHeader {
    /// Attributes requested by a GetData command.
    pub fn request_mask(&self) -> AttributeMask {
        AttributeMask::from_request_field(self.attribute)
    }
}

/// Main header of a data-class packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataHeader {
    pub packet_type: PacketType,
    pub extend: bool,
    pub transaction_id: u8,
    /// 10-bit object count, bits 22..31
    pub object_count: u16,
}

/// Header of one logical packet inside a data response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedHeader {
    pub attribute: Attribute,
    pub has_next: bool,
    pub chunk: u8,
    pub size_bytes: u16,
}

/// Main header, with the layout chosen by packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketHeader {
    Ctrl(CtrlHeader),
    Data(DataHeader),
}

impl PacketHeader {
    pub fn packet_type(&self) -> PacketType {
        match self {
            PacketHeader::Ctrl(header) => header.packet_type,
            PacketHeader::Data(header) => header.packet_type,
        }
    }

    pub fn transaction_id(&self) -> u8 {
        match self {
            PacketHeader::Ctrl(header) => header.transaction_id,
            PacketHeader::Data(header) => header.transaction_id,
        }
    }
}

/// Decode the main header of a control-class packet.
///
/// Only the first four bytes are read; anything after them is ignored.
///
/// # Examples
///
/// ```rust
/// use km003c_analysis::protocol::{PacketType, decode_ctrl_header};
///
/// let header = decode_ctrl_header(&[0x02, 0x01, 0x00, 0x00]).unwrap();
/// assert_eq!(header.packet_type, PacketType::Connect);
/// assert_eq!(header.transaction_id, 1);
/// assert_eq!(header.attribute, 0);
/// ```
pub fn decode_ctrl_header(bytes: &[u8]) -> Result<CtrlHeader> {
    let word = read_u32_le(bytes, 0, "control header")?;
    let header = CtrlHeader {
        packet_type: PacketType::from((word & 0x7F) as u8),
        extend: word & 0x80 != 0,
        transaction_id: ((word >> 8) & 0xFF) as u8,
        attribute: ((word >> 16) & 0x7FFF) as u16,
    };
    trace!(
        "Decoded control header: {:?} tid={} attribute={:#06x}",
        header.packet_type, header.transaction_id, header.attribute
    );
    Ok(header)
}

/// Decode the main header of a data-class packet.
pub fn decode_data_header(bytes: &[u8]) -> Result<DataHeader> {
    let word = read_u32_le(bytes, 0, "data header")?;
    let header = DataHeader {
        packet_type: PacketType::from((word & 0x7F) as u8),
        extend: word & 0x80 != 0,
        transaction_id: ((word >> 8) & 0xFF) as u8,
        object_count: ((word >> 22) & 0x3FF) as u16,
    };
    trace!(
        "Decoded data header: {:?} tid={} objects={}",
        header.packet_type, header.transaction_id, header.object_count
    );
    Ok(header)
}

/// Decode one extended header.
pub fn decode_extended_header(bytes: &[u8]) -> Result<ExtendedHeader> {
    let word = read_u32_le(bytes, 0, "extended header")?;
    Ok(ExtendedHeader {
        attribute: Attribute::from((word & 0x7FFF) as u16),
        has_next: word & 0x8000 != 0,
        chunk: ((word >> 16) & 0x3F) as u8,
        size_bytes: ((word >> 22) & 0x3FF) as u16,
    })
}

/// Decode the main header, picking the layout from the packet type in byte 0.
pub fn decode_packet_header(bytes: &[u8]) -> Result<PacketHeader> {
    let packet_type = PacketType::from(super::fields::read_u8(bytes, 0, "packet header")?);
    if packet_type.is_control() {
        decode_ctrl_header(bytes).map(PacketHeader::Ctrl)
    } else {
        decode_data_header(bytes).map(PacketHeader::Data)
    }
}
