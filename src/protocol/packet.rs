//! Whole-packet classification

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    AdcData, AdcQueueData, Attribute, AttributeMask, CtrlHeader, DataHeader, LogicalPacket,
    PacketHeader, PacketType, PdEventStream, SampleRate, decode_adc, decode_adc_queue,
    decode_logical_packet_chain, decode_packet_header, decode_pd_events, header::HEADER_SIZE,
};
use crate::Result;

/// A decoded application packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Packet {
    Connect(CtrlHeader),
    Disconnect(CtrlHeader),
    Accept(CtrlHeader),
    Reject(CtrlHeader),
    GetData { header: CtrlHeader, attributes: AttributeMask },
    StartGraph { header: CtrlHeader, rate: SampleRate },
    StopGraph(CtrlHeader),
    /// PutData response with its logical packet chain decoded
    DataResponse { header: DataHeader, payloads: Vec<Payload> },
    /// Anything else, kept with its undecoded body
    Generic { header: PacketHeader, payload: Vec<u8> },
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Connect(header)
            | Packet::Disconnect(header)
            | Packet::Accept(header)
            | Packet::Reject(header)
            | Packet::StopGraph(header)
            | Packet::GetData { header, .. }
            | Packet::StartGraph { header, .. } => header.packet_type,
            Packet::DataResponse { header, .. } => header.packet_type,
            Packet::Generic { header, .. } => header.packet_type(),
        }
    }

    pub fn transaction_id(&self) -> u8 {
        match self {
            Packet::Connect(header)
            | Packet::Disconnect(header)
            | Packet::Accept(header)
            | Packet::Reject(header)
            | Packet::StopGraph(header)
            | Packet::GetData { header, .. }
            | Packet::StartGraph { header, .. } => header.transaction_id,
            Packet::DataResponse { header, .. } => header.transaction_id,
            Packet::Generic { header, .. } => header.transaction_id(),
        }
    }

    /// First ADC record of a data response, if any.
    pub fn adc(&self) -> Option<&AdcData> {
        match self {
            Packet::DataResponse { payloads, .. } => payloads.iter().find_map(|payload| match payload {
                Payload::Adc(adc) => Some(adc),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// Decoded body of one logical packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Adc(AdcData),
    AdcQueue(AdcQueueData),
    /// Analyzer PD event records
    PdPacket(PdEventStream),
    Other { attribute: Attribute, bytes: Vec<u8> },
}

impl Payload {
    /// Decode a logical packet body by attribute.
    ///
    /// A body its decoder rejects is kept as [`Payload::Other`].
    pub fn from_logical(packet: LogicalPacket) -> Self {
        let decoded = match packet.attribute {
            Attribute::Adc => decode_adc(&packet.body).map(Payload::Adc),
            Attribute::AdcQueue | Attribute::AdcQueue10k => {
                decode_adc_queue(&packet.body).map(Payload::AdcQueue)
            }
            Attribute::PdPacket => return Payload::PdPacket(decode_pd_events(&packet.body)),
            attribute => return Payload::Other { attribute, bytes: packet.body },
        };
        decoded.unwrap_or_else(|err| {
            debug!("Keeping {:?} body undecoded: {}", packet.attribute, err);
            Payload::Other { attribute: packet.attribute, bytes: packet.body }
        })
    }
}

/// Decode a complete packet as carried in one bulk transfer.
///
/// # Errors
///
/// [`AnalysisError::TooShort`](crate::AnalysisError::TooShort) if fewer than four
/// bytes are supplied. Malformed data response chains are truncated, not reported.
///
/// # Examples
///
/// ```rust
/// use km003c_analysis::protocol::{Attribute, Packet, parse_packet};
///
/// match parse_packet(&[0x0C, 0x0A, 0x02, 0x00]).unwrap() {
///     Packet::GetData { attributes, .. } => assert!(attributes.contains(Attribute::Adc)),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn parse_packet(bytes: &[u8]) -> Result<Packet> {
    let header = decode_packet_header(bytes)?;
    let rest = &bytes[HEADER_SIZE..];

    let packet = match header {
        PacketHeader::Ctrl(ctrl) => match ctrl.packet_type {
            PacketType::Connect => Packet::Connect(ctrl),
            PacketType::Disconnect => Packet::Disconnect(ctrl),
            PacketType::Accept => Packet::Accept(ctrl),
            PacketType::Reject => Packet::Reject(ctrl),
            PacketType::GetData => Packet::GetData { header: ctrl, attributes: ctrl.request_mask() },
            PacketType::StartGraph => {
                let index = ctrl.request_mask().value();
                let rate = SampleRate::from(u8::try_from(index).unwrap_or(u8::MAX));
                Packet::StartGraph { header: ctrl, rate }
            }
            PacketType::StopGraph => Packet::StopGraph(ctrl),
            _ => Packet::Generic { header, payload: rest.to_vec() },
        },
        PacketHeader::Data(data) if data.packet_type == PacketType::PutData => {
            let payloads = decode_logical_packet_chain(rest)
                .into_iter()
                .map(Payload::from_logical)
                .collect();
            Packet::DataResponse { header: data, payloads }
        }
        PacketHeader::Data(_) => Packet::Generic { header, payload: rest.to_vec() },
    };

    trace!("Parsed packet {:?} tid={}", packet.packet_type(), packet.transaction_id());
    Ok(packet)
}
