//! PD event stream framing
//!
//! A `PdPacket` body is a fixed preamble followed by analyzer event records. Each
//! record starts with a type byte:
//!
//! - `0x45`: six-byte connection status record
//! - `0x80..=0x9F`: six-byte event header followed by one PD wire message
//!
//! The wire message itself (PD header plus data objects) is kept as bytes.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Bytes of device status ahead of the first event.
pub const PD_PREAMBLE_SIZE: usize = 12;
/// Size of every event header, connection records included.
pub const PD_EVENT_HEADER_SIZE: usize = 6;

const EVENT_TYPE_CONNECTION: u8 = 0x45;
const SIZE_MASK: u8 = 0x3F;
const SIZE_OFFSET: u8 = 5;
const SOP_VALID: u8 = 0x80;

const CONNECTION_CONNECT: u8 = 0x11;
const CONNECTION_DISCONNECT: u8 = 0x12;

/// One record of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdEvent {
    /// Cable attach/detach status change
    Connection { timestamp: u32, code: u8 },
    /// A captured PD message
    Message { sop_valid: bool, sop: u8, timestamp: u32, wire: Vec<u8> },
}

impl PdEvent {
    pub fn timestamp(&self) -> u32 {
        match self {
            PdEvent::Connection { timestamp, .. } | PdEvent::Message { timestamp, .. } => {
                *timestamp
            }
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, PdEvent::Connection { code: CONNECTION_CONNECT, .. })
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, PdEvent::Connection { code: CONNECTION_DISCONNECT, .. })
    }
}

/// Decoded `PdPacket` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdEventStream {
    /// Leading status bytes, shorter than [`PD_PREAMBLE_SIZE`] only for a short body
    pub preamble: Vec<u8>,
    pub events: Vec<PdEvent>,
}

impl PdEventStream {
    /// Wire messages in capture order.
    pub fn messages(&self) -> impl Iterator<Item = &[u8]> {
        self.events.iter().filter_map(|event| match event {
            PdEvent::Message { wire, .. } => Some(wire.as_slice()),
            PdEvent::Connection { .. } => None,
        })
    }
}

/// Split a `PdPacket` body into its preamble and event records.
///
/// Never fails. A body of at most [`PD_PREAMBLE_SIZE`] bytes is all preamble. The
/// walk stops at a record cut short by the end of the body, a message with no wire
/// bytes, or an unknown type byte; every event before it is returned.
///
/// # Examples
///
/// ```rust
/// use km003c_analysis::protocol::{PdEvent, decode_pd_events};
///
/// let mut body = vec![0u8; 12];
/// body.extend([0x87, 0x10, 0x27, 0x00, 0x00, 0x00, 0xA1, 0x11]);
/// let stream = decode_pd_events(&body);
/// assert_eq!(
///     stream.events,
///     vec![PdEvent::Message { sop_valid: true, sop: 0, timestamp: 10_000, wire: vec![0xA1, 0x11] }]
/// );
/// ```
pub fn decode_pd_events(body: &[u8]) -> PdEventStream {
    let split = body.len().min(PD_PREAMBLE_SIZE);
    let (preamble, records) = body.split_at(split);
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < records.len() {
        let Some(header) = records.get(offset..offset + PD_EVENT_HEADER_SIZE) else {
            warn!(
                "PD event at offset {} cut short: {} bytes remain",
                PD_PREAMBLE_SIZE + offset,
                records.len() - offset
            );
            break;
        };
        let kind = header[0];
        let timestamp = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
        let body_start = offset + PD_EVENT_HEADER_SIZE;

        match kind {
            EVENT_TYPE_CONNECTION => {
                events.push(PdEvent::Connection { timestamp, code: header[5] });
                offset = body_start;
            }
            0x80..=0x9F => {
                let wire_len = usize::from((kind & SIZE_MASK).saturating_sub(SIZE_OFFSET));
                if wire_len == 0 {
                    warn!("PD event at offset {} has no wire bytes", PD_PREAMBLE_SIZE + offset);
                    break;
                }
                let Some(wire) = records.get(body_start..body_start + wire_len) else {
                    warn!(
                        "PD message at offset {} declares {} bytes, {} remain",
                        PD_PREAMBLE_SIZE + offset,
                        wire_len,
                        records.len() - body_start
                    );
                    break;
                };
                events.push(PdEvent::Message {
                    sop_valid: kind & SOP_VALID != 0,
                    sop: header[5],
                    timestamp,
                    wire: wire.to_vec(),
                });
                offset = body_start + wire_len;
            }
            other => {
                warn!("Unknown PD event type 0x{:02X} at offset {}", other, PD_PREAMBLE_SIZE + offset);
                break;
            }
        }
    }

    trace!("PD body: {} preamble bytes, {} events", preamble.len(), events.len());
    PdEventStream { preamble: preamble.to_vec(), events }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_preamble(records: &[u8]) -> Vec<u8> {
        let mut body = vec![0xEE; PD_PREAMBLE_SIZE];
        body.extend_from_slice(records);
        body
    }

    /// Source_Capabilities-sized message event: 2-byte header plus one PDO.
    const SOURCE_CAPS: [u8; 12] =
        [0x8B, 0x40, 0x42, 0x0F, 0x00, 0x01, 0xA1, 0x11, 0x2C, 0x91, 0x01, 0x08];

    #[test]
    fn short_body_is_all_preamble() {
        let stream = decode_pd_events(&[1, 2, 3]);
        assert_eq!(stream.preamble, vec![1, 2, 3]);
        assert!(stream.events.is_empty());
        assert!(decode_pd_events(&[0; PD_PREAMBLE_SIZE]).events.is_empty());
    }

    #[test]
    fn message_and_connection_events() {
        let mut records = vec![0x45, 0x01, 0x00, 0x00, 0x00, 0x11];
        records.extend(SOURCE_CAPS);
        let stream = decode_pd_events(&with_preamble(&records));

        assert_eq!(stream.preamble, vec![0xEE; PD_PREAMBLE_SIZE]);
        assert_eq!(stream.events.len(), 2);
        assert!(stream.events[0].is_connect());
        assert_eq!(stream.events[0].timestamp(), 1);
        assert_eq!(
            stream.events[1],
            PdEvent::Message {
                sop_valid: true,
                sop: 1,
                timestamp: 1_000_000,
                wire: vec![0xA1, 0x11, 0x2C, 0x91, 0x01, 0x08],
            }
        );
        assert_eq!(stream.messages().collect::<Vec<_>>(), vec![&SOURCE_CAPS[6..]]);
    }

    #[test]
    fn truncated_trailing_event_keeps_earlier_ones() {
        let mut records = SOURCE_CAPS.to_vec();
        records.extend(&SOURCE_CAPS[..9]);
        let stream = decode_pd_events(&with_preamble(&records));
        assert_eq!(stream.events.len(), 1);

        let mut records = SOURCE_CAPS.to_vec();
        records.extend([0x87, 0x00]);
        assert_eq!(decode_pd_events(&with_preamble(&records)).events.len(), 1);
    }

    #[test]
    fn zero_length_message_ends_the_walk() {
        let mut records = vec![0x85, 0x00, 0x00, 0x00, 0x00, 0x00];
        records.extend(SOURCE_CAPS);
        assert!(decode_pd_events(&with_preamble(&records)).events.is_empty());
    }

    #[test]
    fn unknown_event_type_ends_the_walk() {
        let mut records = vec![0x45, 0x00, 0x00, 0x00, 0x00, 0x12];
        records.extend([0x20, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let stream = decode_pd_events(&with_preamble(&records));
        assert_eq!(stream.events.len(), 1);
        assert!(stream.events[0].is_disconnect());
    }

    #[test]
    fn sop_valid_flag_is_bit_seven_of_the_size_byte() {
        // 0x80..=0x9F always carries bit seven; the size lives in the low bits.
        let stream = decode_pd_events(&with_preamble(&[0x87, 0, 0, 0, 0, 2, 0xAA, 0xBB]));
        match &stream.events[0] {
            PdEvent::Message { sop_valid, sop, wire, .. } => {
                assert!(*sop_valid);
                assert_eq!(*sop, 2);
                assert_eq!(wire, &vec![0xAA, 0xBB]);
            }
            other => panic!("Expected message, got {other:?}"),
        }
    }
}
