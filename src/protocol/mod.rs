//! KM003C application protocol decoding.
//!
//! Every packet starts with a 4-byte little-endian main header. The low byte holds a
//! 7-bit [`PacketType`] and an `extend` flag, the next byte is the transaction id
//! echoed by the response. The upper half-word depends on the packet class:
//!
//! | class   | types          | bits 16..31                                     |
//! |---------|----------------|-------------------------------------------------|
//! | control | `< 0x40`       | 15-bit attribute field ([`CtrlHeader`])         |
//! | data    | `>= 0x40`      | 10-bit object count at bits 22..31 ([`DataHeader`]) |
//!
//! A `PutData` response is followed by a chain of logical packets, each introduced by
//! an [`ExtendedHeader`] with its own attribute, `has_next` flag, chunk index and body
//! size. ADC bodies decode into [`AdcData`], queued samples into [`AdcQueueData`] and
//! PD bodies into a [`PdEventStream`].
//!
//! ```rust
//! use km003c_analysis::protocol::{Packet, parse_packet};
//!
//! let bytes = hex::decode(
//!     "410a82020100000b5c0f0000faffffffa00f0000f2ffffff04100000500000007e0d7b7ed40471014201837e0080780025002100",
//! )
//! .unwrap();
//! let packet = parse_packet(&bytes).unwrap();
//! assert!(matches!(packet, Packet::DataResponse { .. }));
//! assert!(packet.adc().unwrap().temp_c > 26.0);
//! ```
//!
//! Decoders never perform I/O and never hold device state. Unknown packet types and
//! attributes decode to `Unknown` variants.

mod adc;
mod adc_queue;
mod attribute;
mod chain;
mod fields;
pub(crate) mod header;
mod packet;
mod packet_type;
mod pd;

pub use adc::{ADC_DATA_SIZE, AdcData, SampleRate, decode_adc};
pub use adc_queue::{ADC_QUEUE_SAMPLE_SIZE, AdcQueueData, AdcQueueSample, decode_adc_queue};
pub use attribute::{Attribute, AttributeMask};
pub use chain::{LogicalPacket, decode_logical_packet_chain, try_decode_logical_packet_chain};
pub use header::{
    CtrlHeader, DataHeader, ExtendedHeader, HEADER_SIZE, PacketHeader, decode_ctrl_header,
    decode_data_header, decode_extended_header, decode_packet_header,
};
pub use packet::{Packet, Payload, parse_packet};
pub use packet_type::PacketType;
pub use pd::{PD_EVENT_HEADER_SIZE, PD_PREAMBLE_SIZE, PdEvent, PdEventStream, decode_pd_events};
