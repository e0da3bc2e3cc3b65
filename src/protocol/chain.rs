//! Logical packet chains inside data responses

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::header::{HEADER_SIZE, decode_extended_header};
use super::Attribute;
use crate::{AnalysisError, Result};

/// One chained record of a data response: an extended header plus its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPacket {
    pub attribute: Attribute,
    pub has_next: bool,
    pub chunk: u8,
    pub size_bytes: u16,
    pub body: Vec<u8>,
}

/// Decode the logical packets that follow a data header.
///
/// A record whose declared size overruns the buffer ends the walk; every packet
/// decoded before it is returned. Use [`try_decode_logical_packet_chain`] to get the
/// overrun as an error instead.
pub fn decode_logical_packet_chain(bytes: &[u8]) -> Vec<LogicalPacket> {
    let (packets, fault) = walk_chain(bytes);
    if let Some(err) = fault {
        warn!("Truncating logical packet chain after {} packets: {}", packets.len(), err);
    }
    packets
}

/// Strict variant of [`decode_logical_packet_chain`].
///
/// # Errors
///
/// [`AnalysisError::MalformedChain`] if a header is cut short, a declared size
/// overruns the buffer, or `has_next` promises a record that is not there.
pub fn try_decode_logical_packet_chain(bytes: &[u8]) -> Result<Vec<LogicalPacket>> {
    match walk_chain(bytes) {
        (packets, None) => Ok(packets),
        (_, Some(err)) => Err(err),
    }
}

fn walk_chain(bytes: &[u8]) -> (Vec<LogicalPacket>, Option<AnalysisError>) {
    let mut packets = Vec::new();
    let mut offset = 0;

    loop {
        let remaining = bytes.len() - offset;
        if remaining == 0 {
            // An empty chain is valid; running dry after has_next is not.
            let fault = packets
                .last()
                .filter(|packet: &&LogicalPacket| packet.has_next)
                .map(|_| AnalysisError::MalformedChain { offset, declared: HEADER_SIZE, remaining });
            return (packets, fault);
        }
        if remaining < HEADER_SIZE {
            let fault = AnalysisError::MalformedChain { offset, declared: HEADER_SIZE, remaining };
            return (packets, Some(fault));
        }

        let header = match decode_extended_header(&bytes[offset..]) {
            Ok(header) => header,
            Err(err) => return (packets, Some(err)),
        };
        let body_start = offset + HEADER_SIZE;
        let size = usize::from(header.size_bytes);
        let available = bytes.len() - body_start;
        if size > available {
            let fault = AnalysisError::MalformedChain { offset, declared: size, remaining: available };
            return (packets, Some(fault));
        }

        trace!(
            "Logical packet at offset {}: {:?} chunk={} size={} next={}",
            offset, header.attribute, header.chunk, size, header.has_next
        );
        packets.push(LogicalPacket {
            attribute: header.attribute,
            has_next: header.has_next,
            chunk: header.chunk,
            size_bytes: header.size_bytes,
            body: bytes[body_start..body_start + size].to_vec(),
        });
        offset = body_start + size;

        if !header.has_next {
            if offset < bytes.len() {
                trace!("Ignoring {} bytes after final logical packet", bytes.len() - offset);
            }
            return (packets, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::header::encode;

    fn record(attribute: u16, has_next: bool, body: &[u8]) -> Vec<u8> {
        let mut bytes = encode::extended(attribute, has_next, 0, body.len() as u16).to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn empty_input_is_an_empty_chain() {
        assert!(decode_logical_packet_chain(&[]).is_empty());
        assert!(try_decode_logical_packet_chain(&[]).unwrap().is_empty());
    }

    #[test]
    fn chain_follows_has_next() {
        let mut bytes = record(0x0001, true, &[0xAA; 44]);
        bytes.extend(record(0x0010, false, &[0x01, 0x02, 0x03]));

        let packets = try_decode_logical_packet_chain(&bytes).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].attribute, Attribute::Adc);
        assert_eq!(packets[0].body.len(), 44);
        assert!(packets[0].has_next);
        assert_eq!(packets[1].attribute, Attribute::PdPacket);
        assert_eq!(packets[1].body, vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn stops_at_first_final_record() {
        let mut bytes = record(0x0001, false, &[0x00; 4]);
        bytes.extend(record(0x0010, false, &[0x01]));
        let packets = try_decode_logical_packet_chain(&bytes).unwrap();
        assert_eq!(packets.len(), 1);
    }

    #[test]
    fn overrun_keeps_earlier_packets() {
        let mut bytes = record(0x0001, true, &[0x11; 8]);
        bytes.extend(encode::extended(0x0010, false, 0, 200));
        bytes.extend([0u8; 10]);

        let packets = decode_logical_packet_chain(&bytes);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].body, vec![0x11; 8]);

        let err = try_decode_logical_packet_chain(&bytes).unwrap_err();
        assert_eq!(err, AnalysisError::MalformedChain { offset: 12, declared: 200, remaining: 10 });
        assert!(err.is_recoverable());
    }

    #[test]
    fn dangling_has_next_is_malformed_only_when_strict() {
        let bytes = record(0x0001, true, &[0x22; 4]);
        assert_eq!(decode_logical_packet_chain(&bytes).len(), 1);
        assert!(matches!(
            try_decode_logical_packet_chain(&bytes),
            Err(AnalysisError::MalformedChain { offset: 8, remaining: 0, .. })
        ));
    }

    #[test]
    fn partial_header_is_malformed() {
        let mut bytes = record(0x0001, true, &[0x22; 4]);
        bytes.extend([0x10, 0x00]);
        assert_eq!(decode_logical_packet_chain(&bytes).len(), 1);
        assert!(try_decode_logical_packet_chain(&bytes).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_lenient_is_prefix_of_well_formed(
                bodies in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..6),
                cut in any::<prop::sample::Index>(),
            ) {
                let mut bytes = Vec::new();
                for (i, body) in bodies.iter().enumerate() {
                    bytes.extend(record(0x0001, i + 1 < bodies.len(), body));
                }
                let full = try_decode_logical_packet_chain(&bytes).unwrap();
                prop_assert_eq!(full.len(), bodies.len());

                let truncated = &bytes[..cut.index(bytes.len() + 1)];
                let partial = decode_logical_packet_chain(truncated);
                prop_assert!(partial.len() <= full.len());
                prop_assert_eq!(&full[..partial.len()], &partial[..]);
            }
        }
    }
}
