//! Synthetic capture sessions for tests and benchmarks
//!
//! Real captures of the analyzer are large and tied to one host controller, so unit
//! tests and benches build their sessions here instead. [`FrameBuilder`] hands out
//! frames with increasing frame numbers and timestamps, matching what a capture layer
//! would record for the same bus traffic.

#![cfg(any(test, feature = "benchmark"))]

use crate::protocol::ADC_DATA_SIZE;
use crate::types::{Endpoint, Frame, SetupPacket, StandardRequest, TransferType, UrbId, UrbPhase};

/// Nominal spacing between captured events, in seconds.
pub const FRAME_INTERVAL: f64 = 0.000_125;

/// URB id the host uses for bulk OUT commands in synthetic sessions.
pub const COMMAND_URB: u64 = 0xA;
/// URB id the host uses for bulk IN responses in synthetic sessions.
pub const RESPONSE_URB: u64 = 0xB;

/// Hands out frames in capture order.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    next_frame: u64,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self { next_frame: 1 }
    }

    fn frame(&mut self, transfer_type: TransferType, endpoint: Endpoint, phase: UrbPhase) -> Frame {
        let number = self.next_frame;
        self.next_frame += 1;
        Frame::new(number, number as f64 * FRAME_INTERVAL, transfer_type, endpoint, phase)
    }

    pub fn bulk_out_submit(&mut self, urb: u64, payload: &[u8]) -> Frame {
        self.frame(TransferType::Bulk, Endpoint::BULK_OUT, UrbPhase::Submit)
            .with_urb_id(UrbId(urb))
            .with_payload(payload.to_vec())
    }

    pub fn bulk_out_complete(&mut self, urb: u64) -> Frame {
        self.frame(TransferType::Bulk, Endpoint::BULK_OUT, UrbPhase::Complete).with_urb_id(UrbId(urb))
    }

    pub fn bulk_in_complete(&mut self, urb: u64, payload: &[u8]) -> Frame {
        self.frame(TransferType::Bulk, Endpoint::BULK_IN, UrbPhase::Complete)
            .with_urb_id(UrbId(urb))
            .with_payload(payload.to_vec())
    }

    /// Empty IN submit re-arming the receive buffer.
    pub fn bulk_in_submit(&mut self, urb: u64) -> Frame {
        self.frame(TransferType::Bulk, Endpoint::BULK_IN, UrbPhase::Submit).with_urb_id(UrbId(urb))
    }

    /// Device-to-host standard request on the default pipe.
    pub fn control_submit(&mut self, urb: u64, request: u8) -> Frame {
        let setup = SetupPacket {
            request_type: 0x80,
            request: StandardRequest::from(request),
            value: 0x0100,
            index: 0,
            length: 18,
        };
        self.frame(TransferType::Control, Endpoint::CONTROL_IN, UrbPhase::Submit)
            .with_urb_id(UrbId(urb))
            .with_setup(setup)
    }

    pub fn control_complete(&mut self, urb: u64) -> Frame {
        self.frame(TransferType::Control, Endpoint::CONTROL_IN, UrbPhase::Complete)
            .with_urb_id(UrbId(urb))
            .with_payload(vec![0x12, 0x01, 0x00, 0x02])
    }

    /// Bulk IN URB reported as killed (`-ENOENT`) at teardown.
    pub fn cancelled(&mut self, urb: u64) -> Frame {
        self.frame(TransferType::Bulk, Endpoint::BULK_IN, UrbPhase::Complete)
            .with_urb_id(UrbId(urb))
            .with_status(-2)
    }

    /// `count` GetData(ADC) command/response exchanges, four frames each.
    pub fn command_cycles(&mut self, count: usize) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(count * 4);
        for i in 0..count {
            let tid = (i % 256) as u8;
            frames.push(self.bulk_out_submit(COMMAND_URB, &get_adc_request(tid)));
            frames.push(self.bulk_out_complete(COMMAND_URB));
            frames.push(self.bulk_in_complete(RESPONSE_URB, &adc_response(tid, 5_000_000, 1_000_000)));
            frames.push(self.bulk_in_submit(RESPONSE_URB));
        }
        frames
    }

    /// Enumeration followed by `cycles` polling exchanges and a cancelled IN URB.
    pub fn session(&mut self, cycles: usize) -> Vec<Frame> {
        let mut frames = vec![
            self.control_submit(1, 0x06),
            self.control_complete(1),
            self.control_submit(2, 0x05),
            self.control_complete(2),
            self.control_submit(1, 0x09),
            self.control_complete(1),
        ];
        frames.extend(self.command_cycles(cycles));
        frames.push(self.cancelled(RESPONSE_URB));
        frames
    }
}

/// GetData request for the ADC attribute.
pub fn get_adc_request(transaction_id: u8) -> [u8; 4] {
    [0x0C, transaction_id, 0x02, 0x00]
}

/// PutData response carrying one ADC record with the given bus readings.
pub fn adc_response(transaction_id: u8, vbus_uv: i32, ibus_ua: i32) -> Vec<u8> {
    let size = ADC_DATA_SIZE as u32;
    let mut bytes = Vec::with_capacity(8 + ADC_DATA_SIZE);
    bytes.extend((0x41u32 | (u32::from(transaction_id) << 8) | (1 << 22)).to_le_bytes());
    bytes.extend((0x0001u32 | (size << 22)).to_le_bytes());

    let mut body = [0u8; ADC_DATA_SIZE];
    body[0..4].copy_from_slice(&vbus_uv.to_le_bytes());
    body[4..8].copy_from_slice(&ibus_ua.to_le_bytes());
    body[8..12].copy_from_slice(&vbus_uv.to_le_bytes());
    body[12..16].copy_from_slice(&ibus_ua.to_le_bytes());
    body[24] = 0x00;
    body[25] = 0x0C;
    bytes.extend(body);
    bytes
}

/// Proptest strategy for arbitrary single-session frame sequences.
#[cfg(test)]
pub fn arbitrary_session(max_len: usize) -> impl proptest::strategy::Strategy<Value = Vec<Frame>> {
    use proptest::prelude::*;

    prop_compose! {
        fn arb_event()(
            kind in 0u8..6,
            urb in 0u64..6,
            with_id in prop::bool::weighted(0.9),
            status in prop_oneof![8 => Just(0i32), 1 => Just(-2i32), 1 => Just(-71i32)],
            payload_len in prop_oneof![Just(0usize), 1usize..64],
        ) -> (u8, Option<u64>, i32, usize) {
            (kind, with_id.then_some(urb), status, payload_len)
        }
    }

    prop::collection::vec(arb_event(), 0..max_len).prop_map(|events| {
        events
            .into_iter()
            .enumerate()
            .map(|(i, (kind, urb, status, payload_len))| {
                let (transfer_type, endpoint, phase) = match kind {
                    0 => (TransferType::Bulk, Endpoint::BULK_OUT, UrbPhase::Submit),
                    1 => (TransferType::Bulk, Endpoint::BULK_OUT, UrbPhase::Complete),
                    2 => (TransferType::Bulk, Endpoint::BULK_IN, UrbPhase::Submit),
                    3 => (TransferType::Bulk, Endpoint::BULK_IN, UrbPhase::Complete),
                    4 => (TransferType::Control, Endpoint::CONTROL_IN, UrbPhase::Submit),
                    _ => (TransferType::Control, Endpoint::CONTROL_IN, UrbPhase::Complete),
                };
                let number = i as u64 + 1;
                let mut frame =
                    Frame::new(number, number as f64 * FRAME_INTERVAL, transfer_type, endpoint, phase)
                        .with_status(status)
                        .with_payload(vec![0u8; payload_len]);
                frame.urb_id = urb.map(UrbId);
                frame
            })
            .collect()
    })
}
