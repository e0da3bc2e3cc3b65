//! Offline analysis of ChargerLAB POWER-Z KM003C USB captures.
//!
//! The KM003C is a USB-C power-delivery analyzer that reports bus telemetry over a
//! vendor bulk protocol. This crate turns captured USB traffic back into meaning:
//!
//! - **Frames**: typed Submit/Complete records of each URB ([`Frame`], [`RawFrame`])
//! - **Protocol**: header, logical packet chain and ADC decoders ([`protocol`])
//! - **Transactions**: a splitter that groups frames into request/response exchanges
//!   and a tagger that labels them ([`transactions`])
//!
//! Everything is synchronous and allocation-light. Nothing here performs I/O; the
//! capture source is the caller's concern.
//!
//! # Quick Start
//!
//! ```rust
//! use km003c_analysis::{CaptureConfig, Frame, RawFrame, parse_packet, split, tag};
//!
//! let rows: Vec<RawFrame> = serde_yaml_ng::from_str(
//!     r#"
//! - { frame_number: 1, timestamp: 0.000, transfer_type: "0x03", endpoint_address: "0x01",
//!     urb_type: S, urb_id: "0xa", payload_hex: "0c0a0200" }
//! - { frame_number: 2, timestamp: 0.001, transfer_type: "0x03", endpoint_address: "0x01",
//!     urb_type: C, urb_id: "0xa" }
//! "#,
//! )
//! .unwrap();
//!
//! let config = CaptureConfig::default();
//! let frames = rows
//!     .iter()
//!     .map(|row| Frame::from_raw(row, &config))
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//!
//! let command = parse_packet(frames[0].payload().unwrap()).unwrap();
//! assert_eq!(command.transaction_id(), 0x0A);
//!
//! let tagged = tag(&split(frames));
//! assert_eq!(tagged[1].transaction_id, 1);
//! ```

// Core types and error handling
mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoders and analysis passes
pub mod protocol;
pub mod transactions;

// Core exports
pub use config::CaptureConfig;
pub use error::*;
pub use types::*;

// Main API exports
pub use protocol::{
    AdcData, Packet, decode_adc, decode_ctrl_header, decode_data_header, decode_extended_header,
    decode_logical_packet_chain, parse_packet,
};
pub use transactions::{
    Transaction, TransactionFrame, TransactionTag, TaggedFrame, split, split_with_config, tag,
    tag_with_config,
};
