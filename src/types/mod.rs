//! Frame model for captured USB traffic.
//!
//! A [`Frame`] is one captured bus event: a Submit or Complete record for one URB on
//! one endpoint. Frames are the leaf data type of the crate; the transaction splitter
//! and tagger annotate them, and the protocol decoders read their payloads.
//!
//! ## Ingestion
//!
//! Capture converters export loosely-typed rows. [`RawFrame`] is that row shape, and
//! [`Frame::from_raw`] interprets it through a [`CaptureConfig`](crate::CaptureConfig):
//!
//! ```rust
//! use km003c_analysis::{CaptureConfig, Frame, RawFrame, TransferType};
//!
//! let row = RawFrame {
//!     frame_number: Some(1),
//!     timestamp: Some(0.0),
//!     transfer_type: Some("0x03".into()),
//!     endpoint_address: Some("0x81".into()),
//!     urb_type: Some("S".into()),
//!     urb_id: Some("0x10".into()),
//!     ..RawFrame::default()
//! };
//! let frame = Frame::from_raw(&row, &CaptureConfig::default()).unwrap();
//! assert_eq!(frame.transfer_type, TransferType::Bulk);
//! assert!(frame.is_bulk_reprime());
//! ```

mod frame;
mod raw;
mod setup;

pub use frame::{Direction, Endpoint, Frame, TransferType, UrbId, UrbPhase};
pub(crate) use frame::parse_code;
pub use raw::RawFrame;
pub use setup::{SETUP_PACKET_SIZE, SetupPacket, StandardRequest};
