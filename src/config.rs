//! Capture encoding configuration
//!
//! Different ingestion layers label the same USB facts differently: one exports
//! `transfer_type` as `"0x03"`, another as `"3"`; one writes URB phases as `S`/`C`,
//! another spells them out. [`CaptureConfig`] is the single table that maps those raw
//! encodings onto the typed [`Frame`](crate::Frame) model, plus the status sentinel the
//! splitter treats as a cancellation. It never changes algorithmic behaviour.
//!
//! The default matches the analyzer dataset exports. A YAML document must spell out
//! every field; omissions are reported rather than defaulted.
//!
//! ```rust
//! use km003c_analysis::CaptureConfig;
//!
//! let config = CaptureConfig::from_yaml_str(
//!     r#"
//! isochronous_transfer_type: "0"
//! interrupt_transfer_type: "1"
//! control_transfer_type: "2"
//! bulk_transfer_type: "3"
//! submit_marker: Submit
//! complete_marker: Complete
//! cancel_status: -2
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.submit_marker, "Submit");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Frame, TransferType, UrbPhase, parse_code};
use crate::Result;

/// Raw code table and sentinel values for one capture source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureConfig {
    pub isochronous_transfer_type: String,
    pub interrupt_transfer_type: String,
    pub control_transfer_type: String,
    pub bulk_transfer_type: String,
    /// Marker for a Submit-phase record
    pub submit_marker: String,
    /// Marker for a Complete-phase record
    pub complete_marker: String,
    /// `urb_status` value reported for a cancelled URB (`-ENOENT`)
    pub cancel_status: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            isochronous_transfer_type: "0x00".to_string(),
            interrupt_transfer_type: "0x01".to_string(),
            control_transfer_type: "0x02".to_string(),
            bulk_transfer_type: "0x03".to_string(),
            submit_marker: "S".to_string(),
            complete_marker: "C".to_string(),
            cancel_status: -2,
        }
    }
}

impl CaptureConfig {
    /// Parse a configuration document. Every field is required.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CaptureConfig = serde_yaml_ng::from_str(yaml)?;
        debug!(
            "Loaded capture config: bulk={}, control={}, cancel_status={}",
            config.bulk_transfer_type, config.control_transfer_type, config.cancel_status
        );
        Ok(config)
    }

    /// Resolve a raw transfer type code.
    pub fn transfer_type(&self, raw: &str) -> Option<TransferType> {
        let table = [
            (&self.isochronous_transfer_type, TransferType::Isochronous),
            (&self.interrupt_transfer_type, TransferType::Interrupt),
            (&self.control_transfer_type, TransferType::Control),
            (&self.bulk_transfer_type, TransferType::Bulk),
        ];
        table.into_iter().find(|(code, _)| codes_match(code, raw)).map(|(_, ty)| ty)
    }

    /// Resolve a raw URB phase marker.
    pub fn urb_phase(&self, raw: &str) -> Option<UrbPhase> {
        let raw = raw.trim();
        if raw == self.submit_marker {
            Some(UrbPhase::Submit)
        } else if raw == self.complete_marker {
            Some(UrbPhase::Complete)
        } else {
            None
        }
    }

    pub fn is_cancelled(&self, frame: &Frame) -> bool {
        frame.urb_status == self.cancel_status
    }
}

/// Numeric codes compare by value so `"0x03"`, `"0x3"` and `"3"` agree.
fn codes_match(configured: &str, raw: &str) -> bool {
    match (parse_code(configured), parse_code(raw)) {
        (Some(a), Some(b)) => a == b,
        _ => configured.trim() == raw.trim(),
    }
}
