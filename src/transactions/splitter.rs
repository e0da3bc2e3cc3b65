//! URB-level transaction boundary detection

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::types::{Frame, TransferType, UrbId};
use crate::CaptureConfig;

/// Identifier of one transaction within a session. The first frame always gets `1`.
pub type TransactionId = u64;

/// A frame annotated with the transaction it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionFrame {
    pub transaction_id: TransactionId,
    pub frame: Frame,
}

/// Why a frame opened a new transaction or stayed in the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    First,
    Reprime,
    Cancelled,
    BulkCommand,
    BulkContinuation,
    NoUrbId,
    OpenUrb,
    FreshUrb,
}

impl Boundary {
    fn opens(self) -> bool {
        matches!(self, Boundary::BulkCommand | Boundary::FreshUrb)
    }
}

/// Per-session splitter state.
///
/// Frames must be fed in capture order. One instance covers exactly one session;
/// independent sessions each get their own splitter.
///
/// # Examples
///
/// ```rust
/// use km003c_analysis::{CaptureConfig, Endpoint, Frame, TransferType, UrbId, UrbPhase};
/// use km003c_analysis::transactions::TransactionSplitter;
///
/// let mut splitter = TransactionSplitter::new(CaptureConfig::default());
/// let command = Frame::new(1, 0.0, TransferType::Bulk, Endpoint::BULK_OUT, UrbPhase::Submit)
///     .with_urb_id(UrbId(0x10))
///     .with_payload(vec![0x0C, 0x01, 0x02, 0x00]);
/// assert_eq!(splitter.process_frame(command).transaction_id, 1);
/// assert_eq!(splitter.finish(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TransactionSplitter {
    config: CaptureConfig,
    current_transaction: TransactionId,
    frames_seen: usize,
    last_frame_number: Option<u64>,
    open_ids: HashSet<UrbId>,
    /// Ids whose URB completed. Only reported in the session summary.
    retired_ids: HashSet<UrbId>,
}

impl Default for TransactionSplitter {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

impl TransactionSplitter {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            current_transaction: 1,
            frames_seen: 0,
            last_frame_number: None,
            open_ids: HashSet::new(),
            retired_ids: HashSet::new(),
        }
    }

    /// Transaction the next continuing frame would join.
    pub fn current_transaction(&self) -> TransactionId {
        self.current_transaction
    }

    /// Assign a frame to a transaction and update the URB id bookkeeping.
    pub fn process_frame(&mut self, frame: Frame) -> TransactionFrame {
        if let Some(last) = self.last_frame_number.filter(|&last| frame.frame_number < last) {
            warn!(
                "Frame {} arrived after frame {}; transaction boundaries may be wrong",
                frame.frame_number, last
            );
        }

        let boundary = self.classify(&frame);
        if boundary.opens() {
            self.current_transaction += 1;
        }
        trace!(
            "Frame {} -> transaction {} ({:?})",
            frame.frame_number, self.current_transaction, boundary
        );

        // Reprimes and cancellations stay untracked, first frame included, so a later
        // frame with the same id can still open a transaction.
        let untracked = frame.is_bulk_reprime() || self.config.is_cancelled(&frame);
        match frame.urb_id {
            None => {}
            Some(_) if untracked => {}
            Some(urb_id) if frame.is_complete() => {
                self.open_ids.remove(&urb_id);
                self.retired_ids.insert(urb_id);
            }
            Some(urb_id) => {
                self.open_ids.insert(urb_id);
            }
        }

        self.frames_seen += 1;
        self.last_frame_number = Some(frame.frame_number);
        TransactionFrame { transaction_id: self.current_transaction, frame }
    }

    /// End the session and return how many transactions it produced.
    pub fn finish(self) -> usize {
        let transactions =
            if self.frames_seen == 0 { 0 } else { self.current_transaction as usize };
        debug!(
            "Split {} frames into {} transactions ({} URB ids retired)",
            self.frames_seen,
            transactions,
            self.retired_ids.len()
        );
        transactions
    }

    fn classify(&self, frame: &Frame) -> Boundary {
        if self.frames_seen == 0 {
            return Boundary::First;
        }
        if frame.is_bulk_reprime() {
            return Boundary::Reprime;
        }
        if self.config.is_cancelled(frame) {
            return Boundary::Cancelled;
        }
        if frame.transfer_type == TransferType::Bulk {
            return if frame.is_bulk_command_start() {
                Boundary::BulkCommand
            } else {
                Boundary::BulkContinuation
            };
        }
        match frame.urb_id {
            None => Boundary::NoUrbId,
            Some(id) if self.open_ids.contains(&id) => Boundary::OpenUrb,
            Some(_) => Boundary::FreshUrb,
        }
    }
}

/// Split one session with the default capture encoding.
pub fn split(frames: impl IntoIterator<Item = Frame>) -> Vec<TransactionFrame> {
    split_with_config(frames, &CaptureConfig::default())
}

/// Split one session. Frames come back in input order, each with its transaction id.
pub fn split_with_config(
    frames: impl IntoIterator<Item = Frame>,
    config: &CaptureConfig,
) -> Vec<TransactionFrame> {
    let mut splitter = TransactionSplitter::new(config.clone());
    let split: Vec<_> = frames.into_iter().map(|frame| splitter.process_frame(frame)).collect();
    splitter.finish();
    split
}
