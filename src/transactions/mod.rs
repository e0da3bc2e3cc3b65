//! Transaction splitting and tagging.
//!
//! A KM003C exchange is spread over several URBs: the host submits a command on the
//! bulk OUT endpoint, the OUT URB completes, the response completes on bulk IN, and
//! the host immediately resubmits an empty IN URB for the next response. Control
//! traffic (enumeration) follows the same Submit/Complete pairing keyed by URB id.
//!
//! [`split`] walks one session in capture order and assigns every frame a
//! transaction id, starting at `1` and never decreasing. [`tag`] then labels each
//! transaction by composition and pattern:
//!
//! ```rust
//! use km003c_analysis::{Endpoint, Frame, TransferType, UrbId, UrbPhase};
//! use km003c_analysis::transactions::{TransactionTag, split, tag};
//!
//! let frame = |n: u64, endpoint, phase, payload: Vec<u8>| {
//!     Frame::new(n, n as f64 * 0.001, TransferType::Bulk, endpoint, phase)
//!         .with_urb_id(UrbId(n))
//!         .with_payload(payload)
//! };
//! let frames = vec![
//!     frame(1, Endpoint::BULK_OUT, UrbPhase::Submit, vec![0x0C, 0x01, 0x02, 0x00]),
//!     frame(2, Endpoint::BULK_OUT, UrbPhase::Complete, vec![]),
//!     frame(3, Endpoint::BULK_IN, UrbPhase::Complete, vec![0x41, 0x01, 0x00, 0x00]),
//!     frame(4, Endpoint::BULK_IN, UrbPhase::Submit, vec![]),
//! ];
//!
//! let tagged = tag(&split(frames));
//! assert!(tagged.iter().all(|tf| tf.transaction_id == 1));
//! assert!(tagged[0].tags.contains(&TransactionTag::BulkCommandResponse));
//! ```
//!
//! Splitting never drops, duplicates or reorders frames. Sessions are independent, so
//! callers may split several sessions in parallel, each with its own
//! [`TransactionSplitter`].

mod splitter;
mod stats;
mod tagger;
mod transaction;

pub use splitter::{TransactionFrame, TransactionId, TransactionSplitter, split, split_with_config};
pub use stats::{
    OrderingReport, SizeDistribution, TransactionStats, transaction_stats, validate_ordering,
};
pub use tagger::{TagSet, TaggedFrame, TransactionTag, tag, tag_transaction, tag_with_config};
pub use transaction::{Transaction, group_transactions};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FrameBuilder, arbitrary_session};
    use crate::CaptureConfig;

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_split_preserves_frames(frames in arbitrary_session(64)) {
            let numbers: Vec<u64> = frames.iter().map(|f| f.frame_number).collect();
            let split = split(frames.clone());
            prop_assert_eq!(split.len(), frames.len());
            let after: Vec<u64> = split.iter().map(|tf| tf.frame.frame_number).collect();
            prop_assert_eq!(after, numbers);
            for (tf, original) in split.iter().zip(&frames) {
                prop_assert_eq!(&tf.frame, original);
            }
        }

        #[test]
        fn prop_transaction_ids_are_monotonic(frames in arbitrary_session(64)) {
            let split = split(frames);
            if let Some(first) = split.first() {
                prop_assert_eq!(first.transaction_id, 1);
            }
            prop_assert!(split.windows(2).all(|w| w[0].transaction_id <= w[1].transaction_id));
            prop_assert!(split.windows(2).all(|w| w[1].transaction_id - w[0].transaction_id <= 1));
            prop_assert!(validate_ordering(&split).is_valid());
        }

        #[test]
        fn prop_tagging_is_idempotent(frames in arbitrary_session(64)) {
            let split = split(frames);
            let once = tag(&split);
            let twice = tag(&split);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_cancellation_never_opens(frames in arbitrary_session(32), at in any::<prop::sample::Index>()) {
            prop_assume!(frames.len() > 1);
            let mut frames = frames;
            let index = 1 + at.index(frames.len() - 1);
            frames[index].urb_status = CaptureConfig::default().cancel_status;

            let split = split(frames);
            prop_assert_eq!(split[index].transaction_id, split[index - 1].transaction_id);
            let tagged = tag(&split);
            prop_assert!(tagged[index].tags.contains(&TransactionTag::Cancellation));
        }

        #[test]
        fn prop_stats_account_for_every_frame(frames in arbitrary_session(64)) {
            let split = split(frames);
            let stats = transaction_stats(&split);
            prop_assert_eq!(stats.total_frames, split.len());
            let buckets = stats.size_distribution;
            prop_assert_eq!(
                buckets.single_frame + buckets.two_to_four_frames + buckets.five_plus_frames,
                stats.total_transactions
            );
            prop_assert_eq!(
                stats.total_transactions,
                split.last().map_or(0, |tf| tf.transaction_id as usize)
            );
        }
    }

    #[test]
    fn reused_urb_id_starts_a_new_transaction() {
        let mut b = FrameBuilder::new();
        let frames = vec![
            b.control_submit(5, 0x06),
            b.control_complete(5),
            b.control_submit(6, 0x00),
            b.control_complete(6),
            b.control_submit(5, 0x06),
            b.control_complete(5),
        ];
        let split = split(frames);
        let first = split[0].transaction_id;
        let reused = split[4].transaction_id;
        assert_ne!(first, reused);
        assert_eq!(split[5].transaction_id, reused);
    }

    #[test]
    fn cancelled_frame_tags_its_transaction() {
        let mut b = FrameBuilder::new();
        let mut frames = b.command_cycles(1);
        frames.push(b.cancelled(0xB));
        let transactions = group_transactions(&split(frames), &CaptureConfig::default());
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].has_tag(TransactionTag::Cancellation));
        assert!(!transactions[0].has_tag(TransactionTag::SingleFrame));
    }
}
