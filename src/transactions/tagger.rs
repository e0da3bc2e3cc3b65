//! Behavioural tags for split transactions

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TransactionFrame, TransactionId, group_transactions};
use crate::types::{Direction, Frame, TransferType, UrbPhase};
use crate::CaptureConfig;

/// Classification attached to a whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionTag {
    ControlOnly,
    BulkOnly,
    MixedComposition,
    SingleFrame,
    Cancellation,
    BulkCommandResponse,
    BulkFragmentedResponse,
    Enumeration,
}

impl TransactionTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionTag::ControlOnly => "CONTROL_ONLY",
            TransactionTag::BulkOnly => "BULK_ONLY",
            TransactionTag::MixedComposition => "MIXED_COMPOSITION",
            TransactionTag::SingleFrame => "SINGLE_FRAME",
            TransactionTag::Cancellation => "CANCELLATION",
            TransactionTag::BulkCommandResponse => "BULK_COMMAND_RESPONSE",
            TransactionTag::BulkFragmentedResponse => "BULK_FRAGMENTED_RESPONSE",
            TransactionTag::Enumeration => "ENUMERATION",
        }
    }
}

impl fmt::Display for TransactionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type TagSet = BTreeSet<TransactionTag>;

/// A split frame with the tags of its transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedFrame {
    pub transaction_id: TransactionId,
    pub frame: Frame,
    pub tags: TagSet,
}

/// Tag the member frames of one transaction.
///
/// Never fails: a transaction matching no pattern gets only its composition tag, or
/// none at all if it holds neither control nor bulk transfers.
pub fn tag_transaction<'a>(
    frames: impl IntoIterator<Item = &'a Frame>,
    config: &CaptureConfig,
) -> TagSet {
    let mut tags = TagSet::new();
    let mut count = 0usize;
    let mut has_control = false;
    let mut has_bulk = false;
    let mut other_types = false;
    let mut out_submits = 0usize;
    let mut in_completes = 0usize;
    let mut enumeration_request = false;

    for frame in frames {
        count += 1;
        match frame.transfer_type {
            TransferType::Control => has_control = true,
            TransferType::Bulk => has_bulk = true,
            TransferType::Interrupt | TransferType::Isochronous => other_types = true,
        }
        match (frame.direction(), frame.urb_phase) {
            (Direction::Out, UrbPhase::Submit) => out_submits += 1,
            (Direction::In, UrbPhase::Complete) => in_completes += 1,
            _ => {}
        }
        if config.is_cancelled(frame) {
            tags.insert(TransactionTag::Cancellation);
        }
        if frame.setup.is_some_and(|setup| setup.request.is_enumeration()) {
            enumeration_request = true;
        }
    }

    let control_only = has_control && !has_bulk && !other_types;
    let bulk_only = has_bulk && !has_control && !other_types;

    if control_only {
        tags.insert(TransactionTag::ControlOnly);
        if enumeration_request {
            tags.insert(TransactionTag::Enumeration);
        }
    }
    if bulk_only {
        tags.insert(TransactionTag::BulkOnly);
        match (out_submits, in_completes) {
            (1, 1) => {
                tags.insert(TransactionTag::BulkCommandResponse);
            }
            (1, n) if n > 1 => {
                tags.insert(TransactionTag::BulkFragmentedResponse);
            }
            _ => {}
        }
    }
    if has_control && has_bulk {
        tags.insert(TransactionTag::MixedComposition);
    }
    if count == 1 {
        tags.insert(TransactionTag::SingleFrame);
    }
    tags
}

/// Tag split frames with the default capture encoding.
pub fn tag(split: &[TransactionFrame]) -> Vec<TaggedFrame> {
    tag_with_config(split, &CaptureConfig::default())
}

/// Tag split frames, grouping them by transaction id.
///
/// Output order and membership match the input.
pub fn tag_with_config(split: &[TransactionFrame], config: &CaptureConfig) -> Vec<TaggedFrame> {
    let by_id: HashMap<TransactionId, TagSet> = group_transactions(split, config)
        .into_iter()
        .map(|transaction| (transaction.id, transaction.tags))
        .collect();
    debug!("Tagged {} frames across {} transactions", split.len(), by_id.len());

    split
        .iter()
        .map(|tf| TaggedFrame {
            transaction_id: tf.transaction_id,
            frame: tf.frame.clone(),
            tags: by_id.get(&tf.transaction_id).cloned().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FrameBuilder;
    use crate::transactions::split;

    fn tags_of(frames: &[Frame]) -> TagSet {
        tag_transaction(frames, &CaptureConfig::default())
    }

    fn set(tags: &[TransactionTag]) -> TagSet {
        tags.iter().copied().collect()
    }

    #[test]
    fn command_with_single_response() {
        let mut b = FrameBuilder::new();
        let frames = [
            b.bulk_out_submit(0xA, &[0x0C, 0x01, 0x02, 0x00]),
            b.bulk_out_complete(0xA),
            b.bulk_in_complete(0xB, &[0x41; 52]),
            b.bulk_in_submit(0xB),
        ];
        assert_eq!(
            tags_of(&frames),
            set(&[TransactionTag::BulkOnly, TransactionTag::BulkCommandResponse])
        );
    }

    #[test]
    fn command_with_fragmented_response() {
        let mut b = FrameBuilder::new();
        let frames = [
            b.bulk_out_submit(0xA, &[0x44, 0x02, 0x01, 0x01]),
            b.bulk_out_complete(0xA),
            b.bulk_in_complete(0xB, &[0x00; 64]),
            b.bulk_in_complete(0xB, &[0x00; 64]),
            b.bulk_in_complete(0xB, &[0x00; 12]),
        ];
        assert_eq!(
            tags_of(&frames),
            set(&[TransactionTag::BulkOnly, TransactionTag::BulkFragmentedResponse])
        );
    }

    #[test]
    fn control_enumeration() {
        let mut b = FrameBuilder::new();
        let frames = [b.control_submit(1, 0x06), b.control_complete(1)];
        assert_eq!(
            tags_of(&frames),
            set(&[TransactionTag::ControlOnly, TransactionTag::Enumeration])
        );
    }

    #[test]
    fn control_without_enumeration_request() {
        let mut b = FrameBuilder::new();
        let frames = [b.control_submit(1, 0x00), b.control_complete(1)];
        assert_eq!(tags_of(&frames), set(&[TransactionTag::ControlOnly]));
    }

    #[test]
    fn single_cancelled_frame() {
        let mut b = FrameBuilder::new();
        let frames = [b.cancelled(3)];
        let tags = tags_of(&frames);
        assert!(tags.contains(&TransactionTag::SingleFrame));
        assert!(tags.contains(&TransactionTag::Cancellation));
    }

    #[test]
    fn mixed_transfer_types() {
        let mut b = FrameBuilder::new();
        let frames = [b.control_submit(1, 0x06), b.bulk_in_complete(2, &[0x00; 4])];
        assert_eq!(tags_of(&frames), set(&[TransactionTag::MixedComposition]));
    }

    #[test]
    fn empty_transaction_has_no_tags() {
        assert!(tags_of(&[]).is_empty());
    }

    #[test]
    fn tag_labels_and_serde_agree() {
        for tag in [
            TransactionTag::ControlOnly,
            TransactionTag::BulkFragmentedResponse,
            TransactionTag::MixedComposition,
        ] {
            let yaml = serde_yaml_ng::to_string(&tag).unwrap();
            assert_eq!(yaml.trim(), tag.as_str());
            assert_eq!(tag.to_string(), tag.as_str());
        }
    }

    #[test]
    fn tag_preserves_order_and_shares_sets() {
        let mut b = FrameBuilder::new();
        let tagged = tag(&split(b.command_cycles(2)));
        assert_eq!(tagged.len(), 8);
        assert!(tagged.windows(2).all(|w| w[0].frame.frame_number < w[1].frame.frame_number));
        assert_eq!(tagged[0].tags, tagged[3].tags);
        assert!(tagged[4].tags.contains(&TransactionTag::BulkCommandResponse));
    }
}
