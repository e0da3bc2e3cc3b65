//! Grouped view of a split session

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{TagSet, TransactionFrame, TransactionId, TransactionTag, tag_transaction};
use crate::types::{Frame, TransferType};
use crate::CaptureConfig;

/// All frames of one transaction together with its tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub frames: Vec<Frame>,
    pub tags: TagSet,
}

impl Transaction {
    pub fn has_tag(&self, tag: TransactionTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Seconds between the first and last member frame.
    pub fn duration(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }

    /// Payload of the first bulk OUT submit, i.e. the command that opened the exchange.
    pub fn command_payload(&self) -> Option<&[u8]> {
        self.frames.iter().find(|frame| frame.is_bulk_command_start()).and_then(Frame::payload)
    }

    /// Payloads of every bulk IN complete, in capture order.
    pub fn response_payloads(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.frames
            .iter()
            .filter(|frame| {
                frame.transfer_type == TransferType::Bulk
                    && frame.endpoint.is_in()
                    && frame.is_complete()
            })
            .filter_map(Frame::payload)
    }
}

/// Group split frames by transaction id, in id order, and tag each group.
pub fn group_transactions(split: &[TransactionFrame], config: &CaptureConfig) -> Vec<Transaction> {
    let mut groups: BTreeMap<TransactionId, Vec<Frame>> = BTreeMap::new();
    for tf in split {
        groups.entry(tf.transaction_id).or_default().push(tf.frame.clone());
    }

    groups
        .into_iter()
        .map(|(id, frames)| {
            let tags = tag_transaction(&frames, config);
            Transaction { id, frames, tags }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FrameBuilder;
    use crate::transactions::split;

    #[test]
    fn groups_follow_transaction_ids() {
        let mut b = FrameBuilder::new();
        let transactions = group_transactions(&split(b.command_cycles(3)), &CaptureConfig::default());
        assert_eq!(transactions.len(), 3);
        assert_eq!(transactions.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(transactions.iter().all(|t| t.frames.len() == 4));
        assert!(transactions.iter().all(|t| t.has_tag(TransactionTag::BulkCommandResponse)));
    }

    #[test]
    fn command_and_response_payloads() {
        let mut b = FrameBuilder::new();
        let frames = vec![
            b.bulk_out_submit(0xA, &[0x0C, 0x01, 0x02, 0x00]),
            b.bulk_out_complete(0xA),
            b.bulk_in_complete(0xB, &[0x41, 0x01, 0x82, 0x02]),
            b.bulk_in_submit(0xB),
        ];
        let transactions = group_transactions(&split(frames), &CaptureConfig::default());
        let transaction = &transactions[0];
        assert_eq!(transaction.command_payload(), Some(&[0x0C, 0x01, 0x02, 0x00][..]));
        assert_eq!(transaction.response_payloads().count(), 1);
        assert!(transaction.duration() > 0.0);
    }

    #[test]
    fn interleaved_ids_are_regrouped() {
        let mut b = FrameBuilder::new();
        let first = b.control_submit(1, 0x06);
        let second = b.control_submit(2, 0x06);
        let third = b.control_complete(1);
        let split = vec![
            TransactionFrame { transaction_id: 1, frame: first },
            TransactionFrame { transaction_id: 2, frame: second },
            TransactionFrame { transaction_id: 1, frame: third },
        ];
        let transactions = group_transactions(&split, &CaptureConfig::default());
        assert_eq!(transactions[0].frames.len(), 2);
        assert_eq!(transactions[1].frames.len(), 1);
        assert!(transactions[1].has_tag(TransactionTag::SingleFrame));
    }
}
