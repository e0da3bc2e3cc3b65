//! Ordering checks and size statistics over split output

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{TransactionFrame, TransactionId};

/// Whether each ordering key is non-decreasing across the split output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingReport {
    pub frame_order: bool,
    pub timestamp_order: bool,
    pub transaction_order: bool,
}

impl OrderingReport {
    pub fn is_valid(&self) -> bool {
        self.frame_order && self.timestamp_order && self.transaction_order
    }
}

pub fn validate_ordering(split: &[TransactionFrame]) -> OrderingReport {
    let pairs = || split.windows(2).map(|w| (&w[0], &w[1]));
    OrderingReport {
        frame_order: pairs().all(|(a, b)| a.frame.frame_number <= b.frame.frame_number),
        timestamp_order: pairs().all(|(a, b)| a.frame.timestamp <= b.frame.timestamp),
        transaction_order: pairs().all(|(a, b)| a.transaction_id <= b.transaction_id),
    }
}

/// Transactions bucketed by member count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDistribution {
    pub single_frame: usize,
    pub two_to_four_frames: usize,
    pub five_plus_frames: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionStats {
    pub total_transactions: usize,
    pub total_frames: usize,
    pub avg_frames_per_transaction: f64,
    pub size_distribution: SizeDistribution,
    pub largest_transaction_size: usize,
}

pub fn transaction_stats(split: &[TransactionFrame]) -> TransactionStats {
    let mut sizes: BTreeMap<TransactionId, usize> = BTreeMap::new();
    for tf in split {
        *sizes.entry(tf.transaction_id).or_default() += 1;
    }

    let mut distribution = SizeDistribution::default();
    for &size in sizes.values() {
        match size {
            1 => distribution.single_frame += 1,
            2..=4 => distribution.two_to_four_frames += 1,
            _ => distribution.five_plus_frames += 1,
        }
    }

    let total_transactions = sizes.len();
    TransactionStats {
        total_transactions,
        total_frames: split.len(),
        avg_frames_per_transaction: if total_transactions == 0 {
            0.0
        } else {
            split.len() as f64 / total_transactions as f64
        },
        size_distribution: distribution,
        largest_transaction_size: sizes.values().copied().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FrameBuilder;
    use crate::transactions::split;

    #[test]
    fn empty_split_is_ordered_and_empty() {
        assert!(validate_ordering(&[]).is_valid());
        assert_eq!(transaction_stats(&[]), TransactionStats::default());
    }

    #[test]
    fn stats_over_command_cycles() {
        let mut b = FrameBuilder::new();
        let mut frames = b.command_cycles(2);
        frames.push(b.cancelled(0xB));
        let split = split(frames);

        let stats = transaction_stats(&split);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.total_frames, 9);
        assert!((stats.avg_frames_per_transaction - 4.5).abs() < f64::EPSILON);
        assert_eq!(
            stats.size_distribution,
            SizeDistribution { single_frame: 0, two_to_four_frames: 1, five_plus_frames: 1 }
        );
        assert_eq!(stats.largest_transaction_size, 5);
        assert!(validate_ordering(&split).is_valid());
    }

    #[test]
    fn detects_each_ordering_violation() {
        let mut b = FrameBuilder::new();
        let mut split = split(b.command_cycles(2));
        split.swap(0, 5);
        let report = validate_ordering(&split);
        assert!(!report.frame_order);
        assert!(!report.timestamp_order);
        assert!(!report.transaction_order);
        assert!(!report.is_valid());
    }
}
