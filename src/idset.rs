//! Ordered id list helpers used to compare follower snapshots

use crate::model::{DiffResult, Identifier};
use std::cmp::Ordering;

/// Sorts ascending and drops duplicates, the form `symmetric_difference` expects
pub fn sort(ids: &mut Vec<Identifier>) {
    ids.sort_unstable();
    ids.dedup();
}

/// Linear merge of two ascending, duplicate free id lists.
///
/// Ids only in `old` are `lost`, ids only in `new` are `gained`. Unsorted input
/// produces garbage, call [`sort`] first.
pub fn symmetric_difference(old: &[Identifier], new: &[Identifier]) -> DiffResult {
    let mut diff = DiffResult::default();
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        match old[i].cmp(&new[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                diff.lost.push(old[i]);
                i += 1;
            }
            Ordering::Greater => {
                diff.gained.push(new[j]);
                j += 1;
            }
        }
    }
    diff.lost.extend_from_slice(&old[i..]);
    diff.gained.extend_from_slice(&new[j..]);
    diff
}
