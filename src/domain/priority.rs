//! Sibling priority renormalization
//!
//! Every priority change re-ranks the whole sibling group from scratch:
//! the distinct priority values present are collapsed to dense ranks
//! `0..k` (ascending), then the moved node is shifted by the delta. Gaps
//! left by earlier edits disappear, and tied siblings share one rank, so a
//! single tied member can be moved ahead of or behind its partners.

use std::collections::{BTreeSet, HashMap};

use super::id::NodeId;
use super::node::ParseError;

/// New priority value for one sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub id: NodeId,
    pub priority_group: i64,
}

/// Computes dense ranks for a sibling group and applies `delta` to `target`
///
/// `siblings` holds `(id, current priority)` pairs and should include the
/// target itself. Output order follows input order. The shifted value is
/// not clamped and may fall outside `0..k`, but a delta that overflows
/// `i64` is rejected.
pub fn renormalize(
    siblings: &[(NodeId, i64)],
    target: NodeId,
    delta: i64,
) -> Result<Vec<Rank>, ParseError> {
    let distinct: BTreeSet<i64> = siblings.iter().map(|(_, p)| *p).collect();
    let rank: HashMap<i64, i64> = distinct
        .into_iter()
        .enumerate()
        .map(|(index, value)| (value, index as i64))
        .collect();

    siblings
        .iter()
        .map(|(id, priority)| -> Result<Rank, ParseError> {
            let base = rank[priority];
            let priority_group = if *id == target {
                base.checked_add(delta).ok_or_else(|| ParseError::InvalidNumber {
                    field: "priority delta",
                    value: delta.to_string(),
                })?
            } else {
                base
            };
            Ok(Rank { id: *id, priority_group })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(raw: i64) -> NodeId {
        NodeId::new(raw)
    }

    fn as_pairs(ranks: &[Rank]) -> Vec<(i64, i64)> {
        ranks.iter().map(|r| (r.id.get(), r.priority_group)).collect()
    }

    #[test]
    fn gaps_collapse_to_dense_ranks() {
        let siblings = [(id(1), 0), (id(2), 0), (id(3), 5), (id(4), 9)];
        let ranks = renormalize(&siblings, id(1), 0).unwrap();
        assert_eq!(as_pairs(&ranks), vec![(1, 0), (2, 0), (3, 1), (4, 2)]);
    }

    #[test]
    fn tied_member_moves_away_from_its_partner() {
        // B and C tied at 5, D at 9; bump B by one
        let siblings = [(id(2), 5), (id(3), 5), (id(4), 9)];
        let ranks = renormalize(&siblings, id(2), 1).unwrap();
        assert_eq!(as_pairs(&ranks), vec![(2, 1), (3, 0), (4, 1)]);
    }

    #[test]
    fn lone_node_gets_rank_zero_plus_delta() {
        let ranks = renormalize(&[(id(7), 42)], id(7), -3).unwrap();
        assert_eq!(as_pairs(&ranks), vec![(7, -3)]);
    }

    #[test]
    fn negative_priorities_rank_below_zero_values() {
        let siblings = [(id(1), -10), (id(2), 0), (id(3), 3)];
        let ranks = renormalize(&siblings, id(3), 0).unwrap();
        assert_eq!(as_pairs(&ranks), vec![(1, 0), (2, 1), (3, 2)]);
    }

    #[test]
    fn overflowing_delta_is_rejected() {
        let siblings = [(id(1), 0), (id(2), 5)];
        let err = renormalize(&siblings, id(2), i64::MAX).unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { field: "priority delta", .. }));

        let ranks = renormalize(&siblings, id(1), i64::MIN).unwrap();
        assert_eq!(as_pairs(&ranks), vec![(1, i64::MIN), (2, 1)]);
    }

    fn sibling_set() -> impl Strategy<Value = Vec<(NodeId, i64)>> {
        prop::collection::vec(-50i64..50, 1..12).prop_map(|priorities| {
            priorities
                .into_iter()
                .enumerate()
                .map(|(i, p)| (NodeId::new(i as i64 + 1), p))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn ranks_are_dense_from_zero(siblings in sibling_set(), delta in -5i64..5) {
            let target = siblings[0].0;
            let ranks = renormalize(&siblings, target, delta).unwrap();

            let distinct: BTreeSet<i64> = siblings.iter().map(|(_, p)| *p).collect();
            let assigned: BTreeSet<i64> = ranks
                .iter()
                .filter(|r| r.id != target)
                .map(|r| r.priority_group)
                .collect();

            let k = distinct.len() as i64;
            prop_assert!(assigned.iter().all(|r| (0..k).contains(r)));

            let unshifted = renormalize(&siblings, target, 0).unwrap();
            let all: BTreeSet<i64> = unshifted.iter().map(|r| r.priority_group).collect();
            prop_assert_eq!(all, (0..k).collect::<BTreeSet<_>>());
        }

        #[test]
        fn zero_delta_is_idempotent(siblings in sibling_set()) {
            let target = siblings[0].0;
            let first = renormalize(&siblings, target, 0).unwrap();
            let again: Vec<(NodeId, i64)> = first.iter().map(|r| (r.id, r.priority_group)).collect();
            let second = renormalize(&again, target, 0).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn relative_order_is_preserved(siblings in sibling_set()) {
            let target = siblings[0].0;
            let ranks = renormalize(&siblings, target, 0).unwrap();
            for (a, ra) in siblings.iter().zip(&ranks) {
                for (b, rb) in siblings.iter().zip(&ranks) {
                    prop_assert_eq!(a.1.cmp(&b.1), ra.priority_group.cmp(&rb.priority_group));
                }
            }
        }
    }
}
