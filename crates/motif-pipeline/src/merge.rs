//! Cross-group overlap arbitration on labeled contours.
//!
//! After grouping has run at a larger scale, distinct groups can still
//! claim geometrically overlapping contours (the same ornament traced
//! from two edge maps, say). This module resolves those conflicts by
//! weighted dominance:
//!
//! 1. **Weight arbitration** — every record pair is tested with the
//!    same overlap predicate as [`crate::overlap`]; on overlap the
//!    record with the smaller current weight is zeroed and the ordered
//!    label pair `(losing, winning)` is recorded as evidence.
//! 2. **Relabel qualification** — a distinct evidence pair qualifies
//!    when it accounts for at least half of the losing label's records.
//!    Qualifying pairs are unioned in a disjoint-set over labels.
//! 3. **Relabeling** — zero-weight records are dropped; each surviving
//!    record's label is remapped to the smallest original label of its
//!    merged set. No label is ever invented.
//!
//! Input records are never mutated: all bookkeeping happens on local
//! working copies, and fresh records are built for the output. Merges
//! and removals are monotonic — the number of distinct labels never
//! grows, and a zeroed record never re-enters.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::overlap::{overlap_profile, profiles_overlap};
use crate::types::{Contour, PipelineError};

/// Opaque group identity carried by a [`LabeledContour`].
pub type GroupLabel = u32;

/// A qualifying evidence pair must account for at least this fraction
/// of the losing label's records.
pub const MERGE_EVIDENCE_RATIO: f64 = 0.5;

/// A contour annotated with its group identity and the group's weight
/// (member count, used as a confidence proxy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledContour {
    /// The contour geometry.
    pub contour: Contour,
    /// Group identity. Opaque; only equality and ordering are used.
    pub label: GroupLabel,
    /// Group weight at the time of labeling.
    pub weight: u32,
}

/// Resolve cross-group overlaps by weighted dominance.
///
/// Returns the surviving records in input order, relabeled where
/// qualifying evidence merged their labels. When two overlapping
/// records carry equal current weights, the record with the lower
/// label loses; if the labels are equal too, the later record in
/// iteration order loses.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateContour`] if any record's
/// contour has an undefined centroid. Such contours must be excluded
/// during extraction, before labeling.
pub fn merge_overlapping_groups(
    records: Vec<LabeledContour>,
) -> Result<Vec<LabeledContour>, PipelineError> {
    let profiles = records
        .iter()
        .map(|r| overlap_profile(&r.contour))
        .collect::<Result<Vec<_>, _>>()?;

    // Phase 1: pairwise weight arbitration on a working copy.
    // Comparisons see current working weights, so a record zeroed in
    // an earlier pair keeps losing later ones.
    let mut weights: Vec<u32> = records.iter().map(|r| r.weight).collect();
    let mut evidence: Vec<(GroupLabel, GroupLabel)> = Vec::new();
    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            if !profiles_overlap(profiles[i], profiles[j]) {
                continue;
            }
            let loser = match weights[i].cmp(&weights[j]) {
                std::cmp::Ordering::Greater => j,
                std::cmp::Ordering::Less => i,
                std::cmp::Ordering::Equal => {
                    // Documented tie-break: lower label loses; equal
                    // labels drop the later record.
                    match records[i].label.cmp(&records[j].label) {
                        std::cmp::Ordering::Less => i,
                        _ => j,
                    }
                }
            };
            let winner = if loser == i { j } else { i };
            weights[loser] = 0;
            evidence.push((records[loser].label, records[winner].label));
        }
    }

    // Phase 2: qualify distinct evidence pairs (first-occurrence
    // order) and union the qualifying label pairs.
    let universe: Vec<GroupLabel> = records
        .iter()
        .map(|r| r.label)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index_of: HashMap<GroupLabel, usize> =
        universe.iter().enumerate().map(|(i, &l)| (l, i)).collect();

    let mut union_find = UnionFind::<usize>::new(universe.len());
    let mut seen: Vec<(GroupLabel, GroupLabel)> = Vec::new();
    for &pair in &evidence {
        if seen.contains(&pair) {
            continue;
        }
        seen.push(pair);
        let (losing, winning) = pair;
        let overlap_times = evidence.iter().filter(|&&p| p == pair).count();
        let losing_count = records.iter().filter(|r| r.label == losing).count();
        #[allow(clippy::cast_precision_loss)]
        let qualifies = overlap_times as f64 >= MERGE_EVIDENCE_RATIO * losing_count as f64;
        if qualifies {
            union_find.union(index_of[&losing], index_of[&winning]);
        }
    }

    // Canonical label per merged set: its smallest original label.
    // `universe` is ascending, so the first label seen per root wins.
    let mut canonical: BTreeMap<usize, GroupLabel> = BTreeMap::new();
    for (i, &label) in universe.iter().enumerate() {
        let root = union_find.find_mut(i);
        canonical.entry(root).or_insert(label);
    }

    // Phase 3: drop zeroed records, remap surviving labels.
    let mut survivors = Vec::new();
    for (i, record) in records.into_iter().enumerate() {
        if weights[i] == 0 {
            continue;
        }
        let root = union_find.find_mut(index_of[&record.label]);
        survivors.push(LabeledContour {
            contour: record.contour,
            label: canonical[&root],
            weight: weights[i],
        });
    }
    Ok(survivors)
}
