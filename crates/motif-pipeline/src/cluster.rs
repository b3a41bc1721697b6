//! Multi-axis feature clustering and composite group formation.
//!
//! Three independent clusterings — by size, by shape, by color — each
//! assign an integer label per contour. The three label sequences are
//! zipped into composite labels; contours sharing a composite label
//! form one group, and composite labels seen only once are dropped as
//! unclustered singletons.
//!
//! # Strategy pattern
//!
//! The clustering algorithm itself is pluggable: the
//! [`FeatureClustering`] trait takes a feature list and a cut policy
//! and returns one label per position. The [`ClustererKind`] enum
//! selects an implementation at runtime; the default is a
//! deterministic average-linkage agglomerative clustering, so the
//! grouping engine is testable end to end.
//!
//! Label values are arbitrary identifiers, stable only within a single
//! call. They are never comparable across axes or batches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::FeatureRecord;
use crate::types::PipelineError;

/// Minimum number of contours worth clustering. Callers with fewer
/// candidates should report an insufficient batch instead of invoking
/// this module.
pub const MIN_CLUSTER_CANDIDATES: usize = 4;

/// Minimum member count for a composite-label group.
pub const MIN_GROUP_SIZE: usize = 2;

/// Where to cut the cluster dendrogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CutPolicy {
    /// Merge while the linkage distance stays within this fraction of
    /// the maximum pairwise distance in the batch. Scale-free; the
    /// fraction must be in `(0, 1]`.
    Relative(f64),
    /// Merge while the linkage distance stays within this absolute
    /// threshold. Must be finite and non-negative.
    Absolute(f64),
}

impl Default for CutPolicy {
    fn default() -> Self {
        Self::Relative(0.25)
    }
}

/// Cut policy per feature axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisCuts {
    /// Cut for the size axis.
    pub size: CutPolicy,
    /// Cut for the shape axis.
    pub shape: CutPolicy,
    /// Cut for the color axis.
    pub color: CutPolicy,
}

/// Trait for clustering strategies over one feature axis.
///
/// Input: one feature vector per contour, all the same length.
/// Output: one label per input position. Implementations must be
/// deterministic for a fixed input and cut policy.
pub trait FeatureClustering {
    /// Assign a cluster label to every feature vector.
    ///
    /// # Errors
    ///
    /// Implementations reject malformed input — ragged vector lengths
    /// or non-finite values — rather than guessing.
    fn cluster(&self, features: &[Vec<f64>], cut: CutPolicy) -> Result<Vec<usize>, PipelineError>;
}

/// Selects which clustering implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClustererKind {
    /// Deterministic average-linkage agglomerative clustering.
    ///
    /// Repeatedly merges the pair of clusters with the smallest mean
    /// inter-cluster distance while that distance stays within the cut
    /// threshold. Ties merge the lowest-index pair first; labels are
    /// assigned in order of first member appearance.
    #[default]
    Agglomerative,
}

impl FeatureClustering for ClustererKind {
    fn cluster(&self, features: &[Vec<f64>], cut: CutPolicy) -> Result<Vec<usize>, PipelineError> {
        match *self {
            Self::Agglomerative => agglomerative(features, cut),
        }
    }
}

/// One group of co-clustered contours: the indices (into the
/// clustering input) of every record sharing one composite label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Member indices, in input order. Always at least
    /// [`MIN_GROUP_SIZE`] entries.
    pub members: Vec<usize>,
}

impl Group {
    /// Group weight: the member count.
    #[must_use]
    pub fn weight(&self) -> usize {
        self.members.len()
    }
}

/// Cluster feature records on all three axes and form composite-label
/// groups.
///
/// Each axis is clustered independently; the per-position labels are
/// zipped into `(size, shape, color)` composite labels, and every
/// composite label carried by at least [`MIN_GROUP_SIZE`] records
/// becomes one [`Group`]. Groups are returned ordered by their first
/// member index; callers must rely on membership only, not on group
/// order.
///
/// # Errors
///
/// Propagates clustering errors, and returns
/// [`PipelineError::LabelLengthMismatch`] if an implementation returns
/// the wrong number of labels.
pub fn cluster_groups<C: FeatureClustering + ?Sized>(
    clusterer: &C,
    records: &[FeatureRecord],
    cuts: &AxisCuts,
) -> Result<Vec<Group>, PipelineError> {
    let size_features: Vec<Vec<f64>> = records.iter().map(|r| vec![r.size]).collect();
    let shape_features: Vec<Vec<f64>> = records.iter().map(|r| r.shape.clone()).collect();
    let color_features: Vec<Vec<f64>> = records.iter().map(|r| r.color.to_vec()).collect();

    let size_labels = run_axis(clusterer, &size_features, cuts.size)?;
    let shape_labels = run_axis(clusterer, &shape_features, cuts.shape)?;
    let color_labels = run_axis(clusterer, &color_features, cuts.color)?;

    let mut by_label: BTreeMap<(usize, usize, usize), Vec<usize>> = BTreeMap::new();
    for (i, ((&s, &h), &c)) in size_labels
        .iter()
        .zip(&shape_labels)
        .zip(&color_labels)
        .enumerate()
    {
        by_label.entry((s, h, c)).or_default().push(i);
    }

    let mut groups: Vec<Group> = by_label
        .into_values()
        .filter(|members| members.len() >= MIN_GROUP_SIZE)
        .map(|members| Group { members })
        .collect();
    groups.sort_by_key(|g| g.members[0]);
    Ok(groups)
}

fn run_axis<C: FeatureClustering + ?Sized>(
    clusterer: &C,
    features: &[Vec<f64>],
    cut: CutPolicy,
) -> Result<Vec<usize>, PipelineError> {
    let labels = clusterer.cluster(features, cut)?;
    if labels.len() == features.len() {
        Ok(labels)
    } else {
        Err(PipelineError::LabelLengthMismatch {
            expected: features.len(),
            actual: labels.len(),
        })
    }
}

/// Deterministic average-linkage agglomerative clustering.
fn agglomerative(features: &[Vec<f64>], cut: CutPolicy) -> Result<Vec<usize>, PipelineError> {
    validate_cut(cut)?;
    let n = features.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let dim = features[0].len();
    for f in features {
        if f.len() != dim {
            return Err(PipelineError::FeatureShapeMismatch {
                expected: dim,
                actual: f.len(),
            });
        }
        if f.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::NonFiniteFeature);
        }
    }

    // Full pairwise distance matrix, and the cut threshold.
    let mut dist = vec![0.0_f64; n * n];
    let mut max_dist = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&features[i], &features[j]);
            dist[i * n + j] = d;
            dist[j * n + i] = d;
            max_dist = max_dist.max(d);
        }
    }
    let threshold = match cut {
        CutPolicy::Relative(fraction) => fraction * max_dist,
        CutPolicy::Absolute(value) => value,
    };

    // Greedy merging: always the closest pair of clusters, lowest
    // indices first on ties.
    let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    while clusters.len() > 1 {
        let mut best: Option<(usize, usize)> = None;
        let mut best_linkage = f64::INFINITY;
        for a in 0..clusters.len() {
            for b in (a + 1)..clusters.len() {
                let linkage = average_linkage(&dist, n, &clusters[a], &clusters[b]);
                if linkage < best_linkage {
                    best_linkage = linkage;
                    best = Some((a, b));
                }
            }
        }
        match best {
            Some((a, b)) if best_linkage <= threshold => {
                let absorbed = clusters.remove(b);
                clusters[a].extend(absorbed);
            }
            _ => break,
        }
    }

    // Labels in order of first member appearance.
    let mut order: Vec<usize> = (0..clusters.len()).collect();
    order.sort_by_key(|&c| clusters[c].iter().copied().min().unwrap_or(0));
    let mut labels = vec![0_usize; n];
    for (label, &c) in order.iter().enumerate() {
        for &member in &clusters[c] {
            labels[member] = label;
        }
    }
    Ok(labels)
}

fn validate_cut(cut: CutPolicy) -> Result<(), PipelineError> {
    match cut {
        CutPolicy::Relative(fraction) if fraction > 0.0 && fraction <= 1.0 => Ok(()),
        CutPolicy::Absolute(value) if value.is_finite() && value >= 0.0 => Ok(()),
        _ => Err(PipelineError::InvalidConfig(format!(
            "invalid cut policy: {cut:?}"
        ))),
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

fn average_linkage(dist: &[f64], n: usize, a: &[usize], b: &[usize]) -> f64 {
    let mut total = 0.0;
    for &i in a {
        for &j in b {
            total += dist[i * n + j];
        }
    }
    #[allow(clippy::cast_precision_loss)]
    {
        total / (a.len() * b.len()) as f64
    }
}
