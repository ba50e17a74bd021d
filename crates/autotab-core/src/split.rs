//! Deterministic train/test splitting.
//!
//! Splits are seeded so that a fit is reproducible end-to-end: the same
//! table, target, and options always produce the same partitions.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shuffle row indices and hold out `test_fraction` of them.
///
/// The held-out count is `ceil(n * test_fraction)`, clamped so that both
/// partitions are non-empty whenever there are at least two rows.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);
    let test_count = held_out_count(n_rows, test_fraction);
    let test = indices.split_off(n_rows - test_count);
    (indices, test)
}

/// Split with per-class proportions preserved.
///
/// Rows are grouped by label, each group is shuffled and held out at
/// `test_fraction` independently. Groups are visited in a deterministic
/// order derived from the label value, so the split is reproducible. A
/// single-member class simply lands entirely in the training partition.
pub fn stratified_split(
    labels: &[f64],
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut groups: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        groups.entry(label_key(*label)).or_default().push(idx);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut group in groups.into_values() {
        group.shuffle(&mut rng);
        let held_out = per_group_count(group.len(), test_fraction);
        let group_test = group.split_off(group.len() - held_out);
        train.extend(group);
        test.extend(group_test);
    }
    (train, test)
}

fn held_out_count(n_rows: usize, test_fraction: f64) -> usize {
    if n_rows == 0 {
        return 0;
    }
    let raw = (n_rows as f64 * test_fraction).ceil() as usize;
    if n_rows >= 2 {
        raw.clamp(1, n_rows - 1)
    } else {
        raw.min(n_rows)
    }
}

fn per_group_count(group_len: usize, test_fraction: f64) -> usize {
    if group_len < 2 {
        return 0;
    }
    let raw = (group_len as f64 * test_fraction).round() as usize;
    raw.clamp(1, group_len - 1)
}

fn label_key(label: f64) -> u64 {
    let normalized = if label == 0.0 { 0.0 } else { label };
    normalized.to_bits()
}
