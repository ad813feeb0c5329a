//! Greedy farthest-point selection over min-max normalized features.
//!
//! Normalization is recomputed from the pool on every call, so which points
//! count as "far" depends on the composition of the pool, not only on the
//! points themselves.

/// Rescales every feature column of `points` to roughly `[0, 1]` using the
/// pool's own minimum and maximum; `eps` keeps constant columns finite.
pub fn normalize_features(points: &[&[f64]], eps: f64) -> Vec<Vec<f64>> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let dim = first.len();
    let mut min = vec![f64::INFINITY; dim];
    let mut max = vec![f64::NEG_INFINITY; dim];
    for p in points {
        for (d, &v) in p.iter().enumerate() {
            min[d] = min[d].min(v);
            max[d] = max[d].max(v);
        }
    }
    points
        .iter()
        .map(|p| {
            p.iter()
                .enumerate()
                .map(|(d, &v)| (v - min[d]) / (max[d] - min[d] + eps))
                .collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Selects `k` indices of `points`, starting at `start`, each next pick being
/// the point whose nearest already-selected point is farthest away.
///
/// Ties go to the lowest index and no index is picked twice, even when the
/// pool holds duplicates. Returns every index when `k >= points.len()`.
///
/// # Panics
///
/// Panics if `start` is out of range for a non-empty pool.
pub fn farthest_point_indices(points: &[Vec<f64>], k: usize, start: usize) -> Vec<usize> {
    let n = points.len();
    if k >= n {
        return (0..n).collect();
    }
    if k == 0 {
        return Vec::new();
    }
    assert!(start < n, "start index {start} out of range for {n} points");

    let mut nearest = vec![f64::INFINITY; n];
    let mut taken = vec![false; n];
    let mut selected = Vec::with_capacity(k);
    let mut current = start;
    loop {
        selected.push(current);
        taken[current] = true;
        if selected.len() == k {
            break;
        }
        let mut best = 0;
        let mut best_dist = f64::NEG_INFINITY;
        for (i, p) in points.iter().enumerate() {
            let d = squared_distance(p, &points[current]);
            if d < nearest[i] {
                nearest[i] = d;
            }
            if !taken[i] && nearest[i] > best_dist {
                best_dist = nearest[i];
                best = i;
            }
        }
        current = best;
    }
    selected
}
