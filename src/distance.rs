use ndarray::{Array2, ArrayView1};
use wide::{f32x4, f32x8};

/// Reference squared Euclidean distance: plain sum of squared differences.
pub fn squared_distance_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Squared Euclidean distance in 8- and 4-lane chunks with a scalar tail.
/// Agrees with [`squared_distance_scalar`] up to summation-order rounding.
#[inline]
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let dim = a.len().min(b.len());
    let mut j = 0;

    let mut acc8 = f32x8::splat(0.0);
    while j + 8 <= dim {
        let diff = load8(&a[j..j + 8]) - load8(&b[j..j + 8]);
        acc8 += diff * diff;
        j += 8;
    }

    let mut acc4 = f32x4::splat(0.0);
    while j + 4 <= dim {
        let diff = load4(&a[j..j + 4]) - load4(&b[j..j + 4]);
        acc4 += diff * diff;
        j += 4;
    }

    let mut tail = 0.0;
    while j < dim {
        let diff = a[j] - b[j];
        tail += diff * diff;
        j += 1;
    }

    acc8.reduce_add() + acc4.reduce_add() + tail
}

#[inline]
fn load8(s: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; 8];
    lanes.copy_from_slice(s);
    f32x8::from(lanes)
}

#[inline]
fn load4(s: &[f32]) -> f32x4 {
    let mut lanes = [0.0f32; 4];
    lanes.copy_from_slice(s);
    f32x4::from(lanes)
}

#[inline]
fn row_distance(point: &[f32], row: ArrayView1<f32>) -> f32 {
    match row.as_slice() {
        Some(row) => squared_distance(point, row),
        None => point
            .iter()
            .zip(row.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum(),
    }
}

/// Find the centroid closest to `point`.
///
/// Returns `(index, squared_distance)`. The scan is linear and uses a strict
/// comparison, so on ties the lowest centroid index wins.
#[inline]
pub fn find_nearest_center(point: &[f32], centroids: &Array2<f32>) -> (usize, f32) {
    let mut best_c = 0;
    let mut best_dist = f32::INFINITY;

    for (c, row) in centroids.rows().into_iter().enumerate() {
        let dist = row_distance(point, row);
        if dist < best_dist {
            best_dist = dist;
            best_c = c;
        }
    }

    (best_c, best_dist)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dim: usize, scale: f32, offset: f32) -> Vec<f32> {
        (0..dim).map(|i| (i as f32 * scale + offset).sin() * 10.0).collect()
    }

    #[test]
    fn simd_matches_scalar_across_tail_lengths() {
        for dim in 1..=67 {
            let a = ramp(dim, 0.37, 0.0);
            let b = ramp(dim, 0.11, 1.5);
            let scalar = squared_distance_scalar(&a, &b);
            let simd = squared_distance(&a, &b);
            let tol = 1e-5 * scalar.max(1.0);
            assert!(
                (scalar - simd).abs() <= tol,
                "dim={} scalar={} simd={}",
                dim,
                scalar,
                simd
            );
        }
    }

    #[test]
    fn known_distance() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 2.0, 2.0];
        assert_eq!(squared_distance(&a, &b), 9.0);
        assert_eq!(squared_distance_scalar(&a, &b), 9.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn length_mismatch_panics_in_debug() {
        squared_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
    }

    #[test]
    fn nearest_center_picks_closest() {
        let centroids =
            Array2::from_shape_vec((3, 2), vec![0.0, 0.0, 10.0, 10.0, 5.0, 5.0]).unwrap();
        let (idx, dist) = find_nearest_center(&[9.0, 9.0], &centroids);
        assert_eq!(idx, 1);
        assert_eq!(dist, 2.0);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        // (1, 0) is equidistant from all three centroids
        let centroids =
            Array2::from_shape_vec((3, 2), vec![2.0, 0.0, 0.0, 0.0, 2.0, 0.0]).unwrap();
        let (idx, _) = find_nearest_center(&[1.0, 0.0], &centroids);
        assert_eq!(idx, 0);
    }

    #[test]
    fn non_contiguous_centroid_rows_fall_back_to_scalar() {
        let base = Array2::from_shape_vec((2, 3), vec![0.0, 5.0, 1.0, 1.0, 6.0, 1.0]).unwrap();
        // Transposed view: rows are strided
        let centroids = base.t().to_owned();
        let strided = base.t();
        assert!(strided.row(0).as_slice().is_none());
        let (idx, dist) = find_nearest_center(&[5.0, 6.0], &centroids);
        assert_eq!(idx, 1);
        assert_eq!(dist, 0.0);
        assert_eq!(row_distance(&[5.0, 6.0], strided.row(1)), 0.0);
    }
}
