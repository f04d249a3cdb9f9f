use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Create well-separated clusters with point `i` drawn around centre `i % num_clusters`,
/// so the first `num_clusters` points cover every cluster once.
/// Returns (data, true_labels)
#[allow(dead_code)]
pub fn create_interleaved_clusters(
    num_clusters: usize,
    points_per_cluster: usize,
    dim: usize,
    separation: f32,
    seed: u64,
) -> (Array2<f32>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);

    let total_points = num_clusters * points_per_cluster;
    let mut data = Array2::<f32>::zeros((total_points, dim));
    let mut true_labels = Vec::with_capacity(total_points);

    for idx in 0..total_points {
        let cluster_id = idx % num_clusters;
        true_labels.push(cluster_id);
        for d in 0..dim {
            let center = (cluster_id as f32) * separation + (d as f32) * 0.1;
            let noise: f32 = rng.gen_range(-0.5..0.5);
            data[(idx, d)] = center + noise;
        }
    }

    (data, true_labels)
}

/// Generate deterministic test vectors (for reproducibility)
#[allow(dead_code)]
pub fn create_deterministic_vectors(n: usize, dim: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..n * dim).map(|_| rng.gen_range(-10.0..10.0)).collect();
    Array2::from_shape_vec((n, dim), data).unwrap()
}

/// Calculate squared Euclidean distance
#[allow(dead_code)]
pub fn euclidean_distance_squared(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Within-cluster sum of squares
#[allow(dead_code)]
pub fn calculate_inertia(data: &Array2<f32>, centroids: &Array2<f32>, labels: &[usize]) -> f32 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| euclidean_distance_squared(data.row(i), centroids.row(label)))
        .sum()
}

/// Verify that each point is assigned to its nearest centroid
#[allow(dead_code)]
pub fn verify_optimal_assignment(
    data: &Array2<f32>,
    centroids: &Array2<f32>,
    labels: &[usize],
) -> bool {
    for (i, &assigned_label) in labels.iter().enumerate() {
        let point = data.row(i);
        let assigned_dist = euclidean_distance_squared(point, centroids.row(assigned_label));

        for c in 0..centroids.nrows() {
            let dist = euclidean_distance_squared(point, centroids.row(c));
            if dist < assigned_dist - 1e-4 {
                return false;
            }
        }
    }
    true
}

/// Largest absolute element-wise difference between two matrices
#[allow(dead_code)]
pub fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}
