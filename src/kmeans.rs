use crate::accumulator::{try_zeroed, CenterTotals, PartialAccumulator};
use crate::config::KmeansConfig;
use crate::distance::{find_nearest_center, squared_distance_scalar};
use crate::error::{KmeansError, Result};
use ndarray::{s, Array2, ArrayView2};
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

/// Membership value of a point that has not been through an assignment pass.
pub const UNASSIGNED: usize = usize::MAX;

/// Result of a clustering run.
#[derive(Debug, Clone)]
pub struct KmeansOutput {
    /// Shape `(nclusters, nfeatures)`.
    pub centroids: Array2<f32>,
    /// One cluster index per input point.
    pub membership: Vec<usize>,
    /// Points per cluster in the final pass.
    pub cluster_sizes: Vec<usize>,
    /// Number of assignment + update passes performed.
    pub iterations: usize,
    /// Points that changed cluster during the final pass.
    pub delta: usize,
    /// True when the run stopped on the convergence threshold rather than the
    /// iteration budget.
    pub converged: bool,
}

impl KmeansOutput {
    /// Within-cluster sum of squared distances.
    pub fn inertia(&self, points: ArrayView2<f32>) -> f32 {
        points
            .rows()
            .into_iter()
            .zip(&self.membership)
            .map(|(point, &c)| {
                let centroid = self.centroids.row(c);
                match (point.as_slice(), centroid.as_slice()) {
                    (Some(p), Some(q)) => squared_distance_scalar(p, q),
                    _ => point
                        .iter()
                        .zip(centroid.iter())
                        .map(|(x, y)| (x - y) * (x - y))
                        .sum(),
                }
            })
            .sum()
    }
}

/// Data-parallel Lloyd's k-means with a deterministic fork-join reduction.
///
/// Each pass splits the points into `num_workers` contiguous ranges. A worker
/// assigns every point in its range to the nearest centroid and folds it into
/// its own [`PartialAccumulator`]. After the pass the partials are merged
/// serially in worker order and the centroids are recomputed. For a fixed
/// worker count the result is bit-for-bit reproducible.
pub struct KmeansEngine {
    config: KmeansConfig,
}

impl KmeansEngine {
    pub fn new(config: KmeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KmeansConfig {
        &self.config
    }

    /// Cluster `points` (one row per point). Centroids are seeded with the
    /// first `nclusters` points in input order.
    pub fn run(&self, points: ArrayView2<f32>) -> Result<KmeansOutput> {
        let npoints = points.nrows();
        let nfeatures = points.ncols();
        let k = self.config.nclusters;
        self.config.validate(npoints, nfeatures)?;

        let points = points.as_standard_layout();
        let flat = points
            .as_slice()
            .ok_or_else(|| KmeansError::invalid("points are not in row-major layout"))?;

        let workers = self.config.num_workers;
        let chunk_len = npoints.div_ceil(workers);
        let nchunks = npoints.div_ceil(chunk_len);

        info!(
            npoints,
            nfeatures,
            nclusters = k,
            workers,
            max_iterations = self.config.max_iterations,
            "starting k-means"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("kmeans-worker-{i}"))
            .build()?;

        let mut partials = Vec::new();
        partials
            .try_reserve_exact(nchunks)
            .map_err(|source| KmeansError::AllocationFailure {
                what: "worker accumulators",
                source,
            })?;
        for _ in 0..nchunks {
            partials.push(PartialAccumulator::try_new(k, nfeatures)?);
        }
        let mut totals = CenterTotals::try_new(k, nfeatures)?;

        let mut membership: Vec<usize> = try_zeroed(npoints, "membership")?;
        membership.fill(UNASSIGNED);

        let mut centroids = points.slice(s![..k, ..]).to_owned();
        let mut cluster_sizes: Vec<usize> = try_zeroed(k, "cluster sizes")?;
        let mut iterations = 0;
        let mut delta;
        let mut converged = false;

        loop {
            assignment_pass(
                &pool,
                flat,
                nfeatures,
                chunk_len,
                &centroids,
                &mut membership,
                &mut partials,
            );

            delta = totals.merge(&mut partials);
            debug_assert_eq!(totals.total_count(), npoints);
            cluster_sizes.copy_from_slice(totals.counts());
            totals.apply_to(&mut centroids);
            totals.clear();
            iterations += 1;

            debug!(iteration = iterations, delta, "pass complete");

            if let Some(threshold) = self.config.convergence_threshold {
                if delta <= threshold {
                    converged = true;
                    break;
                }
            }
            if iterations >= self.config.max_iterations {
                break;
            }
        }

        let empty = cluster_sizes.iter().filter(|&&n| n == 0).count();
        if empty > 0 {
            warn!(empty, "clusters with no assigned points kept their seed centroid");
        }
        info!(iterations, delta, converged, "k-means finished");

        Ok(KmeansOutput {
            centroids,
            membership,
            cluster_sizes,
            iterations,
            delta,
            converged,
        })
    }
}

/// Cluster `points` with `config`.
pub fn run_kmeans(points: ArrayView2<f32>, config: &KmeansConfig) -> Result<KmeansOutput> {
    KmeansEngine::new(config.clone()).run(points)
}

/// Parallel phase of one pass: each worker owns a contiguous slice of the
/// membership array and one accumulator. Centroids are only read.
fn assignment_pass(
    pool: &ThreadPool,
    points: &[f32],
    nfeatures: usize,
    chunk_len: usize,
    centroids: &Array2<f32>,
    membership: &mut [usize],
    partials: &mut [PartialAccumulator],
) {
    pool.install(|| {
        membership
            .par_chunks_mut(chunk_len)
            .zip(partials.par_iter_mut())
            .enumerate()
            .for_each(|(worker, (labels, acc))| {
                let first = worker * chunk_len;
                for (offset, label) in labels.iter_mut().enumerate() {
                    let start = (first + offset) * nfeatures;
                    let point = &points[start..start + nfeatures];
                    let (nearest, _) = find_nearest_center(point, centroids);
                    if *label != nearest {
                        acc.record_change();
                        *label = nearest;
                    }
                    acc.add(nearest, point);
                }
            });
    });
}
