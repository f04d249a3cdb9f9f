use crate::error::{KmeansError, Result};
use ndarray::Array2;

/// Allocate a zero-filled buffer, reporting allocator failure instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize, what: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| KmeansError::AllocationFailure { what, source })?;
    buf.resize(len, T::default());
    Ok(buf)
}

fn sums_len(nclusters: usize, nfeatures: usize) -> Result<usize> {
    nclusters.checked_mul(nfeatures).ok_or_else(|| {
        KmeansError::invalid(format!(
            "{} clusters x {} features overflows the accumulator size",
            nclusters, nfeatures
        ))
    })
}

/// Per-worker running sums and counts for one assignment pass.
///
/// Sums are stored row-major, one row of `nfeatures` values per cluster.
#[derive(Debug, Clone)]
pub struct PartialAccumulator {
    nfeatures: usize,
    sums: Vec<f32>,
    counts: Vec<usize>,
    changed: usize,
}

impl PartialAccumulator {
    pub fn try_new(nclusters: usize, nfeatures: usize) -> Result<Self> {
        let len = sums_len(nclusters, nfeatures)?;
        Ok(Self {
            nfeatures,
            sums: try_zeroed(len, "partial centroid sums")?,
            counts: try_zeroed(nclusters, "partial cluster counts")?,
            changed: 0,
        })
    }

    /// Fold `point` into the running sum of `cluster`.
    #[inline]
    pub fn add(&mut self, cluster: usize, point: &[f32]) {
        self.counts[cluster] += 1;
        let start = cluster * self.nfeatures;
        let row = &mut self.sums[start..start + self.nfeatures];
        for (sum, &x) in row.iter_mut().zip(point) {
            *sum += x;
        }
    }

    /// Note that a point switched cluster during this pass.
    #[inline]
    pub fn record_change(&mut self) {
        self.changed += 1;
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn sum_of(&self, cluster: usize) -> &[f32] {
        let start = cluster * self.nfeatures;
        &self.sums[start..start + self.nfeatures]
    }

    pub fn changed(&self) -> usize {
        self.changed
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn clear(&mut self) {
        self.sums.fill(0.0);
        self.counts.fill(0);
        self.changed = 0;
    }
}

/// Global new-centre totals, produced by the serial merge after each pass.
#[derive(Debug, Clone)]
pub struct CenterTotals {
    nfeatures: usize,
    sums: Vec<f32>,
    counts: Vec<usize>,
}

impl CenterTotals {
    pub fn try_new(nclusters: usize, nfeatures: usize) -> Result<Self> {
        let len = sums_len(nclusters, nfeatures)?;
        Ok(Self {
            nfeatures,
            sums: try_zeroed(len, "centroid totals")?,
            counts: try_zeroed(nclusters, "cluster counts")?,
        })
    }

    /// Sum every worker's partials into the totals, in worker order, and reset
    /// the partials for the next pass. Returns the number of points that
    /// changed cluster across all workers.
    pub fn merge(&mut self, partials: &mut [PartialAccumulator]) -> usize {
        let mut delta = 0;
        for partial in partials.iter_mut() {
            for (total, &count) in self.counts.iter_mut().zip(&partial.counts) {
                *total += count;
            }
            for (total, &sum) in self.sums.iter_mut().zip(&partial.sums) {
                *total += sum;
            }
            delta += partial.changed;
            partial.clear();
        }
        delta
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Replace each centroid with `sum / count`. Clusters with no points
    /// keep their previous centroid.
    pub fn apply_to(&self, centroids: &mut Array2<f32>) {
        for (c, mut row) in centroids.rows_mut().into_iter().enumerate() {
            let count = self.counts[c];
            if count == 0 {
                continue;
            }
            let start = c * self.nfeatures;
            let sums = &self.sums[start..start + self.nfeatures];
            for (dst, &sum) in row.iter_mut().zip(sums) {
                *dst = sum / count as f32;
            }
        }
    }

    pub fn clear(&mut self) {
        self.sums.fill(0.0);
        self.counts.fill(0);
    }
}
