use crate::error::{KmeansError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for a single clustering call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmeansConfig {
    /// Number of clusters (`k`).
    pub nclusters: usize,

    /// Upper bound on assignment + update passes.
    pub max_iterations: usize,

    /// Size of the worker pool built for each run.
    pub num_workers: usize,

    /// Stop as soon as a pass changes the membership of at most this many
    /// points. `None` always runs the full `max_iterations` budget.
    pub convergence_threshold: Option<usize>,
}

impl Default for KmeansConfig {
    fn default() -> Self {
        Self {
            nclusters: 5,
            max_iterations: 500,
            num_workers: default_num_workers(),
            convergence_threshold: Some(0),
        }
    }
}

impl KmeansConfig {
    pub fn new(nclusters: usize) -> Self {
        Self {
            nclusters,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: Option<usize>) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Fixed iteration budget, no early exit on convergence.
    pub fn fixed_iterations(self, iterations: usize) -> Self {
        self.with_max_iterations(iterations)
            .with_convergence_threshold(None)
    }

    /// Load config from a YAML file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: KmeansConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Check the configuration against the shape of the input.
    pub fn validate(&self, npoints: usize, nfeatures: usize) -> Result<()> {
        if self.nclusters == 0 {
            return Err(KmeansError::invalid("nclusters must be at least 1"));
        }
        if self.nclusters > npoints {
            return Err(KmeansError::invalid(format!(
                "nclusters ({}) exceeds the number of points ({})",
                self.nclusters, npoints
            )));
        }
        if nfeatures == 0 {
            return Err(KmeansError::invalid("points must have at least one feature"));
        }
        if self.max_iterations == 0 {
            return Err(KmeansError::invalid("max_iterations must be at least 1"));
        }
        if self.num_workers == 0 {
            return Err(KmeansError::invalid("num_workers must be at least 1"));
        }
        Ok(())
    }
}

fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
