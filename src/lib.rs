pub mod accumulator;
pub mod config;
pub mod distance;
pub mod error;
pub mod kmeans;
pub mod loader;

pub use config::KmeansConfig;
pub use error::{KmeansError, Result};
pub use kmeans::{run_kmeans, KmeansEngine, KmeansOutput, UNASSIGNED};
pub use loader::{load_points, DataFormat};
