use clap::Parser;
use kmeans_kernel::{load_points, DataFormat, KmeansConfig, KmeansEngine};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Cluster a point file with data-parallel k-means.
#[derive(Parser, Debug)]
#[command(name = "kmeans", version)]
struct Args {
    /// File containing the points to cluster
    #[arg(short, long)]
    input: PathBuf,

    /// Input file is in the binary format
    #[arg(short, long)]
    binary: bool,

    /// Number of clusters
    #[arg(short = 'k', long, default_value_t = 5)]
    clusters: usize,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short = 'n', long)]
    threads: Option<usize>,

    /// Number of assignment passes; an upper bound when --threshold is set
    #[arg(long, default_value_t = 1)]
    max_iterations: usize,

    /// Stop early once at most this many points change cluster in a pass
    #[arg(short, long)]
    threshold: Option<usize>,

    /// YAML file with clustering settings; replaces the flags above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final cluster centres
    #[arg(long)]
    print_centers: bool,
}

impl Args {
    fn to_config(&self) -> kmeans_kernel::Result<KmeansConfig> {
        if let Some(path) = &self.config {
            return KmeansConfig::from_file(path);
        }
        let mut config = KmeansConfig::new(self.clusters)
            .with_max_iterations(self.max_iterations)
            .with_convergence_threshold(self.threshold);
        if let Some(threads) = self.threads {
            config = config.with_num_workers(threads);
        }
        Ok(config)
    }
}

fn run(args: &Args) -> kmeans_kernel::Result<()> {
    let format = if args.binary {
        DataFormat::Binary
    } else {
        DataFormat::Ascii
    };
    let points = load_points(&args.input, format)?;
    let config = args.to_config()?;

    let start = Instant::now();
    let output = KmeansEngine::new(config.clone()).run(points.view())?;
    let elapsed = start.elapsed();

    println!("number of Clusters {}", config.nclusters);
    println!("number of Attributes {}", points.ncols());
    println!(
        "{} passes, final delta {}, converged: {}",
        output.iterations, output.delta, output.converged
    );
    println!("Time for clustering: {:.6}s", elapsed.as_secs_f64());

    if args.print_centers {
        println!("\nCluster Centers Output");
        for (c, row) in output.centroids.rows().into_iter().enumerate() {
            let values: Vec<String> = row.iter().map(|v| format!("{:.2}", v)).collect();
            println!("{}: {}", c, values.join(" "));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
