//! geoanchor CLI - cluster GPS observation files into anchor coordinates
//!
//! Usage:
//!   geoanchor-cli cluster --radius <km> -i <in> -o <out> [-i <in> -o <out> ...]
//!   geoanchor-cli stats --radius <km> -i <in> [...]
//!   geoanchor-cli generate --output <file> [--anchors <n>] [--observations <n>]

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use geoanchor::synthetic::SyntheticScenario;
use geoanchor::{
    ClusterConfig, ClusterReport, CoordinateSet, DistanceMode, Result, cluster_with_config,
    run_with_config,
};

#[derive(Parser)]
#[command(name = "geoanchor-cli")]
#[command(about = "Cluster GPS start/end observations into anchor coordinates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster input files and write rewritten copies
    Cluster {
        #[command(flatten)]
        clustering: ClusterArgs,

        /// Output file for each input, in the same order
        #[arg(short, long = "output", required = true)]
        outputs: Vec<PathBuf>,

        /// Fail when a cluster does not converge
        #[arg(long)]
        strict: bool,

        /// Write a JSON cluster report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Cluster input files and print a summary without writing anything
    Stats {
        #[command(flatten)]
        clustering: ClusterArgs,

        /// Number of largest clusters to list
        #[arg(long, default_value = "10")]
        top: usize,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a synthetic observation file
    Generate {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of true anchors
        #[arg(long, default_value = "5")]
        anchors: usize,

        /// Number of observation lines
        #[arg(long, default_value = "200")]
        observations: usize,

        /// GPS noise standard deviation in km
        #[arg(long, default_value = "0.05")]
        noise_km: f64,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Args)]
struct ClusterArgs {
    /// Observation files (segment_id<TAB>x y)
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// Clustering radius in km (overrides the config file)
    #[arg(short, long)]
    radius: Option<f64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum refinement iterations per cluster
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Keep coordinate signs in the distance metric
    #[arg(long)]
    signed: bool,
}

impl ClusterArgs {
    /// Config file first, then flags on top.
    fn config(&self) -> Result<ClusterConfig> {
        let mut config = match &self.config {
            Some(path) => ClusterConfig::from_json_file(path)?,
            None => ClusterConfig::default(),
        };
        if let Some(radius) = self.radius {
            config.radius_km = radius;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if self.signed {
            config.distance_mode = DistanceMode::Signed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Cluster {
            clustering,
            outputs,
            strict,
            report,
        } => run_cluster(&clustering, &outputs, strict, report.as_ref()),
        Commands::Stats {
            clustering,
            top,
            json,
        } => run_stats(&clustering, top, json),
        Commands::Generate {
            output,
            anchors,
            observations,
            noise_km,
            seed,
        } => run_generate(&output, anchors, observations, noise_km, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cluster(
    args: &ClusterArgs,
    outputs: &[PathBuf],
    strict: bool,
    report: Option<&PathBuf>,
) -> Result<()> {
    let mut config = args.config()?;
    config.strict |= strict;

    let summary = run_with_config(&args.inputs, outputs, &config)?;

    for (path, lines) in summary.outputs.iter().zip(&summary.lines_written) {
        println!("  [OK] {} ({} lines)", path.display(), lines);
    }
    println!(
        "{} distinct coordinates -> {} clusters",
        summary.coordinates.len(),
        summary.cluster_count()
    );

    if let Some(path) = report {
        summary.report(&config).write_json(path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_stats(args: &ClusterArgs, top: usize, json: bool) -> Result<()> {
    let config = args.config()?;
    let coords = CoordinateSet::load(&args.inputs)?;
    let clustering = cluster_with_config(&coords, &config);
    let report = ClusterReport::new(&coords, &clustering, &config);

    if json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "CLUSTERS (radius {} km, {})",
        report.radius_km,
        report.distance_mode.as_str()
    );
    println!("{}", "=".repeat(60));
    println!("  Observations:          {}", report.observations);
    println!("  Distinct coordinates:  {}", report.coordinates);
    println!("  Clusters:              {}", report.cluster_count);
    if report.unconverged > 0 {
        println!("  Unconverged:           {}", report.unconverged);
    }

    println!("\nLargest clusters:");
    for c in report.largest(top) {
        println!(
            "  #{:<4} ({:.6}, {:.6})  {} obs, {} coords, max {:.3} km, {} iter{}",
            c.id,
            c.center.x,
            c.center.y,
            c.observations,
            c.members,
            c.max_distance_km,
            c.iterations,
            if c.converged { "" } else { " [unconverged]" }
        );
    }
    Ok(())
}

fn run_generate(
    output: &PathBuf,
    anchors: usize,
    observations: usize,
    noise_km: f64,
    seed: u64,
) -> Result<()> {
    let scenario = SyntheticScenario {
        anchor_count: anchors,
        observation_count: observations,
        noise_km,
        seed,
        ..SyntheticScenario::commuter()
    };
    let dataset = scenario.generate();
    dataset.write(output, scenario.decimals as usize)?;
    println!(
        "Wrote {} observations around {} anchors to {}",
        dataset.observations.len(),
        dataset.anchors.len(),
        output.display()
    );
    Ok(())
}
