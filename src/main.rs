//! ColdChain Monitor - Runner
//!
//! Loads a CSV export (or simulates a shipment), runs the detection pipeline
//! and prints the summary counters plus every flagged reading.
//!
//! Usage:
//!   coldchain-monitor --input coldchain_full_dataset.csv
//!   coldchain-monitor --simulate 200 --variant live --stream
//!   coldchain-monitor --input data.csv --output results.jsonl

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use coldchain_core::constants::{self, APP_NAME, APP_VERSION, DEFAULT_N_ESTIMATORS};
use coldchain_core::logic::dataset::{export, load_readings, Reading};
use coldchain_core::logic::features::{FeatureSet, FeatureSummary, LayoutInfo};
use coldchain_core::logic::model::{ForestParams, IsolationForestScorer};
use coldchain_core::logic::pipeline::{DetectionPipeline, EvaluationResult, PipelineConfig, Session};
use coldchain_core::logic::simulator::SensorSimulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// Whole history, weather features, seeded
    Full,
    /// Growing session, internal sensors only
    Live,
}

#[derive(Parser, Debug)]
#[command(name = "coldchain-monitor", version)]
#[command(about = "Flag anomalous cold-chain sensor readings")]
struct Args {
    /// CSV file to load
    #[arg(long, conflicts_with = "simulate")]
    input: Option<PathBuf>,

    /// Generate this many synthetic readings instead of loading a file
    #[arg(long)]
    simulate: Option<usize>,

    /// Seed for the simulator
    #[arg(long, default_value = "7")]
    sim_seed: u64,

    /// Shift temperature by this many °C for the last tenth of the simulated readings
    #[arg(long)]
    excursion: Option<f64>,

    /// Preset to start from
    #[arg(long, value_enum, default_value = "full")]
    variant: Variant,

    /// Override the feature set (minimal | extended)
    #[arg(long)]
    feature_set: Option<FeatureSet>,

    /// Override contamination
    #[arg(long)]
    contamination: Option<f64>,

    /// Override the minimum sample threshold
    #[arg(long)]
    min_samples: Option<usize>,

    /// Override the model seed
    #[arg(long, conflicts_with = "unseeded")]
    seed: Option<u64>,

    /// Drop the model seed
    #[arg(long)]
    unseeded: bool,

    /// Number of isolation trees
    #[arg(long, default_value_t = DEFAULT_N_ESTIMATORS)]
    trees: usize,

    /// Replay readings one at a time through a live session
    #[arg(long)]
    stream: bool,

    /// Write labeled readings here (.csv or .jsonl)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write labeled readings to the default results directory
    #[arg(long, conflicts_with = "output")]
    export: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let config = build_config(&args);
    config.validate().context("invalid pipeline configuration")?;
    for warning in config.warnings() {
        log::warn!("{}", warning);
    }
    log::info!(
        "Pipeline: {} features, contamination {}, min samples {}, seed {:?}",
        config.feature_set,
        config.contamination,
        config.min_samples_for_model,
        config.seed
    );

    let layout = LayoutInfo::of(config.feature_set);
    log::info!(
        "Feature layout v{}: {} features [{}], hash {:08x}",
        layout.version,
        layout.feature_count,
        layout.feature_names.join(", "),
        layout.hash
    );

    let scorer = IsolationForestScorer::new(ForestParams {
        n_estimators: args.trees,
        ..ForestParams::default()
    });
    let readings = collect_readings(&args, config.feature_set)?;

    let result = if args.stream {
        stream(readings, &config, scorer)?
    } else {
        DetectionPipeline::new(scorer).evaluate(&readings, &config).map_err(|e| {
            log::error!("Batch of {} readings rejected: {}", readings.len(), e);
            log::error!("{}", FeatureSummary::from_readings(&readings, config.feature_set));
            e
        })?
    };

    report(&result);

    let output = match (&args.output, args.export) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(export::default_export_path("csv")),
        (None, false) => None,
    };
    if let Some(path) = output {
        export::to_path(&path, &result.labeled_readings)
            .with_context(|| format!("failed to export results to {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    Ok(())
}

/// Preset → env overrides → CLI overrides
fn build_config(args: &Args) -> PipelineConfig {
    let preset = match args.variant {
        Variant::Full => PipelineConfig::full_dataset(),
        Variant::Live => PipelineConfig::live(),
    };

    let mut config = PipelineConfig {
        feature_set: constants::get_feature_set(preset.feature_set),
        contamination: constants::get_contamination(preset.contamination),
        min_samples_for_model: constants::get_min_samples(preset.min_samples_for_model),
        seed: constants::get_seed(preset.seed),
    };

    if let Some(feature_set) = args.feature_set {
        config.feature_set = feature_set;
    }
    if let Some(contamination) = args.contamination {
        config.contamination = contamination;
    }
    if let Some(min_samples) = args.min_samples {
        config.min_samples_for_model = min_samples;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if args.unseeded {
        config.seed = None;
    }

    config
}

fn collect_readings(args: &Args, feature_set: FeatureSet) -> Result<Vec<Reading>> {
    if let Some(path) = &args.input {
        return load_readings(path, feature_set)
            .with_context(|| format!("failed to load {}", path.display()));
    }

    let count = args.simulate.unwrap_or(100);
    let mut sim = SensorSimulator::new(args.sim_seed);
    let normal = count - count / 10;
    let mut readings = sim.generate_batch(normal);

    if let Some(delta) = args.excursion {
        sim.inject_excursion(delta);
    }
    readings.extend(sim.generate_batch(count - normal));

    log::info!("Simulated {} readings (seed {})", readings.len(), args.sim_seed);
    Ok(readings)
}

fn stream(
    readings: Vec<Reading>,
    config: &PipelineConfig,
    scorer: IsolationForestScorer,
) -> Result<EvaluationResult> {
    let mut session = Session::with_scorer(config.clone(), scorer)?;

    for reading in readings {
        let result = session.push(reading)?;
        log::debug!(
            "{} readings, {} ({} anomalies)",
            result.total_count,
            result.state,
            result.anomaly_count
        );
    }

    session
        .latest()
        .cloned()
        .context("no readings to evaluate")
}

fn report(result: &EvaluationResult) {
    println!("Total Records: {}", result.total_count);
    println!("Detected Anomalies: {}", result.anomaly_count);
    println!("State: {}", result.state);

    if let Some(snapshot) = &result.snapshot {
        println!("Snapshot: {} ({} rows)", &snapshot.fingerprint[..12], snapshot.size);
    }

    for (i, r) in result.anomalies() {
        println!(
            "  #{:<5} {}  temp={:>6.2}°C  humidity={:>5.1}%  door={}  score={:.4}",
            i,
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.temperature,
            r.humidity,
            r.door_status.as_deref().unwrap_or("-"),
            r.anomaly_score.unwrap_or_default()
        );
    }
}
