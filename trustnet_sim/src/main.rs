//! TrustNet Simulator CLI
//!
//! Runs ping/pong traffic over a MANET with black holes and reports how
//! reliably each forwarding policy delivers it.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use trustnet_core::{ForwardingPolicy, TrustFeedback};
use trustnet_sim::report::{render_comparison, render_summary, summary_json};
use trustnet_sim::runner::{run_parallel, seed_sequence, RunJob};
use trustnet_sim::scenarios::ScenarioId;
use trustnet_sim::{RunExport, RunResult, ScenarioRunner, SimError, TopologySource};

#[derive(Parser, Debug)]
#[command(name = "trustnet-sim")]
#[command(about = "Compare MANET forwarding policies under black-hole attacks", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Rounds to run (default: the scenario's own)
    #[arg(short, long)]
    rounds: Option<usize>,

    /// Scenario to run (campus, honest_campus, line, black_hole_relay, isolated, all)
    #[arg(short = 'S', long, default_value = "campus")]
    scenario: String,

    /// Forwarding policy (uniform, greedy, trust, all)
    #[arg(short, long, default_value = "all")]
    policy: String,

    /// Number of seeds to run, starting at --seed
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Longest relay history a message may arrive with
    #[arg(long, default_value = "64")]
    max_hops: usize,

    /// Never update trust scores
    #[arg(long, conflicts_with_all = ["reward", "penalty"])]
    no_feedback: bool,

    /// Trust added to a first hop when the pong comes back
    #[arg(long)]
    reward: Option<f64>,

    /// Trust removed from a first hop when the pong never arrives
    #[arg(long)]
    penalty: Option<f64>,

    /// Load the network from a JSON file instead of a built-in scenario
    #[arg(short, long)]
    topology: Option<PathBuf>,

    /// Run independent experiments on a thread pool
    #[arg(long)]
    parallel: bool,

    /// Record every message's relay history in the export
    #[arg(long)]
    traces: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Export full run data to a JSON file
    #[arg(long)]
    export: Option<String>,
}

impl Args {
    fn sources(&self) -> Result<Vec<TopologySource>, SimError> {
        if let Some(path) = &self.topology {
            return Ok(vec![TopologySource::from_file(path)?]);
        }
        if self.scenario == "all" {
            return Ok(ScenarioId::all().into_iter().map(TopologySource::from).collect());
        }
        let id: ScenarioId = self
            .scenario
            .parse()
            .map_err(|_| SimError::UnknownScenario(self.scenario.clone()))?;
        Ok(vec![id.into()])
    }

    fn policies(&self) -> Result<Vec<ForwardingPolicy>, SimError> {
        if self.policy == "all" {
            return Ok(ForwardingPolicy::all());
        }
        let policy = self
            .policy
            .parse()
            .map_err(|_| SimError::UnknownPolicy(self.policy.clone()))?;
        Ok(vec![policy])
    }

    fn feedback(&self) -> Option<TrustFeedback> {
        if self.no_feedback {
            return Some(TrustFeedback::Disabled);
        }
        if self.reward.is_none() && self.penalty.is_none() {
            return None;
        }
        Some(TrustFeedback::Enabled {
            reward: self.reward.unwrap_or(1.0),
            penalty: self.penalty.unwrap_or(1.0),
        })
    }

    fn base_seed(&self) -> u64 {
        if self.seed != 0 {
            return self.seed;
        }
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    }
}

fn execute(args: &Args) -> Result<Vec<RunResult>, SimError> {
    if args.seeds == 0 {
        return Err(SimError::config("--seeds must be at least 1"));
    }

    let sources = args.sources()?;
    let policies = args.policies()?;
    let feedback = args.feedback();

    let mut jobs = Vec::new();
    for seed in seed_sequence(args.base_seed(), args.seeds) {
        for source in &sources {
            for &policy in &policies {
                let mut runner = ScenarioRunner::new(seed)
                    .with_policy(policy)
                    .with_max_hops(args.max_hops)
                    .with_traces(args.traces);
                if let Some(rounds) = args.rounds {
                    runner = runner.with_rounds(rounds);
                }
                if let Some(feedback) = feedback {
                    runner = runner.with_feedback(feedback);
                }
                jobs.push(RunJob::new(runner, source.clone()));
            }
        }
    }

    if args.parallel {
        info!("Running {} experiments in parallel", jobs.len());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(run_parallel(jobs)).into_iter().collect()
    } else {
        jobs.iter().map(RunJob::run).collect()
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for reports
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("TrustNet Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let results = match execute(&args) {
        Ok(results) => results,
        Err(e) => {
            error!("✗ {}", e);
            eprintln!("Error: {}", e);
            if matches!(e, SimError::UnknownScenario(_)) {
                eprintln!(
                    "Available scenarios: {}, all",
                    ScenarioId::all().iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
                );
            }
            std::process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summary_json(&results)) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for result in &results {
            println!("{}", render_summary(result));
        }
        if results.len() > 1 {
            println!("{}", render_comparison(&results));
        }
    }

    if let Some(path) = &args.export {
        let mut export = RunExport::new();
        for result in results {
            export.add_run(result);
        }
        if let Err(e) = export.write_to_file(path) {
            error!("✗ Export to {} failed: {}", path, e);
            std::process::exit(1);
        }
        info!("✓ Exported {} runs to {}", export.runs.len(), path);
    }
}
