//! Scenario runner - executes forwarding experiments.

use crate::error::SimError;
use crate::scenarios::{ScenarioId, DEFAULT_ROUNDS};
use crate::world::{RunOutcome, SimConfig, SimWorld};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};
use trustnet_core::{ForwardingPolicy, TopologySpec, TrustFeedback};
use trustnet_env::NodeId;

/// Where a run's network comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologySource {
    /// One of the built-in scenarios
    Builtin(ScenarioId),

    /// A network loaded from a JSON description
    Custom { name: String, spec: TopologySpec },
}

impl TopologySource {
    /// Loads a JSON topology description from disk.
    pub fn from_file(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        let spec = TopologySpec::from_json(&json)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Ok(TopologySource::Custom { name, spec })
    }

    pub fn name(&self) -> &str {
        match self {
            TopologySource::Builtin(id) => id.name(),
            TopologySource::Custom { name, .. } => name,
        }
    }

    pub fn spec(&self) -> TopologySpec {
        match self {
            TopologySource::Builtin(id) => id.topology(),
            TopologySource::Custom { spec, .. } => spec.clone(),
        }
    }

    /// Rounds used when the runner does not set any.
    pub fn default_rounds(&self) -> usize {
        match self {
            TopologySource::Builtin(id) => id.default_rounds(),
            TopologySource::Custom { .. } => DEFAULT_ROUNDS,
        }
    }
}

impl From<ScenarioId> for TopologySource {
    fn from(id: ScenarioId) -> Self {
        TopologySource::Builtin(id)
    }
}

/// Results from running a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Scenario (or topology file) that was run
    pub scenario: String,

    /// Configuration the world ran with
    pub config: SimConfig,

    /// Nodes with greed 1
    pub black_holes: Vec<NodeId>,

    /// Counters, ratios, trust summary and traces
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

/// Runs forwarding experiments.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Rounds to run (`None` = the scenario's default)
    rounds: Option<usize>,

    /// Scheduler hop limit
    max_hops: usize,

    /// Forwarding policy for every device
    policy: ForwardingPolicy,

    /// Trust feedback override
    feedback: Option<TrustFeedback>,

    /// Record per-message traces
    record_traces: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        let defaults = SimConfig::default();
        Self {
            seed,
            rounds: None,
            max_hops: defaults.max_hops,
            policy: defaults.policy,
            feedback: None,
            record_traces: false,
        }
    }

    /// Sets the number of rounds.
    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Sets the scheduler hop limit.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Sets the forwarding policy.
    pub fn with_policy(mut self, policy: ForwardingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the policy's default trust feedback.
    pub fn with_feedback(mut self, feedback: TrustFeedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Keeps a trace of every message.
    pub fn with_traces(mut self, record: bool) -> Self {
        self.record_traces = record;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy(&self) -> ForwardingPolicy {
        self.policy
    }

    /// The world configuration this runner would use for `source`.
    pub fn config_for(&self, source: &TopologySource) -> SimConfig {
        SimConfig {
            seed: self.seed,
            rounds: self.rounds.unwrap_or_else(|| source.default_rounds()),
            max_hops: self.max_hops,
            policy: self.policy,
            feedback: self.feedback,
            record_traces: self.record_traces,
        }
    }

    /// Runs one experiment to completion.
    pub fn run(&self, source: &TopologySource) -> Result<RunResult, SimError> {
        info!(
            "▶ Starting scenario: {} (seed={}, policy={})",
            source.name(),
            self.seed,
            self.policy
        );

        let spec = source.spec();
        let config = self.config_for(source);
        let black_holes = spec.black_holes();
        if black_holes.len() == spec.nodes.len() {
            warn!("🔥 every node is a black hole; nothing will be relayed");
        }

        let mut world = SimWorld::new(config.clone(), &spec)?;
        world.run();
        let outcome = world.finish();

        info!(
            "✓ {} / {} complete: ping reliability {}",
            source.name(),
            self.policy,
            trustnet_core::metrics::format_percent(outcome.reliability.ping)
        );

        Ok(RunResult {
            scenario: source.name().to_string(),
            config,
            black_holes,
            outcome,
        })
    }

    /// Runs every policy on the same network and seed.
    pub fn compare(&self, source: &TopologySource) -> Result<Vec<RunResult>, SimError> {
        ForwardingPolicy::all()
            .into_iter()
            .map(|policy| self.clone().with_policy(policy).run(source))
            .collect()
    }
}

/// One independent experiment.
#[derive(Debug, Clone)]
pub struct RunJob {
    pub runner: ScenarioRunner,
    pub source: TopologySource,
}

impl RunJob {
    pub fn new(runner: ScenarioRunner, source: TopologySource) -> Self {
        Self { runner, source }
    }

    pub fn run(&self) -> Result<RunResult, SimError> {
        self.runner.run(&self.source)
    }
}

/// Runs jobs on tokio's blocking pool. Results come back in job order.
///
/// Every job builds its own world, so runs share nothing and each result
/// equals what a sequential run with the same seed produces.
pub async fn run_parallel(jobs: Vec<RunJob>) -> Vec<Result<RunResult, SimError>> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| tokio::task::spawn_blocking(move || job.run()))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(match handle.await {
            Ok(result) => result,
            Err(e) => Err(SimError::Join(e.to_string())),
        });
    }
    results
}

/// Seeds for `count` repetitions starting at `base`.
///
/// The first seed is `base` itself so a single run is reproducible from
/// the seed the user typed.
pub fn seed_sequence(base: u64, count: usize) -> Vec<u64> {
    (0..count as u64)
        .map(|i| {
            if i == 0 {
                base
            } else {
                base ^ i.wrapping_mul(0x9e3779b97f4a7c15)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_runner_defaults_to_scenario_rounds() {
        let runner = ScenarioRunner::new(7);
        let campus = TopologySource::from(ScenarioId::Campus);
        let line = TopologySource::from(ScenarioId::Line);

        assert_eq!(runner.config_for(&campus).rounds, 100);
        assert_eq!(runner.config_for(&line).rounds, 20);
        assert_eq!(runner.clone().with_rounds(5).config_for(&campus).rounds, 5);
        assert_eq!(runner.config_for(&campus).seed, 7);
    }

    #[test]
    fn test_run_line() {
        let result = ScenarioRunner::new(42)
            .with_rounds(10)
            .run(&ScenarioId::Line.into())
            .unwrap();

        assert_eq!(result.scenario, "line");
        assert!(result.black_holes.is_empty());
        assert_eq!(result.outcome.counters.pings_sent, 30);
        assert_eq!(result.outcome.reliability.ping, Some(1.0));
    }

    #[test]
    fn test_compare_runs_every_policy() {
        let results = ScenarioRunner::new(42)
            .with_rounds(5)
            .compare(&ScenarioId::Campus.into())
            .unwrap();

        let policies: Vec<_> = results.iter().map(|r| r.config.policy).collect();
        assert_eq!(policies, ForwardingPolicy::all());
        assert!(results.iter().all(|r| r.config.seed == 42));
        assert!(results.iter().all(|r| r.outcome.counters.pings_sent == 26 * 5));
    }

    #[test]
    fn test_feedback_override_reaches_config() {
        let runner = ScenarioRunner::new(1)
            .with_policy(ForwardingPolicy::TrustWeighted)
            .with_feedback(TrustFeedback::Disabled);
        let config = runner.config_for(&ScenarioId::Line.into());
        assert_eq!(config.effective_feedback(), TrustFeedback::Disabled);
    }

    #[test]
    fn test_custom_topology_from_file() {
        let path = std::env::temp_dir().join(format!("trustnet-{}-pair.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"nodes":[{"id":0},{"id":1,"greed":1.0},{"id":2}],"edges":[[0,1],[1,2]]}"#,
        )
        .unwrap();

        let source = TopologySource::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(source.name().ends_with("pair"));
        assert_eq!(source.default_rounds(), DEFAULT_ROUNDS);
        assert_eq!(source.spec().black_holes(), vec![NodeId(1)]);

        let result = ScenarioRunner::new(3).with_rounds(4).run(&source).unwrap();
        assert_eq!(result.outcome.counters.pings_sent, 12);
    }

    #[test]
    fn test_missing_topology_file() {
        let result = TopologySource::from_file(Path::new("/nonexistent/trustnet.json"));
        assert!(matches!(result, Err(SimError::Io(_))));
    }

    #[test]
    fn test_seed_sequence() {
        let seeds = seed_sequence(42, 8);
        assert_eq!(seeds[0], 42);
        assert_eq!(seeds.iter().collect::<HashSet<_>>().len(), 8);
        assert!(seed_sequence(42, 0).is_empty());
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let jobs: Vec<RunJob> = seed_sequence(9, 3)
            .into_iter()
            .flat_map(|seed| {
                ForwardingPolicy::all().into_iter().map(move |policy| {
                    RunJob::new(
                        ScenarioRunner::new(seed).with_rounds(10).with_policy(policy),
                        ScenarioId::Campus.into(),
                    )
                })
            })
            .collect();

        let sequential: Vec<_> = jobs.iter().map(|job| job.run().unwrap()).collect();
        let parallel: Vec<_> = run_parallel(jobs)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(sequential, parallel);
    }
}
