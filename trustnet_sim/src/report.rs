//! Human-readable and JSON summaries of finished runs.

use crate::runner::RunResult;
use serde_json::{json, Value};
use std::fmt::Write;
use trustnet_core::metrics::format_percent;
use trustnet_core::DropReason;

/// Multi-line summary of one run.
pub fn render_summary(result: &RunResult) -> String {
    let c = &result.outcome.counters;
    let r = &result.outcome.reliability;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} | policy={} | seed={} | rounds={}",
        result.scenario, result.config.policy, result.config.seed, result.outcome.rounds
    );
    let _ = writeln!(out, "  Pings sent:        {}", c.pings_sent);
    let _ = writeln!(out, "  Pings received:    {}", c.pings_received);
    let _ = writeln!(out, "  Pongs received:    {}", c.pongs_received);
    let _ = writeln!(out, "  Dropped:           {}", c.dropped);
    for reason in DropReason::all() {
        let count = c.drops_by_reason.get(reason);
        if count > 0 {
            let _ = writeln!(out, "    {:<16} {}", reason.name(), count);
        }
    }
    let _ = writeln!(out, "  Ping Reliability:    {}", format_percent(r.ping));
    let _ = writeln!(out, "  Pong Reliability:    {}", format_percent(r.pong));
    let _ = writeln!(out, "  Overall Reliability: {}", format_percent(r.overall));

    let trust = &result.outcome.trust;
    if trust.black_holes.is_some() {
        let _ = writeln!(
            out,
            "  Mean trust: black holes {} | honest {}",
            format_score(trust.black_holes),
            format_score(trust.honest)
        );
    }

    out
}

/// Side-by-side reliability table, one row per run.
pub fn render_comparison(results: &[RunResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<18} {:<8} {:>20} {:>10} {:>10} {:>10} {:>8}",
        "scenario", "policy", "seed", "ping", "pong", "overall", "dropped"
    );
    let _ = writeln!(out, "{}", "─".repeat(90));

    for result in results {
        let r = &result.outcome.reliability;
        let _ = writeln!(
            out,
            "{:<18} {:<8} {:>20} {:>10} {:>10} {:>10} {:>8}",
            result.scenario,
            result.config.policy.name(),
            result.config.seed,
            format_percent(r.ping),
            format_percent(r.pong),
            format_percent(r.overall),
            result.outcome.counters.dropped
        );
    }

    out
}

/// Compact JSON summary (no traces) for `--json` output.
pub fn summary_json(results: &[RunResult]) -> Value {
    let runs: Vec<Value> = results
        .iter()
        .map(|result| {
            json!({
                "scenario": result.scenario,
                "policy": result.config.policy,
                "seed": result.config.seed,
                "rounds": result.outcome.rounds,
                "counters": result.outcome.counters,
                "reliability": result.outcome.reliability,
                "trust": result.outcome.trust,
            })
        })
        .collect();

    json!({
        "tool": env!("CARGO_PKG_NAME"),
        "runs": runs,
    })
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{:+.2}", s),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioRunner;
    use crate::scenarios::ScenarioId;

    fn line_result() -> RunResult {
        ScenarioRunner::new(42)
            .with_rounds(5)
            .run(&ScenarioId::Line.into())
            .unwrap()
    }

    #[test]
    fn test_summary_shows_ratios() {
        let text = render_summary(&line_result());
        assert!(text.starts_with("line | policy=trust"));
        assert!(text.contains("Pings sent:        15"));
        assert!(text.contains("Ping Reliability:    100.000%"));
        // No black holes, no trust line
        assert!(!text.contains("Mean trust"));
    }

    #[test]
    fn test_summary_lists_drop_reasons() {
        let result = ScenarioRunner::new(42)
            .with_rounds(5)
            .run(&ScenarioId::BlackHoleRelay.into())
            .unwrap();
        let text = render_summary(&result);
        assert!(text.contains("greed"));
        assert!(!text.contains("disconnected"));
        assert!(text.contains("Mean trust: black holes"));
    }

    #[test]
    fn test_undefined_ratio_renders_na() {
        let result = ScenarioRunner::new(42)
            .with_rounds(0)
            .run(&ScenarioId::Line.into())
            .unwrap();
        let text = render_summary(&result);
        assert!(text.contains("Ping Reliability:    n/a"));
    }

    #[test]
    fn test_comparison_has_row_per_run() {
        let results = ScenarioRunner::new(42)
            .with_rounds(2)
            .compare(&ScenarioId::Line.into())
            .unwrap();
        let table = render_comparison(&results);

        assert_eq!(table.lines().count(), 2 + results.len());
        assert!(table.contains("uniform"));
        assert!(table.contains("greedy"));
        assert!(table.contains("trust"));
    }

    #[test]
    fn test_summary_json_shape() {
        let value = summary_json(&[line_result()]);
        assert_eq!(value["runs"][0]["scenario"], "line");
        assert_eq!(value["runs"][0]["counters"]["pings_sent"], 15);
        assert_eq!(value["runs"][0]["reliability"]["ping"], 1.0);
        assert!(value["runs"][0].get("traces").is_none());
    }
}
