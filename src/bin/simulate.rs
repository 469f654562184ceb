use anyhow::Context;
use clap::Parser;
use maze_chase_engine::agent::Bounds;
use maze_chase_engine::constants::{CELL_SIZE, TICK_MS, TOTAL_HUNTERS, TOTAL_PREYS};
use maze_chase_engine::session::{
    GameSession, HunterStrategy, ManualClock, SessionOptions,
};
use maze_chase_engine::types::{GameEvent, Intent, Outcome, TickReport};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 3;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    preys: Option<usize>,
    #[arg(long)]
    hunters: Option<usize>,
    #[arg(long)]
    strategy: Option<String>,
    #[arg(long)]
    layout: Option<PathBuf>,
    #[arg(long)]
    cell_size: Option<f32>,
    #[arg(long)]
    scenarios: Option<usize>,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    options: SessionOptions,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    strategy: String,
    outcome: String,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    ticks: u64,
    captured: usize,
    #[serde(rename = "totalPreys")]
    total_preys: usize,
    #[serde(rename = "captureEvents")]
    capture_events: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();

    let cli = Cli::parse();
    let scenarios = match resolve_scenarios(&cli) {
        Ok(scenarios) => scenarios,
        Err(error) => {
            log::error!("[simulate] {error:#}");
            std::process::exit(2);
        }
    };
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios
        .first()
        .map(|scenario| scenario.options.seed)
        .unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let max_ticks = cli.max_ticks.unwrap_or(DEFAULT_MAX_TICKS);
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        let seed = scenario.options.seed;
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(seed),
            None,
            json!({
                "preys": scenario.options.preys,
                "hunters": scenario.options.hunters,
                "strategy": strategy_key(scenario.options.strategy),
                "maxTicks": max_ticks,
            }),
        );
        let scenario_run = match run_scenario(&scenario, max_ticks) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "scenario_failed",
                    &run_id,
                    Some(&scenario.name),
                    Some(seed),
                    None,
                    json!({ "error": format!("{error:#}") }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *outcome_counts
            .entry(scenario_run.result.outcome.clone())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(seed),
            Some(scenario_run.result.ticks),
            json!({
                "outcome": scenario_run.result.outcome,
                "durationMs": scenario_run.result.duration_ms,
                "captured": scenario_run.result.captured,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => log::error!("[simulate] result line failed to serialize: {error}"),
        }
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": format!("{error:#}"),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn base_options(cli: &Cli) -> anyhow::Result<SessionOptions> {
    let mut options = SessionOptions {
        preys: cli.preys.unwrap_or(TOTAL_PREYS),
        hunters: cli.hunters.unwrap_or(TOTAL_HUNTERS),
        cell_size: cli.cell_size.unwrap_or(CELL_SIZE),
        ..SessionOptions::default()
    };
    if let Some(path) = cli.layout.as_ref() {
        options.layout = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read layout {}", path.display()))?;
    }
    Ok(options)
}

fn resolve_scenarios(cli: &Cli) -> anyhow::Result<Vec<Scenario>> {
    let base = base_options(cli)?;
    let seed = cli.seed.unwrap_or_else(|| now_ms() as u32);
    let fixed_strategy = match cli.strategy.as_deref() {
        Some(raw) => Some(
            HunterStrategy::parse(raw)
                .with_context(|| format!("unknown hunter strategy: {raw}"))?,
        ),
        None => None,
    };
    let count = cli.scenarios.unwrap_or(2).max(1);

    Ok((0..count)
        .map(|index| {
            let strategy = fixed_strategy.unwrap_or(if index % 2 == 0 {
                HunterStrategy::Pack
            } else {
                HunterStrategy::Direct
            });
            Scenario {
                name: format!("{}-{}", strategy_key(strategy), index + 1),
                options: SessionOptions {
                    strategy,
                    seed: seed.wrapping_add(index as u32),
                    ..base.clone()
                },
            }
        })
        .collect())
}

fn run_scenario(scenario: &Scenario, max_ticks: u64) -> anyhow::Result<ScenarioRunResult> {
    let clock = ManualClock::new(0);
    let mut session = GameSession::new(scenario.options.clone(), Box::new(clock.clone()))
        .with_context(|| format!("scenario {} has an invalid layout", scenario.name))?;

    let reports: Arc<Mutex<Vec<TickReport>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    session.set_tick_observer(Box::new(move |report| {
        if let Ok(mut reports) = sink.lock() {
            reports.push(*report);
        }
    }));

    session.assets_loaded();
    session.next_screen();
    session.next_screen();

    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut capture_events = 0usize;
    let mut last_captured = 0usize;

    while session.pending_frame().is_some() && session.tick() < max_ticks {
        session.set_intent(autopilot(&session));
        clock.advance(TICK_MS);
        session.advance();

        let snapshot = session.build_snapshot(true);
        capture_events += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, GameEvent::PreyCaptured { .. }))
            .count();

        let mut messages = collect_session_anomalies(&session);
        let drained: Vec<TickReport> = match reports.lock() {
            Ok(mut reports) => reports.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for report in drained {
            if report.captured < last_captured {
                messages.push(format!(
                    "captured count decreased: {} -> {}",
                    last_captured, report.captured
                ));
            }
            if report.captured > report.total_preys {
                messages.push(format!(
                    "captured {} exceeds total {}",
                    report.captured, report.total_preys
                ));
            }
            last_captured = report.captured;
        }
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                session.tick(),
                message,
            );
        }
    }

    let summary = session.summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.options.seed,
            strategy: strategy_key(scenario.options.strategy).to_string(),
            outcome: outcome_key(summary.outcome).to_string(),
            duration_ms: summary.elapsed_ms,
            ticks: summary.ticks,
            captured: summary.captured,
            total_preys: summary.total_preys,
            capture_events,
            anomalies,
        },
        anomaly_records,
    })
}

/// Walks toward the prey nearest by maze distance, one neighbour cell at a time.
fn autopilot(session: &GameSession) -> Intent {
    let maze = session.maze();
    let Some(player) = session.player() else {
        return Intent::default();
    };
    let Some(here) = maze.cell_at(player.center()) else {
        return Intent::default();
    };
    let nearest = session
        .preys()
        .iter()
        .filter_map(|prey| maze.cell_at(prey.center()).map(|cell| (prey, cell)))
        .min_by_key(|&(_, cell)| maze.maze_distance(here, cell).unwrap_or(u32::MAX));
    let Some((prey, target)) = nearest else {
        return Intent::default();
    };

    if target == here {
        let from = player.center();
        let to = prey.center();
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        return Intent {
            up: dy < -1.0,
            right: dx > 1.0,
            down: dy > 1.0,
            left: dx < -1.0,
        };
    }

    let cell = maze.cell(here);
    cell.allowed_dirs()
        .iter()
        .filter_map(|&dir| cell.neighbour(dir).map(|next| (dir, next)))
        .min_by_key(|&(_, next)| maze.maze_distance(next, target).unwrap_or(u32::MAX))
        .map(|(dir, _)| Intent::toward(dir))
        .unwrap_or_default()
}

fn collect_session_anomalies(session: &GameSession) -> Vec<String> {
    let maze = session.maze();
    let mut anomalies = Vec::new();
    let agents = session
        .player()
        .into_iter()
        .chain(session.preys())
        .chain(session.hunters());
    for agent in agents {
        if !agent.x.is_finite() || !agent.y.is_finite() {
            anomalies.push(format!("non-finite position: {}", agent.id));
            continue;
        }
        if agent.can_fly {
            continue;
        }
        let inside_open = maze
            .cell_at(agent.center())
            .is_some_and(|cell| maze.cell(cell).is_open());
        if !inside_open {
            anomalies.push(format!("walker left the open maze: {}", agent.id));
        }
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    let started_at = chrono::DateTime::from_timestamp_millis(started_at_ms as i64)
        .map(|at| at.to_rfc3339())
        .unwrap_or_default();
    RunSummary {
        run_id,
        started_at,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_ticks,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    let log_level = match level {
        "error" => log::Level::Error,
        "warn" => log::Level::Warn,
        "debug" => log::Level::Debug,
        _ => log::Level::Info,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => log::log!(log_level, "{line}"),
        Err(error) => log::error!("[simulate] structured log failed to serialize: {error}"),
    }
}

fn strategy_key(strategy: HunterStrategy) -> &'static str {
    match strategy {
        HunterStrategy::Pack => "pack",
        HunterStrategy::Direct => "direct",
    }
}

fn outcome_key(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(Outcome::Victory) => "victory",
        Some(Outcome::GameOver) => "game_over",
        None => "unfinished",
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let summary_text =
        serde_json::to_string_pretty(summary).context("run summary should serialize")?;
    std::fs::write(path, summary_text)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(outcome: &str, ticks: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            strategy: "pack".to_string(),
            outcome: outcome.to_string(),
            duration_ms: ticks * TICK_MS,
            ticks,
            captured: 0,
            total_preys: 12,
            capture_events: 0,
            anomalies: Vec::new(),
        }
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("simulate").chain(args.iter().copied()))
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_ticks() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            0,
            2,
            vec![
                make_scenario_result("game_over", 600),
                make_scenario_result("victory", 900),
            ],
            BTreeMap::from([
                ("game_over".to_string(), 1usize),
                ("victory".to_string(), 1usize),
            ]),
            1,
            1500,
        );
        assert_eq!(summary.average_ticks, 750);
        assert_eq!(summary.scenario_count, 2);
        assert!(summary.started_at.starts_with("1970-01-01T00:00:00"));
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result("unfinished", 60)],
            BTreeMap::from([("unfinished".to_string(), 1usize)]),
            0,
            60,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn scenarios_alternate_strategies_unless_fixed() {
        let scenarios = resolve_scenarios(&cli(&["--seed", "7", "--scenarios", "3"]))
            .expect("scenarios resolve");
        let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["pack-1", "direct-2", "pack-3"]);
        assert_eq!(scenarios[2].options.seed, 9);

        let fixed = resolve_scenarios(&cli(&["--seed", "7", "--strategy", "direct"]))
            .expect("scenarios resolve");
        assert!(fixed
            .iter()
            .all(|s| s.options.strategy == HunterStrategy::Direct));
        assert!(resolve_scenarios(&cli(&["--strategy", "swarm"])).is_err());
    }

    #[test]
    fn autopilot_heads_somewhere_when_prey_remain() {
        let mut session = GameSession::new(SessionOptions::default(), Box::new(ManualClock::new(0)))
            .expect("default layout parses");
        assert!(autopilot(&session).is_idle());
        session.assets_loaded();
        session.next_screen();
        session.next_screen();
        assert!(!autopilot(&session).is_idle());
    }

    #[test]
    fn same_seed_replays_the_same_scenario() {
        let scenario = Scenario {
            name: "replay".to_string(),
            options: SessionOptions {
                seed: 1234,
                ..SessionOptions::default()
            },
        };
        let a = run_scenario(&scenario, 240).expect("scenario runs");
        let b = run_scenario(&scenario, 240).expect("scenario runs");
        assert_eq!(a.result.ticks, b.result.ticks);
        assert_eq!(a.result.captured, b.result.captured);
        assert_eq!(a.result.outcome, b.result.outcome);
        assert!(a.result.ticks <= 240);
        assert!(a.result.captured <= a.result.total_preys);
    }
}
