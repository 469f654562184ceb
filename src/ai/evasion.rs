use crate::agent::{Agent, Bounds};
use crate::constants::ACT_OPTIMALLY_PROBABILITY;
use crate::maze::{CellId, Maze};
use crate::rng::RandomSource;
use crate::types::Direction;

use super::go_straight_towards;

/// Candidate flight target. `direction` is `None` for staying in the current cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FleeOption {
    pub direction: Option<Direction>,
    pub cell: CellId,
    pub profit: i64,
}

fn hops(maze: &Maze, from: CellId, to: CellId) -> i64 {
    i64::from(maze.maze_distance(from, to).unwrap_or(u32::MAX))
}

/// Viable options from `from`, best first. Ties keep decision points ahead of staying put.
pub fn flee_options(maze: &Maze, from: CellId, threat: CellId) -> Vec<FleeOption> {
    let mut options: Vec<FleeOption> = maze
        .cell(from)
        .decision_points()
        .iter()
        .map(|dp| FleeOption {
            direction: Some(dp.direction),
            cell: dp.cell,
            profit: hops(maze, dp.cell, threat) - i64::from(dp.distance),
        })
        .filter(|option| option.profit >= 0)
        .collect();
    options.push(FleeOption {
        direction: None,
        cell: from,
        profit: hops(maze, from, threat),
    });
    options.sort_by(|a, b| b.profit.cmp(&a.profit));
    options
}

/// Keeps walking toward the current target until standing on it, then picks the next
/// flight target among the corridor decision points, away from `threat`.
pub fn flee_smartly(
    agent: &mut Agent,
    threat: CellId,
    maze: &Maze,
    speed: f32,
    rng: &mut dyn RandomSource,
    debug: bool,
) {
    let Some(current) = maze.cell_at(agent.center()) else {
        agent.stop();
        return;
    };
    let reached = agent.target == Some(current)
        && maze.cell(current).pixel_distance(agent) < agent.speed;

    let target = match agent.target {
        Some(target) if !reached => {
            if debug {
                log::debug!(
                    "{} at {}: waiting to reach target, going {:?}",
                    agent.id,
                    maze.cell(current),
                    agent.target_dir
                );
            }
            target
        }
        _ => {
            let chosen = choose_option(agent, current, threat, maze, rng, debug);
            agent.target = Some(chosen.cell);
            agent.target_dir = chosen.direction;
            chosen.cell
        }
    };
    go_straight_towards(agent, maze.cell(target), speed);
}

fn choose_option(
    agent: &Agent,
    current: CellId,
    threat: CellId,
    maze: &Maze,
    rng: &mut dyn RandomSource,
    debug: bool,
) -> FleeOption {
    let options = flee_options(maze, current, threat);
    let (best, others) = match options.split_first() {
        Some((best, others)) => (*best, others),
        None => {
            return FleeOption {
                direction: None,
                cell: current,
                profit: 0,
            }
        }
    };

    let (chosen, optimal) = if best.direction.is_none() || others.is_empty() {
        (best, true)
    } else if rng.bool(ACT_OPTIMALLY_PROBABILITY) {
        (best, true)
    } else {
        (others[rng.pick_index(others.len())], false)
    };

    if debug {
        let choices: Vec<String> = options
            .iter()
            .map(|option| {
                format!(
                    "{:?} -> {} for {}",
                    option.direction,
                    maze.cell(option.cell),
                    option.profit
                )
            })
            .collect();
        log::debug!(
            "{} at {}: {} chosen {:?} -> {} for {}, choices: {:?}",
            agent.id,
            maze.cell(current),
            if optimal { "optimal" } else { "suboptimal" },
            chosen.direction,
            maze.cell(chosen.cell),
            chosen.profit,
            choices
        );
    }
    chosen
}
