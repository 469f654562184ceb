use crate::agent::{Agent, Bounds};
use crate::maze::{CellId, Maze};

use super::go_straight_towards;

/// Targets chosen for one tick of pack pursuit, as indices into the hunter slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackPlan {
    pub alpha: usize,
    pub interceptors: Vec<(usize, CellId)>,
    pub stragglers: Vec<(usize, CellId)>,
}

impl PackPlan {
    pub fn assignments(&self, player_cell: CellId) -> impl Iterator<Item = (usize, CellId)> + '_ {
        std::iter::once((self.alpha, player_cell))
            .chain(self.interceptors.iter().copied())
            .chain(self.stragglers.iter().copied())
    }
}

/// Hunter that walks straight at the player's cell every tick.
pub fn pursue_directly(hunter: &mut Agent, player_cell: CellId, maze: &Maze) {
    hunter.target = Some(player_cell);
    go_straight_towards(hunter, maze.cell(player_cell), hunter.speed);
}

/// The hunter nearest the player chases it; the rest are matched greedily to the player's
/// escape cells, starting with the one it faces. Leftover hunters head for whichever of the
/// player cell and escape cells is nearest to them.
pub fn assign_pack_targets(
    hunters: &[Agent],
    player: &Agent,
    player_cell: CellId,
    maze: &Maze,
) -> Option<PackPlan> {
    let mut by_distance: Vec<usize> = (0..hunters.len()).collect();
    by_distance.sort_by(|&a, &b| {
        hunters[a]
            .pixel_distance(player)
            .total_cmp(&hunters[b].pixel_distance(player))
    });
    let (&alpha, rest) = by_distance.split_first()?;
    let mut remaining = rest.to_vec();

    let facing = player.orientation();
    let points = maze.cell(player_cell).decision_points();
    let escapes: Vec<CellId> = points
        .iter()
        .filter(|dp| dp.direction == facing)
        .chain(points.iter().filter(|dp| dp.direction != facing))
        .map(|dp| dp.cell)
        .collect();

    let mut interceptors = Vec::new();
    for &escape in &escapes {
        let cell = maze.cell(escape);
        remaining.sort_by(|&a, &b| {
            hunters[a]
                .pixel_distance(cell)
                .total_cmp(&hunters[b].pixel_distance(cell))
        });
        if remaining.is_empty() {
            break;
        }
        interceptors.push((remaining.remove(0), escape));
    }

    let stragglers = remaining
        .into_iter()
        .map(|hunter| {
            let nearest = std::iter::once(player_cell)
                .chain(escapes.iter().copied())
                .min_by(|&a, &b| {
                    maze.cell(a)
                        .pixel_distance(&hunters[hunter])
                        .total_cmp(&maze.cell(b).pixel_distance(&hunters[hunter]))
                })
                .unwrap_or(player_cell);
            (hunter, nearest)
        })
        .collect();

    Some(PackPlan {
        alpha,
        interceptors,
        stragglers,
    })
}

pub fn apply_pack_pursuit(
    hunters: &mut [Agent],
    player: &Agent,
    player_cell: CellId,
    maze: &Maze,
    debug: bool,
) {
    let Some(plan) = assign_pack_targets(hunters, player, player_cell, maze) else {
        return;
    };
    if debug {
        log::debug!(
            "pack: alpha {} on {}, {} interceptors, {} stragglers",
            hunters[plan.alpha].id,
            maze.cell(player_cell),
            plan.interceptors.len(),
            plan.stragglers.len()
        );
    }
    for (index, target) in plan.assignments(player_cell) {
        let hunter = &mut hunters[index];
        hunter.target = Some(target);
        go_straight_towards(hunter, maze.cell(target), hunter.speed);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::constants::{CELL_SIZE, DEFAULT_MAZE_LAYOUT};
    use crate::types::{Direction, GridCoord, Point, SpriteDescriptor};

    fn maze() -> Maze {
        Maze::parse(DEFAULT_MAZE_LAYOUT, CELL_SIZE).expect("layout parses")
    }

    fn agent_on(maze: &Maze, x: u32, y: u32, id: &str) -> Agent {
        let sprite = SpriteDescriptor {
            name: id.to_string(),
            frames: 4,
            directional: true,
            pause_on_idle: false,
        };
        let cell = maze.id_at(GridCoord::new(x, y)).expect("in bounds");
        let mut agent = Agent::new(id, Point::default(), sprite, 0.5, 60.0, 60.0, true);
        agent.set_center(maze.cell(cell).center());
        agent
    }

    fn coord(maze: &Maze, id: CellId) -> GridCoord {
        maze.cell(id).coord()
    }

    #[test]
    fn alpha_chases_and_escapes_are_covered_facing_first() {
        let maze = maze();
        let player_cell = maze.center_cell();
        let player = agent_on(&maze, 10, 10, "player");
        assert_eq!(player.orientation(), Direction::Down);

        let hunters = vec![
            agent_on(&maze, 10, 5, "north"),
            agent_on(&maze, 11, 10, "alpha"),
            agent_on(&maze, 15, 10, "east"),
            agent_on(&maze, 10, 15, "south"),
            agent_on(&maze, 5, 10, "west"),
        ];
        let plan = assign_pack_targets(&hunters, &player, player_cell, &maze).expect("hunters");
        assert_eq!(plan.alpha, 1);
        let assigned: Vec<(usize, GridCoord)> = plan
            .interceptors
            .iter()
            .map(|&(hunter, cell)| (hunter, coord(&maze, cell)))
            .collect();
        assert_eq!(
            assigned,
            vec![
                (3, GridCoord::new(10, 11)),
                (0, GridCoord::new(10, 9)),
                (2, GridCoord::new(11, 10)),
                (4, GridCoord::new(9, 10)),
            ]
        );
        assert!(plan.stragglers.is_empty());
    }

    #[test]
    fn no_hunter_is_assigned_twice() {
        let maze = maze();
        let player_cell = maze.center_cell();
        let player = agent_on(&maze, 10, 10, "player");
        for count in 1..=8 {
            let hunters: Vec<Agent> = (0..count)
                .map(|i| agent_on(&maze, 1 + i * 2, 1 + (i % 3) * 6, &format!("h{i}")))
                .collect();
            let plan = assign_pack_targets(&hunters, &player, player_cell, &maze).expect("hunters");
            let assigned: Vec<usize> = plan.assignments(player_cell).map(|(h, _)| h).collect();
            let unique: HashSet<usize> = assigned.iter().copied().collect();
            assert_eq!(assigned.len(), count as usize);
            assert_eq!(unique.len(), count as usize);

            let escapes = maze.cell(player_cell).decision_points().len();
            if count as usize > escapes {
                let covered: HashSet<CellId> =
                    plan.interceptors.iter().map(|&(_, cell)| cell).collect();
                assert_eq!(covered.len(), escapes);
            }
        }
    }

    #[test]
    fn stragglers_head_to_nearest_candidate() {
        let maze = maze();
        let player_cell = maze.center_cell();
        let player = agent_on(&maze, 10, 10, "player");
        let hunters = vec![
            agent_on(&maze, 10, 10, "alpha"),
            agent_on(&maze, 10, 12, "a"),
            agent_on(&maze, 10, 7, "b"),
            agent_on(&maze, 13, 10, "c"),
            agent_on(&maze, 7, 10, "d"),
            agent_on(&maze, 12, 12, "e"),
        ];
        let plan = assign_pack_targets(&hunters, &player, player_cell, &maze).expect("hunters");
        assert_eq!(plan.alpha, 0);
        assert_eq!(plan.stragglers.len(), 1);
        let (hunter, target) = plan.stragglers[0];
        assert_eq!(hunter, 5);
        let target = coord(&maze, target);
        assert!(target == GridCoord::new(10, 11) || target == GridCoord::new(11, 10));
    }

    #[test]
    fn pack_pursuit_steers_every_hunter() {
        let maze = maze();
        let player_cell = maze.center_cell();
        let player = agent_on(&maze, 10, 10, "player");
        let mut hunters = vec![
            agent_on(&maze, 3, 3, "a"),
            agent_on(&maze, 17, 17, "b"),
        ];
        apply_pack_pursuit(&mut hunters, &player, player_cell, &maze, false);
        assert!(hunters.iter().all(|h| h.target.is_some() && h.is_moving()));
        for hunter in &hunters {
            let speed = (hunter.vel_x.powi(2) + hunter.vel_y.powi(2)).sqrt();
            assert!((speed - 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn direct_pursuit_targets_player_cell() {
        let maze = maze();
        let player_cell = maze.center_cell();
        let mut hunter = agent_on(&maze, 1, 1, "h");
        pursue_directly(&mut hunter, player_cell, &maze);
        assert_eq!(hunter.target, Some(player_cell));
        assert!(hunter.vel_x > 0.0 && hunter.vel_y > 0.0);
    }
}
