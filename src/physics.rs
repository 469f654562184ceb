use crate::agent::{Agent, Bounds};
use crate::maze::{Cell, Maze};
use crate::types::{Direction, Intent};

/// Integrates velocity into position, then pushes a walking agent back out of walls.
///
/// First pass clamps the leading edge into the pre-move cell when the centre entered a wall.
/// Second pass snaps against every blocked side of the cell now occupied: the side matching
/// the movement, and the sides perpendicular to it.
pub fn update_position(agent: &mut Agent, maze: &Maze) {
    let Some(moving) = agent.moving_direction() else {
        return;
    };
    let previous = maze.cell_at(agent.center());
    agent.x += agent.vel_x;
    agent.y += agent.vel_y;

    if agent.can_fly {
        return;
    }

    let entered_wall = maze
        .cell_at(agent.center())
        .map_or(true, |id| maze.cell(id).is_wall());
    if entered_wall {
        if let Some(previous) = previous {
            clamp_to_edge(agent, maze.cell(previous), moving);
        }
    }

    let Some(current) = maze.cell_at(agent.center()) else {
        return;
    };
    let cell = maze.cell(current);
    let blocked: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|&dir| match cell.neighbour(dir) {
            None => true,
            Some(id) => {
                let neighbour = maze.cell(id);
                neighbour.is_wall() && agent.collides_with(neighbour)
            }
        })
        .collect();

    for dir in blocked {
        if dir == moving || dir.is_horizontal() != moving.is_horizontal() {
            clamp_to_edge(agent, cell, dir);
        }
    }
}

fn clamp_to_edge(agent: &mut Agent, cell: &Cell, dir: Direction) {
    match dir {
        Direction::Up => {
            agent.set_top(cell.top());
            agent.vel_y = 0.0;
        }
        Direction::Right => {
            agent.set_right(cell.right());
            agent.vel_x = 0.0;
        }
        Direction::Down => {
            agent.set_bottom(cell.bottom());
            agent.vel_y = 0.0;
        }
        Direction::Left => {
            agent.set_left(cell.left());
            agent.vel_x = 0.0;
        }
    }
}

pub fn apply_friction(agent: &mut Agent, friction: f32, min_speed: f32) {
    agent.vel_x *= friction;
    agent.vel_y *= friction;
    if agent.vel_x.abs() < min_speed {
        agent.vel_x = 0.0;
    }
    if agent.vel_y.abs() < min_speed {
        agent.vel_y = 0.0;
    }
}

/// Accelerates by one unit per active input on each axis still below the agent's speed.
pub fn apply_intent(agent: &mut Agent, intent: Intent) {
    if agent.vel_y.abs() < agent.speed {
        if intent.up {
            agent.vel_y -= 1.0;
        }
        if intent.down {
            agent.vel_y += 1.0;
        }
    }
    if agent.vel_x.abs() < agent.speed {
        if intent.left {
            agent.vel_x -= 1.0;
        }
        if intent.right {
            agent.vel_x += 1.0;
        }
    }
}
