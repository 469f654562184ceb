use crate::agent::{Agent, Bounds};
use crate::constants::{scared_fraction, ARRIVAL_EPSILON};
use crate::maze::Cell;

mod evasion;
mod pursuit;

pub use self::evasion::{flee_options, flee_smartly, FleeOption};
pub use self::pursuit::{apply_pack_pursuit, assign_pack_targets, pursue_directly, PackPlan};

/// Steers in a straight line toward the centre of `target`, stopping once within a pixel of it.
pub fn go_straight_towards(agent: &mut Agent, target: &Cell, speed: f32) {
    if agent.pixel_distance(target) < ARRIVAL_EPSILON {
        agent.stop();
        return;
    }
    let from = agent.center();
    let to = target.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let norm = (dx * dx + dy * dy).sqrt();
    agent.vel_x = dx * speed / norm;
    agent.vel_y = dy * speed / norm;
}

/// Flight speed of a prey standing in `prey_cell` while its pursuer stands in `threat_cell`.
pub fn flight_speed(prey: &Agent, prey_cell: &Cell, threat_cell: &Cell) -> f32 {
    scared_fraction(prey_cell.straight_distance(threat_cell)) * prey.speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::Maze;
    use crate::types::{GridCoord, Point, SpriteDescriptor};

    fn agent(center: Point) -> Agent {
        let sprite = SpriteDescriptor {
            name: "a".to_string(),
            frames: 1,
            directional: false,
            pause_on_idle: false,
        };
        let mut agent = Agent::new("a", Point::default(), sprite, 2.0, 10.0, 10.0, false);
        agent.set_center(center);
        agent
    }

    #[test]
    fn steering_scales_unit_vector_by_speed() {
        let maze = Maze::parse("#####\n#   #\n#   #\n#####", 10.0).expect("layout parses");
        let target = maze.id_at(GridCoord::new(3, 2)).expect("in bounds");
        let mut walker = agent(Point::new(15.0, 15.0));
        go_straight_towards(&mut walker, maze.cell(target), 5.0);
        assert!((walker.vel_x - 4.472136).abs() < 1e-4);
        assert!((walker.vel_y - 2.236068).abs() < 1e-4);
    }

    #[test]
    fn steering_stops_when_already_at_center() {
        let maze = Maze::parse("###\n# #\n###", 10.0).expect("layout parses");
        let cell = maze.id_at(GridCoord::new(1, 1)).expect("in bounds");
        let mut walker = agent(Point::new(15.5, 15.0));
        walker.vel_x = 3.0;
        go_straight_towards(&mut walker, maze.cell(cell), 5.0);
        assert!(!walker.is_moving());
    }

    #[test]
    fn prey_flies_faster_when_threat_is_close() {
        let maze = Maze::parse("#########\n#       #\n#########", 10.0).expect("layout parses");
        let cell = |x| maze.cell(maze.id_at(GridCoord::new(x, 1)).expect("in bounds"));
        let prey = agent(Point::new(15.0, 15.0));
        let close = flight_speed(&prey, cell(1), cell(3));
        let far = flight_speed(&prey, cell(1), cell(7));
        assert!((close - prey.speed).abs() < 1e-6);
        assert!(far < close);
    }
}
