use super::*;

use crate::constants::{
    hunter_dimensions, player_dimensions, prey_dimensions, HUNTER_FRAMES, HUNTER_SPEED,
    PLAYER_FRAMES, PLAYER_SPEED, PREY_FRAMES, PREY_SPEED, SPAWN_MIN_MAZE_DISTANCE,
};
use crate::types::{Point, SpriteDescriptor};

fn sprite(name: &str, frames: u32, directional: bool, pause_on_idle: bool) -> SpriteDescriptor {
    SpriteDescriptor {
        name: name.to_string(),
        frames,
        directional,
        pause_on_idle,
    }
}

impl GameSession {
    /// Replaces the whole roster for a new round.
    pub(super) fn spawn_roster(&mut self) {
        let cell_size = self.maze.cell_size();
        let center = self.maze.center_cell();
        let starts = self.starting_cells(center);

        let (width, height) = player_dimensions(cell_size);
        self.player = Some(Agent::new(
            format!("g{}-player", self.round),
            self.maze.cell(center).origin(),
            sprite("player", PLAYER_FRAMES, true, true),
            PLAYER_SPEED,
            width,
            height,
            false,
        ));

        let (width, height) = prey_dimensions(cell_size);
        let mut preys = Vec::with_capacity(self.options.preys);
        for i in 0..self.options.preys {
            preys.push(Agent::new(
                format!("g{}-prey-{}", self.round, i),
                self.pick_start(&starts, center),
                sprite("prey", PREY_FRAMES, false, false),
                PREY_SPEED,
                width,
                height,
                false,
            ));
        }

        let (width, height) = hunter_dimensions(cell_size);
        let mut hunters = Vec::with_capacity(self.options.hunters);
        for i in 0..self.options.hunters {
            hunters.push(Agent::new(
                format!("g{}-hunter-{}", self.round, i),
                self.pick_start(&starts, center),
                sprite("hunter", HUNTER_FRAMES, true, false),
                HUNTER_SPEED,
                width,
                height,
                true,
            ));
        }

        self.total_preys = preys.len();
        self.preys = preys;
        self.hunters = hunters;
    }

    fn starting_cells(&self, center: CellId) -> Vec<CellId> {
        let far: Vec<CellId> = self
            .maze
            .open_cells()
            .filter(|cell| {
                self.maze
                    .maze_distance(center, cell.id())
                    .is_some_and(|distance| distance > SPAWN_MIN_MAZE_DISTANCE)
            })
            .map(|cell| cell.id())
            .collect();
        if !far.is_empty() {
            return far;
        }
        log::warn!(
            "no open cell farther than {} from {}, spawning anywhere open",
            SPAWN_MIN_MAZE_DISTANCE,
            self.maze.cell(center)
        );
        self.maze
            .open_cells()
            .filter(|cell| cell.id() != center)
            .map(|cell| cell.id())
            .collect()
    }

    fn pick_start(&mut self, starts: &[CellId], fallback: CellId) -> Point {
        let cell = if starts.is_empty() {
            fallback
        } else {
            starts[self.rng.pick_index(starts.len())]
        };
        self.maze.cell(cell).origin()
    }
}

#[cfg(test)]
mod tests {
    use crate::session::{GameSession, ManualClock, SessionOptions};

    #[test]
    fn tiny_maze_falls_back_to_any_open_cell() {
        let options = SessionOptions {
            layout: "#####\n#   #\n#####".to_string(),
            cell_size: 10.0,
            preys: 2,
            hunters: 1,
            ..SessionOptions::default()
        };
        let mut session =
            GameSession::new(options, Box::new(ManualClock::new(0))).expect("layout parses");
        session.assets_loaded();
        session.next_screen();
        session.next_screen();

        let maze = session.maze();
        let center = maze.center_cell();
        for agent in session.preys().iter().chain(session.hunters()) {
            let cell = maze
                .cell_at(crate::types::Point::new(agent.x, agent.y))
                .expect("inside maze");
            assert!(maze.cell(cell).is_open());
            assert_ne!(cell, center);
        }
    }

    #[test]
    fn same_seed_spawns_same_roster() {
        let spawn = |seed| {
            let options = SessionOptions {
                seed,
                ..SessionOptions::default()
            };
            let mut session =
                GameSession::new(options, Box::new(ManualClock::new(0))).expect("layout parses");
            session.assets_loaded();
            session.next_screen();
            session.next_screen();
            let positions: Vec<(f32, f32)> = session
                .preys()
                .iter()
                .chain(session.hunters())
                .map(|agent| (agent.x, agent.y))
                .collect();
            positions
        };
        assert_eq!(spawn(42), spawn(42));
        assert_ne!(spawn(42), spawn(43));
    }
}
