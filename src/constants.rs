pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;
pub const TICKS_PER_FRAME: u32 = 10;

pub const CELL_SIZE: f32 = 30.0;

pub const DEFAULT_MAZE_LAYOUT: &str = "
+-------------------+
|                   |
| ##### ##### ##### |
|     # #   # #     |
| ### # # # # # ### |
|   #     #     #   |
|## # # ##### # # ##|
|     #       #     |
| # ### ## ## ### # |
| #   # #   # #   # |
| ###           ### |
|     # #   # #     |
| # ### ## ## ### # |
| #               # |
| #### ## # ## #### |
|       # # #       |
| # ### # # # ### # |
| #   #   #   #   # |
| ### # ##### # ### |
|                   |
+-------------------+
";

pub const TOTAL_PREYS: usize = 12;
pub const TOTAL_HUNTERS: usize = 4;

pub const PLAYER_SPEED: f32 = 3.0;
pub const PREY_SPEED: f32 = 2.8;
pub const HUNTER_SPEED: f32 = 0.5;

/// Prey and hunters only spawn on cells farther than this from the centre cell.
pub const SPAWN_MIN_MAZE_DISTANCE: u32 = 5;

pub const FRICTION: f32 = 0.8;
pub const MIN_SPEED: f32 = 0.1;

pub const ACT_OPTIMALLY_PROBABILITY: f32 = 0.75;
pub const SCARE_REACTIVITY: f32 = 0.02;
pub const SCARE_MIN_DISTANCE: f32 = 3.0;

/// Steering stops once the agent centre is this close to the target centre.
pub const ARRIVAL_EPSILON: f32 = 1.0;

pub const PLAYER_FRAMES: u32 = 4;
pub const PREY_FRAMES: u32 = 7;
pub const HUNTER_FRAMES: u32 = 4;

pub fn player_dimensions(cell_size: f32) -> (f32, f32) {
    (cell_size / 2.0, cell_size)
}

pub fn prey_dimensions(cell_size: f32) -> (f32, f32) {
    (cell_size, cell_size)
}

pub fn hunter_dimensions(cell_size: f32) -> (f32, f32) {
    (cell_size * 2.0, cell_size * 2.0)
}

/// Fraction of full flight speed for a prey `distance` grid cells away from the player.
///
/// Closer threats produce faster flight; the result is rounded up to the next decile.
pub fn scared_fraction(distance: f32) -> f32 {
    let margin = (distance - SCARE_MIN_DISTANCE).max(0.0);
    0.1 * (10.0 / (SCARE_REACTIVITY * margin.powi(2) + 1.0)).ceil()
}
