use std::fmt;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    pub fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }

    pub fn offset(self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        !self.is_horizontal()
    }

    /// Row of a directional sprite sheet holding the frames for this facing.
    pub fn sprite_row(self) -> u32 {
        self.index() as u32
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "right" => Some(Self::Right),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            _ => None,
        }
    }
}

/// Position in continuous (pixel) space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridCoord {
    pub x: u32,
    pub y: u32,
}

impl GridCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn straight(self, other: GridCoord) -> f32 {
        let dx = self.x.abs_diff(other.x) as f32;
        let dy = self.y.abs_diff(other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Wall,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameScreen {
    Loading,
    Start,
    Tutorial,
    InGame,
    Pause,
    Victory,
    GameOver,
}

impl GameScreen {
    pub fn is_round_over(self) -> bool {
        matches!(self, Self::Victory | Self::GameOver)
    }
}

/// Normalized directional intent for the player, already merged across input sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
}

impl Intent {
    pub fn toward(dir: Direction) -> Self {
        let mut intent = Self::default();
        match dir {
            Direction::Up => intent.up = true,
            Direction::Right => intent.right = true,
            Direction::Down => intent.down = true,
            Direction::Left => intent.left = true,
        }
        intent
    }

    pub fn merge(self, other: Intent) -> Self {
        Self {
            up: self.up || other.up,
            right: self.right || other.right,
            down: self.down || other.down,
            left: self.left || other.left,
        }
    }

    pub fn merge_all<'a>(intents: impl IntoIterator<Item = &'a Intent>) -> Self {
        intents
            .into_iter()
            .fold(Self::default(), |acc, intent| acc.merge(*intent))
    }

    pub fn is_idle(&self) -> bool {
        !(self.up || self.right || self.down || self.left)
    }
}

/// Visual descriptor carried by an agent; opaque to the simulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpriteDescriptor {
    pub name: String,
    pub frames: u32,
    pub directional: bool,
    #[serde(rename = "pauseOnIdle")]
    pub pause_on_idle: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(rename = "velX")]
    pub vel_x: f32,
    #[serde(rename = "velY")]
    pub vel_y: f32,
    pub orientation: Direction,
    pub sprite: String,
    #[serde(rename = "spriteRow")]
    pub sprite_row: u32,
    #[serde(rename = "spriteFrame")]
    pub sprite_frame: u32,
    #[serde(rename = "canFly")]
    pub can_fly: bool,
    pub target: Option<GridCoord>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NeighbourView {
    pub dir: Direction,
    pub cell: GridCoord,
    pub wall: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct DistanceView {
    pub cell: GridCoord,
    pub distance: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DebugOverlay {
    #[serde(rename = "playerCell")]
    pub player_cell: GridCoord,
    #[serde(rename = "decisionPoints")]
    pub decision_points: Vec<GridCoord>,
    pub neighbours: Vec<NeighbourView>,
    pub distances: Vec<DistanceView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MazeInit {
    pub columns: u32,
    pub rows: u32,
    #[serde(rename = "cellSize")]
    pub cell_size: f32,
    pub width: f32,
    pub height: f32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub captured: usize,
    #[serde(rename = "totalPreys")]
    pub total_preys: usize,
    #[serde(rename = "elapsedSeconds")]
    pub elapsed_seconds: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    RoundStarted {
        round: u32,
    },
    ScreenChanged {
        screen: GameScreen,
    },
    PreyCaptured {
        #[serde(rename = "preyId")]
        prey_id: String,
        remaining: usize,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderSnapshot {
    pub screen: GameScreen,
    pub tick: u64,
    #[serde(rename = "frameIndex")]
    pub frame_index: u32,
    pub round: u32,
    pub debug: bool,
    pub player: Option<AgentView>,
    pub preys: Vec<AgentView>,
    pub hunters: Vec<AgentView>,
    pub report: TickReport,
    pub overlay: Option<DebugOverlay>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSummary {
    pub outcome: Option<Outcome>,
    pub captured: usize,
    #[serde(rename = "totalPreys")]
    pub total_preys: usize,
    #[serde(rename = "elapsedMs")]
    pub elapsed_ms: u64,
    #[serde(rename = "roundsPlayed")]
    pub rounds_played: u32,
    pub ticks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_intent_keeps_every_active_input() {
        let keyboard = Intent {
            up: true,
            ..Intent::default()
        };
        let touch = Intent::toward(Direction::Left);
        let merged = Intent::merge_all([&keyboard, &touch]);
        assert!(merged.up && merged.left);
        assert!(!merged.down && !merged.right);
        assert!(Intent::merge_all(std::iter::empty::<&Intent>()).is_idle());
    }

    #[test]
    fn grid_distances() {
        let a = GridCoord::new(1, 1);
        let b = GridCoord::new(4, 5);
        assert_eq!(a.manhattan(b), 7);
        assert!((a.straight(b) - 5.0).abs() < 1e-6);
        assert_eq!(a.to_string(), "[1,1]");
    }

    #[test]
    fn sprite_rows_follow_up_right_down_left() {
        let rows: Vec<u32> = Direction::ALL.iter().map(|dir| dir.sprite_row()).collect();
        assert_eq!(rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = GameEvent::PreyCaptured {
            prey_id: "g1-prey-0".to_string(),
            remaining: 3,
        };
        let value = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(value["type"], "prey_captured");
        assert_eq!(value["preyId"], "g1-prey-0");
    }
}
