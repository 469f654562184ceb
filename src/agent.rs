use crate::maze::CellId;
use crate::types::{AgentView, Direction, GridCoord, Point, SpriteDescriptor};

/// Anything with an axis-aligned bounding box.
pub trait Bounds {
    fn center(&self) -> Point;
    fn width(&self) -> f32;
    fn height(&self) -> f32;
}

/// A moving entity: the player, a prey or a hunter.
///
/// `x`/`y` anchor the top-left corner; centre and edges are derived from it.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub speed: f32,
    pub sprite: SpriteDescriptor,
    pub sprite_frame: u32,
    pub target: Option<CellId>,
    pub target_dir: Option<Direction>,
    pub can_fly: bool,
    orientation: Direction,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        origin: Point,
        sprite: SpriteDescriptor,
        speed: f32,
        width: f32,
        height: f32,
        can_fly: bool,
    ) -> Self {
        Self {
            id: id.into(),
            x: origin.x,
            y: origin.y,
            width,
            height,
            vel_x: 0.0,
            vel_y: 0.0,
            speed,
            sprite,
            sprite_frame: 0,
            target: None,
            target_dir: None,
            can_fly,
            orientation: Direction::Down,
        }
    }

    pub fn set_center(&mut self, center: Point) {
        self.x = center.x - self.width / 2.0;
        self.y = center.y - self.height / 2.0;
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn set_top(&mut self, y: f32) {
        self.y = y;
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn set_right(&mut self, x: f32) {
        self.x = x - self.width;
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn set_bottom(&mut self, y: f32) {
        self.y = y - self.height;
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn set_left(&mut self, x: f32) {
        self.x = x;
    }

    pub fn is_moving(&self) -> bool {
        self.vel_x != 0.0 || self.vel_y != 0.0
    }

    /// Dominant axis of the velocity. A perfect diagonal reports the horizontal component.
    pub fn moving_direction(&self) -> Option<Direction> {
        if !self.is_moving() {
            return None;
        }
        if self.vel_y.abs() > self.vel_x.abs() {
            Some(if self.vel_y > 0.0 {
                Direction::Down
            } else {
                Direction::Up
            })
        } else {
            Some(if self.vel_x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            })
        }
    }

    /// Current facing; holds the last moving direction while idle.
    pub fn orientation(&self) -> Direction {
        self.moving_direction().unwrap_or(self.orientation)
    }

    pub fn remember_orientation(&mut self) {
        self.orientation = self.orientation();
    }

    /// Sets an axis-aligned velocity of `speed` toward `dir`.
    pub fn move_toward(&mut self, dir: Direction, speed: f32) {
        let (dx, dy) = dir.offset();
        self.vel_x = dx as f32 * speed;
        self.vel_y = dy as f32 * speed;
    }

    pub fn stop(&mut self) {
        self.vel_x = 0.0;
        self.vel_y = 0.0;
    }

    /// True when the gaps on both axes are smaller than the summed half-extents.
    pub fn collides_with(&self, other: &impl Bounds) -> bool {
        let a = self.center();
        let b = other.center();
        (a.x - b.x).abs() < (self.width + other.width()) / 2.0
            && (a.y - b.y).abs() < (self.height + other.height()) / 2.0
    }

    pub fn pixel_distance(&self, other: &impl Bounds) -> f32 {
        self.center().distance(other.center())
    }

    pub fn advance_sprite(&mut self, frame_index: u32) {
        if self.sprite.pause_on_idle && !self.is_moving() {
            return;
        }
        self.sprite_frame = frame_index % self.sprite.frames.max(1);
    }

    pub fn to_view(&self, target: Option<GridCoord>) -> AgentView {
        let orientation = self.orientation();
        AgentView {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            vel_x: self.vel_x,
            vel_y: self.vel_y,
            orientation,
            sprite: self.sprite.name.clone(),
            sprite_row: if self.sprite.directional {
                orientation.sprite_row()
            } else {
                0
            },
            sprite_frame: self.sprite_frame,
            can_fly: self.can_fly,
            target,
        }
    }
}

impl Bounds for Agent {
    fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(pause_on_idle: bool) -> SpriteDescriptor {
        SpriteDescriptor {
            name: "test".to_string(),
            frames: 4,
            directional: true,
            pause_on_idle,
        }
    }

    fn agent_at(x: f32, y: f32, size: f32) -> Agent {
        Agent::new("a", Point::new(x, y), sprite(false), 2.0, size, size, false)
    }

    #[test]
    fn edges_and_center_track_position() {
        let mut agent = Agent::new("a", Point::new(10.0, 20.0), sprite(false), 1.0, 8.0, 16.0, false);
        assert_eq!(agent.center(), Point::new(14.0, 28.0));
        assert_eq!(agent.right(), 18.0);
        assert_eq!(agent.bottom(), 36.0);

        agent.set_right(30.0);
        assert_eq!(agent.left(), 22.0);
        agent.set_bottom(50.0);
        assert_eq!(agent.top(), 34.0);
        agent.set_center(Point::new(0.0, 0.0));
        assert_eq!((agent.x, agent.y), (-4.0, -8.0));
    }

    #[test]
    fn moving_direction_prefers_dominant_axis() {
        let mut agent = agent_at(0.0, 0.0, 10.0);
        assert_eq!(agent.moving_direction(), None);

        agent.vel_x = 1.0;
        agent.vel_y = -2.0;
        assert_eq!(agent.moving_direction(), Some(Direction::Up));

        agent.vel_x = -2.0;
        agent.vel_y = 2.0;
        assert_eq!(agent.moving_direction(), Some(Direction::Left));

        agent.vel_x = 0.5;
        agent.vel_y = -0.5;
        assert_eq!(agent.moving_direction(), Some(Direction::Right));
    }

    #[test]
    fn orientation_persists_while_idle() {
        let mut agent = agent_at(0.0, 0.0, 10.0);
        assert_eq!(agent.orientation(), Direction::Down);

        agent.move_toward(Direction::Left, 3.0);
        agent.remember_orientation();
        assert_eq!(agent.orientation(), Direction::Left);

        agent.stop();
        agent.remember_orientation();
        assert_eq!(agent.orientation(), Direction::Left);
    }

    #[test]
    fn collision_requires_overlap_on_both_axes() {
        let a = agent_at(0.0, 0.0, 10.0);
        let touching = agent_at(10.0, 0.0, 10.0);
        let overlapping = agent_at(9.0, 9.0, 10.0);
        let apart_vertically = agent_at(5.0, 10.0, 10.0);
        assert!(!a.collides_with(&touching));
        assert!(a.collides_with(&overlapping));
        assert!(!a.collides_with(&apart_vertically));
    }

    #[test]
    fn idle_sprite_pauses_when_requested() {
        let mut walker = Agent::new("p", Point::default(), sprite(true), 1.0, 1.0, 1.0, false);
        walker.advance_sprite(3);
        assert_eq!(walker.sprite_frame, 0);
        walker.vel_x = 1.0;
        walker.advance_sprite(6);
        assert_eq!(walker.sprite_frame, 2);

        let mut flyer = Agent::new("h", Point::default(), sprite(false), 1.0, 1.0, 1.0, true);
        flyer.advance_sprite(5);
        assert_eq!(flyer.sprite_frame, 1);
    }
}
