use std::fmt;

use crate::agent::Bounds;
use crate::error::MazeError;
use crate::types::{CellType, Direction, GridCoord, MazeInit, Point};

mod decision;
mod distance;

use self::decision::scan_decision_points;
use self::distance::DistanceTable;

/// Stable handle of a cell inside the [`Maze`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Walking `distance` open cells in `direction` reaches `cell`, the next fork or
/// the last cell before a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionPoint {
    pub direction: Direction,
    pub cell: CellId,
    pub distance: u32,
}

#[derive(Clone, Debug)]
pub struct Cell {
    id: CellId,
    cell_type: CellType,
    coord: GridCoord,
    size: f32,
    origin: Point,
    neighbours: [Option<CellId>; 4],
    allowed_dirs: Vec<Direction>,
    decision_points: Vec<DecisionPoint>,
    open_index: Option<usize>,
}

impl Cell {
    fn new(id: CellId, cell_type: CellType, coord: GridCoord, size: f32) -> Self {
        Self {
            id,
            cell_type,
            coord,
            size,
            origin: Point::new(coord.x as f32 * size, coord.y as f32 * size),
            neighbours: [None; 4],
            allowed_dirs: Vec::new(),
            decision_points: Vec::new(),
            open_index: None,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn is_wall(&self) -> bool {
        self.cell_type == CellType::Wall
    }

    pub fn is_open(&self) -> bool {
        self.cell_type == CellType::Open
    }

    pub fn is_fork(&self) -> bool {
        self.allowed_dirs.len() > 2
    }

    pub fn is_dead_end(&self) -> bool {
        self.allowed_dirs.len() < 2
    }

    /// Adjacent cell in `dir`, `None` past the grid edge.
    pub fn neighbour(&self, dir: Direction) -> Option<CellId> {
        self.neighbours[dir.index()]
    }

    pub fn neighbours(&self) -> impl Iterator<Item = (Direction, CellId)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|dir| self.neighbour(dir).map(|id| (dir, id)))
    }

    pub fn allowed_dirs(&self) -> &[Direction] {
        &self.allowed_dirs
    }

    pub fn decision_points(&self) -> &[DecisionPoint] {
        &self.decision_points
    }

    pub fn pixel_distance(&self, other: &impl Bounds) -> f32 {
        self.center().distance(other.center())
    }

    pub fn straight_distance(&self, other: &Cell) -> f32 {
        self.coord.straight(other.coord)
    }

    pub fn manhattan_distance(&self, other: &Cell) -> u32 {
        self.coord.manhattan(other.coord)
    }
}

impl Bounds for Cell {
    fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size / 2.0,
            self.origin.y + self.size / 2.0,
        )
    }

    fn width(&self) -> f32 {
        self.size
    }

    fn height(&self) -> f32 {
        self.size
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.coord, f)
    }
}

/// Immutable maze graph: cells, adjacency, corridor decision points and all-pairs distances.
#[derive(Clone, Debug)]
pub struct Maze {
    columns: u32,
    rows: u32,
    cell_size: f32,
    cells: Vec<Cell>,
    distances: DistanceTable,
    tiles: Vec<String>,
}

impl Maze {
    /// Builds the maze from rows of equal length; `' '` is open, any other glyph is a wall.
    pub fn parse(layout: &str, cell_size: f32) -> Result<Self, MazeError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(MazeError::InvalidCellSize(cell_size));
        }

        let lines: Vec<&str> = layout
            .split('\n')
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(MazeError::EmptyLayout);
        };
        let expected = first.chars().count();
        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(MazeError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }
        }

        let columns = expected as u32;
        let rows = lines.len() as u32;
        let glyphs: Vec<Vec<char>> = lines.iter().map(|line| line.chars().collect()).collect();

        // column-major: index = x * rows + y
        let mut cells = Vec::with_capacity((columns * rows) as usize);
        for x in 0..columns {
            for y in 0..rows {
                let cell_type = if glyphs[y as usize][x as usize] == ' ' {
                    CellType::Open
                } else {
                    CellType::Wall
                };
                let id = CellId(cells.len());
                cells.push(Cell::new(id, cell_type, GridCoord::new(x, y), cell_size));
            }
        }

        let mut maze = Self {
            columns,
            rows,
            cell_size,
            cells,
            distances: DistanceTable::default(),
            tiles: lines.iter().map(|line| line.to_string()).collect(),
        };
        maze.link_neighbours();
        maze.index_decision_points();
        maze.distances = DistanceTable::build(&mut maze.cells);
        log::debug!(
            "maze built: {}x{} cells, {} open",
            maze.columns,
            maze.rows,
            maze.distances.len()
        );
        Ok(maze)
    }

    fn link_neighbours(&mut self) {
        for index in 0..self.cells.len() {
            let coord = self.cells[index].coord;
            let mut neighbours = [None; 4];
            let mut allowed_dirs = Vec::new();
            for dir in Direction::ALL {
                let Some(neighbour) = self.offset_id(coord, dir) else {
                    continue;
                };
                neighbours[dir.index()] = Some(neighbour);
                if self.cells[index].is_open() && self.cell(neighbour).is_open() {
                    allowed_dirs.push(dir);
                }
            }
            self.cells[index].neighbours = neighbours;
            self.cells[index].allowed_dirs = allowed_dirs;
        }
    }

    fn index_decision_points(&mut self) {
        for index in 0..self.cells.len() {
            let points = scan_decision_points(&self.cells, CellId(index));
            self.cells[index].decision_points = points;
        }
    }

    fn offset_id(&self, coord: GridCoord, dir: Direction) -> Option<CellId> {
        let (dx, dy) = dir.offset();
        let x = i64::from(coord.x) + dx;
        let y = i64::from(coord.y) + dy;
        if x < 0 || y < 0 || x >= i64::from(self.columns) || y >= i64::from(self.rows) {
            return None;
        }
        self.id_at(GridCoord::new(x as u32, y as u32))
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn open_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.is_open())
    }

    pub fn id_at(&self, coord: GridCoord) -> Option<CellId> {
        if coord.x >= self.columns || coord.y >= self.rows {
            return None;
        }
        Some(CellId((coord.x * self.rows + coord.y) as usize))
    }

    /// Cell containing the pixel-space point, `None` outside the grid.
    pub fn cell_at(&self, point: Point) -> Option<CellId> {
        if !point.x.is_finite() || !point.y.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let x = (point.x / self.cell_size).floor() as u32;
        let y = (point.y / self.cell_size).floor() as u32;
        self.id_at(GridCoord::new(x, y))
    }

    pub fn center_cell(&self) -> CellId {
        CellId(((self.columns / 2) * self.rows + self.rows / 2) as usize)
    }

    /// Breadth-first hop count between two open cells; `None` when unreachable or not open.
    pub fn maze_distance(&self, from: CellId, to: CellId) -> Option<u32> {
        let a = self.cell(from).open_index?;
        let b = self.cell(to).open_index?;
        self.distances.get(a, b)
    }

    pub fn to_init(&self) -> MazeInit {
        MazeInit {
            columns: self.columns,
            rows: self.rows,
            cell_size: self.cell_size,
            width: self.width(),
            height: self.height(),
            tiles: self.tiles.clone(),
        }
    }
}
