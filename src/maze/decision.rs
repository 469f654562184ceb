use super::{Cell, CellId, DecisionPoint};

/// Walks each allowed direction of `origin` in a straight line.
///
/// The walk stops on the first fork it stands on, or when the next cell is not open.
/// Dead-end stopping cells are not recorded.
pub(super) fn scan_decision_points(cells: &[Cell], origin: CellId) -> Vec<DecisionPoint> {
    let cell = &cells[origin.index()];
    let mut points = Vec::new();

    for &dir in cell.allowed_dirs() {
        let Some(mut scanned) = cell.neighbour(dir) else {
            continue;
        };
        let mut distance = 1;
        let mut next = cells[scanned.index()].neighbour(dir);

        while let Some(candidate) = next.filter(|id| cells[id.index()].is_open()) {
            if cells[scanned.index()].is_fork() {
                break;
            }
            distance += 1;
            scanned = candidate;
            next = cells[scanned.index()].neighbour(dir);
        }

        if cells[scanned.index()].is_dead_end() {
            continue;
        }
        points.push(DecisionPoint {
            direction: dir,
            cell: scanned,
            distance,
        });
    }
    points
}

#[cfg(test)]
mod tests {
    use crate::constants::{CELL_SIZE, DEFAULT_MAZE_LAYOUT};
    use crate::maze::Maze;
    use crate::types::{Direction, GridCoord};

    fn coord_of(maze: &Maze, id: crate::maze::CellId) -> GridCoord {
        maze.cell(id).coord()
    }

    #[test]
    fn corner_cell_sees_next_fork_along_each_corridor() {
        let maze = Maze::parse(DEFAULT_MAZE_LAYOUT, CELL_SIZE).expect("layout parses");
        let corner = maze
            .id_at(GridCoord::new(1, 1))
            .expect("coordinate in bounds");
        let points: Vec<(Direction, GridCoord, u32)> = maze
            .cell(corner)
            .decision_points()
            .iter()
            .map(|dp| (dp.direction, coord_of(&maze, dp.cell), dp.distance))
            .collect();
        assert_eq!(
            points,
            vec![
                (Direction::Right, GridCoord::new(7, 1), 6),
                (Direction::Down, GridCoord::new(1, 3), 2),
            ]
        );
    }

    #[test]
    fn fork_neighbour_stops_scan_after_one_step() {
        let maze = Maze::parse(DEFAULT_MAZE_LAYOUT, CELL_SIZE).expect("layout parses");
        let center = maze.center_cell();
        for dp in maze.cell(center).decision_points() {
            assert_eq!(dp.distance, 1);
        }
        assert_eq!(maze.cell(center).decision_points().len(), 4);
    }

    #[test]
    fn dead_end_corridor_records_nothing() {
        // a fork at x=1 opening onto a dead-end spur to the right
        let layout = "#####\n# ###\n#   #\n# ###\n#####";
        let maze = Maze::parse(layout, 10.0).expect("layout parses");
        let fork = maze.id_at(GridCoord::new(1, 2)).expect("in bounds");
        assert!(maze.cell(fork).is_fork());
        let dirs: Vec<Direction> = maze
            .cell(fork)
            .decision_points()
            .iter()
            .map(|dp| dp.direction)
            .collect();
        assert!(!dirs.contains(&Direction::Right));
    }

    #[test]
    fn scan_never_crosses_a_fork() {
        let maze = Maze::parse(DEFAULT_MAZE_LAYOUT, CELL_SIZE).expect("layout parses");
        for cell in maze.open_cells() {
            for dp in cell.decision_points() {
                assert!(!maze.cell(dp.cell).is_dead_end());
                let mut walker = cell.id();
                for _ in 1..dp.distance {
                    walker = maze
                        .cell(walker)
                        .neighbour(dp.direction)
                        .expect("corridor stays in bounds");
                    let between = maze.cell(walker);
                    assert!(between.is_open(), "{between} should be open");
                    assert_eq!(between.allowed_dirs().len(), 2, "{between} is a fork");
                }
                let last = maze
                    .cell(walker)
                    .neighbour(dp.direction)
                    .expect("corridor stays in bounds");
                assert_eq!(last, dp.cell);
            }
        }
    }
}
