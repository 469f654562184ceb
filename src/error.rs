use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MazeError {
    #[error("maze layout has no rows")]
    EmptyLayout,
    #[error("maze layout row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell size must be a positive finite number, got {0}")]
    InvalidCellSize(f32),
}
