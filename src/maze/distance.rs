use std::collections::VecDeque;

use super::Cell;

const UNREACHABLE: u32 = u32::MAX;

/// Dense symmetric hop-count table between open cells.
#[derive(Clone, Debug, Default)]
pub(super) struct DistanceTable {
    size: usize,
    hops: Vec<u32>,
}

impl DistanceTable {
    /// Assigns each open cell its table row, then fills the table with one breadth-first
    /// search per source. Pairs resolved from an earlier source are mirrored instead of searched.
    pub(super) fn build(cells: &mut [Cell]) -> Self {
        let mut open_ids = Vec::new();
        for (index, cell) in cells.iter_mut().enumerate() {
            if cell.is_open() {
                cell.open_index = Some(open_ids.len());
                open_ids.push(index);
            }
        }

        let size = open_ids.len();
        let mut table = Self {
            size,
            hops: vec![UNREACHABLE; size * size],
        };
        for src in 0..size {
            table.set(src, src, 0);
            table.search_from(cells, &open_ids, src);
        }
        table
    }

    fn search_from(&mut self, cells: &[Cell], open_ids: &[usize], src: usize) {
        // rows below `src` were already mirrored into this one
        let mut pending = self.size - src - 1;
        if pending == 0 {
            return;
        }

        let mut visited = vec![false; self.size];
        let mut queue = VecDeque::new();
        visited[src] = true;
        queue.push_back((open_ids[src], 0u32));

        while let Some((cell_index, distance)) = queue.pop_front() {
            let cell = &cells[cell_index];
            for &dir in cell.allowed_dirs() {
                let Some(neighbour) = cell.neighbour(dir) else {
                    continue;
                };
                let Some(dest) = cells[neighbour.index()].open_index else {
                    continue;
                };
                if visited[dest] {
                    continue;
                }
                visited[dest] = true;
                if dest > src {
                    self.set(src, dest, distance + 1);
                    pending -= 1;
                    if pending == 0 {
                        return;
                    }
                }
                queue.push_back((neighbour.index(), distance + 1));
            }
        }
    }

    fn set(&mut self, a: usize, b: usize, hops: u32) {
        self.hops[a * self.size + b] = hops;
        self.hops[b * self.size + a] = hops;
    }

    pub(super) fn get(&self, a: usize, b: usize) -> Option<u32> {
        if a >= self.size || b >= self.size {
            return None;
        }
        let hops = self.hops[a * self.size + b];
        (hops != UNREACHABLE).then_some(hops)
    }

    pub(super) fn len(&self) -> usize {
        self.size
    }
}
