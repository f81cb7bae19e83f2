//! Blast ray casting.

use blastforge_protocol::Cell;

use crate::MapLayout;

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Cells covered by a bomb of `power` detonating at `origin`.
///
/// The origin is always included. Each of the four rays extends up to `power`
/// tiles, stopping before a wall or the map edge and stopping *on* the first
/// block it reaches (that block is included so it can be destroyed).
pub fn blast_cells(map: &MapLayout, origin: Cell, power: u32) -> Vec<Cell> {
    let reach = i32::try_from(power).unwrap_or(i32::MAX);
    let mut cells = vec![origin];
    for (dx, dy) in DIRECTIONS {
        for step in 1..=reach {
            let cell = origin.offset(dx, dy, step);
            if !map.in_bounds(cell) || map.is_wall(cell) {
                break;
            }
            cells.push(cell);
            if map.is_block(cell) {
                break;
            }
        }
    }
    cells
}
