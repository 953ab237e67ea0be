//! Maze carving and the direct-path repair used when the exit is cut off.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{GameError, Result};
use crate::grid::{Grid, Pos};

/// Generates a `rows` x `cols` maze with a randomized depth-first carve
/// started from the top-left corner.
///
/// Every cell opened by the carve is reachable from `(0, 0)`. Afterwards a
/// 3x3 block around the start corner and one around the opposite corner are
/// forced open so neither end can be sealed in.
pub fn generate(rows: usize, cols: usize, rng: &mut impl Rng) -> Grid {
    let mut grid = Grid::filled(rows, cols);
    if rows == 0 || cols == 0 {
        return grid;
    }

    let start = Pos::new(0, 0);
    grid.set_open(start);
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        let neighbors = carve_candidates(&grid, current);
        if let Some(&next) = neighbors.choose(rng) {
            stack.push(current);
            grid.set_open(between(current, next));
            grid.set_open(next);
            stack.push(next);
        }
    }

    clear_around(&mut grid, start);
    clear_around(&mut grid, Pos::new(cols - 1, rows - 1));
    grid
}

/// Cells two steps away (left, right, up, down) whose target and
/// intermediate cells are both still walls.
fn carve_candidates(grid: &Grid, pos: Pos) -> Vec<Pos> {
    let mut candidates = Vec::with_capacity(4);
    for (dx, dy) in [(-2isize, 0isize), (2, 0), (0, -2), (0, 2)] {
        let Some(next) = pos.offset(dx, dy) else {
            continue;
        };
        if !grid.in_bounds(next) {
            continue;
        }
        if grid.is_open(next) || grid.is_open(between(pos, next)) {
            continue;
        }
        candidates.push(next);
    }
    candidates
}

fn between(a: Pos, b: Pos) -> Pos {
    Pos::new((a.x + b.x) / 2, (a.y + b.y) / 2)
}

fn clear_around(grid: &mut Grid, center: Pos) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(pos) = center.offset(dx, dy) {
                grid.set_open(pos);
            }
        }
    }
}

/// Forces open a straight corridor from `start` to `goal`, both included.
///
/// Each step moves one cell along every axis that is not yet aligned. A
/// diagonal step also opens the horizontal corner cell so the corridor stays
/// 4-connected. Nothing outside the corridor is touched, and repeating the
/// call changes nothing.
pub fn carve_direct_path(grid: &mut Grid, start: Pos, goal: Pos) {
    let mut current = start;
    while current != goal {
        grid.set_open(current);
        let x = step_toward(current.x, goal.x);
        let y = step_toward(current.y, goal.y);
        if x != current.x && y != current.y {
            grid.set_open(Pos::new(x, current.y));
        }
        current = Pos::new(x, y);
    }
    grid.set_open(goal);
}

fn step_toward(from: usize, to: usize) -> usize {
    if from < to {
        from + 1
    } else if from > to {
        from - 1
    } else {
        from
    }
}

pub fn random_open_cell(grid: &Grid, rng: &mut impl Rng) -> Option<Pos> {
    grid.open_cells().choose(rng).copied()
}

/// Picks `count` distinct open cells uniformly at random.
pub fn distinct_open_cells(grid: &Grid, count: usize, rng: &mut impl Rng) -> Result<Vec<Pos>> {
    let mut empties = grid.open_cells();
    if empties.len() < count {
        return Err(GameError::NotEnoughOpenCells {
            needed: count,
            available: empties.len(),
        });
    }
    empties.shuffle(rng);
    empties.truncate(count);
    Ok(empties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::find_path;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_maze_opens_both_corners() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let grid = generate(15, 20, &mut rng);
        assert_eq!(grid.dimensions(), (15, 20));
        for pos in [Pos::new(0, 0), Pos::new(1, 1), Pos::new(19, 14), Pos::new(18, 13)] {
            assert!(grid.is_open(pos), "{pos:?} should be open");
        }
        assert!(!find_path(&grid, Pos::new(0, 0), Pos::new(19, 14), &[]).is_empty());
    }

    #[test]
    fn every_open_cell_reachable_from_start() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let grid = generate(15, 20, &mut rng);
        for cell in grid.open_cells() {
            assert!(
                !find_path(&grid, Pos::new(0, 0), cell, &[]).is_empty(),
                "{cell:?} is sealed off"
            );
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = generate(15, 20, &mut ChaCha8Rng::seed_from_u64(3));
        let b = generate(15, 20, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn carve_opens_connected_corridor() {
        let mut grid = Grid::filled(6, 8);
        let start = Pos::new(0, 5);
        let goal = Pos::new(6, 1);
        carve_direct_path(&mut grid, start, goal);
        assert!(grid.is_open(start) && grid.is_open(goal));
        assert!(!find_path(&grid, start, goal, &[]).is_empty());
    }

    #[test]
    fn carve_straight_line_opens_only_the_line() {
        let mut grid = Grid::filled(3, 5);
        carve_direct_path(&mut grid, Pos::new(0, 1), Pos::new(4, 1));
        assert_eq!(grid.open_count(), 5);
        assert!((0..5).all(|x| grid.is_open(Pos::new(x, 1))));
    }

    #[test]
    fn random_open_cell_picks_an_open_cell() {
        let grid = Grid::from_rows(&["##.", "#.#"]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..20 {
            let cell = random_open_cell(&grid, &mut rng).unwrap();
            assert!(grid.is_open(cell));
        }
        assert_eq!(random_open_cell(&Grid::filled(2, 2), &mut rng), None);
    }

    #[test]
    fn distinct_cells_fail_when_grid_is_too_small() {
        let grid = Grid::from_rows(&["#.#", "..#"]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = distinct_open_cells(&grid, 4, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            GameError::NotEnoughOpenCells {
                needed: 4,
                available: 3
            }
        ));
        let cells = distinct_open_cells(&grid, 3, &mut rng).unwrap();
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| grid.is_open(*c)));
    }
}
