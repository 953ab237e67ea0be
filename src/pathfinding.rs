//! Breadth-first shortest paths over the grid with a per-query exclusion set.

use std::collections::VecDeque;

use crate::grid::{Dir, Grid, Pos};

/// Neighbour exploration order. Fixed so equal-length paths always resolve
/// the same way.
const SEARCH_ORDER: [Dir; 4] = [Dir::Left, Dir::Right, Dir::Up, Dir::Down];

/// Shortest hop-count path from `start` to `goal`, both included.
///
/// A cell is traversable when it is inside the grid, open, and not listed in
/// `excluded`. Returns `[start]` when `start == goal` and an empty path when
/// the goal cannot be reached. Each cell is visited at most once, so the
/// search finishes within `rows * cols` expansions.
pub fn find_path(grid: &Grid, start: Pos, goal: Pos, excluded: &[Pos]) -> Vec<Pos> {
    if start == goal {
        return vec![start];
    }
    let (rows, cols) = grid.dimensions();
    if !grid.in_bounds(start) {
        return Vec::new();
    }

    let mut came_from: Vec<Vec<Option<Pos>>> = vec![vec![None; cols]; rows];
    let mut visited = vec![vec![false; cols]; rows];
    let mut queue = VecDeque::new();
    visited[start.y][start.x] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            return reconstruct(&came_from, start, goal);
        }
        for dir in SEARCH_ORDER {
            let Some(next) = grid.neighbor(current, dir) else {
                continue;
            };
            if visited[next.y][next.x] || !grid.is_open(next) || excluded.contains(&next) {
                continue;
            }
            visited[next.y][next.x] = true;
            came_from[next.y][next.x] = Some(current);
            queue.push_back(next);
        }
    }

    Vec::new()
}

fn reconstruct(came_from: &[Vec<Option<Pos>>], start: Pos, goal: Pos) -> Vec<Pos> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from[current.y][current.x] {
            Some(prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Whether any path joins `start` and `goal` through open cells.
pub fn is_reachable(grid: &Grid, start: Pos, goal: Pos) -> bool {
    !find_path(grid, start, goal, &[]).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_equals_goal_in_isolated_cell() {
        let grid = Grid::from_rows(&["###", "#.#", "###"]);
        let path = find_path(&grid, Pos::new(1, 1), Pos::new(1, 1), &[]);
        assert_eq!(path, vec![Pos::new(1, 1)]);
    }

    #[test]
    fn ties_prefer_left_right_before_up_down() {
        let grid = Grid::from_rows(&["...", "...", "..."]);
        let path = find_path(&grid, Pos::new(1, 1), Pos::new(0, 0), &[]);
        // Left is expanded first, so the route goes through (0, 1).
        assert_eq!(path, vec![Pos::new(1, 1), Pos::new(0, 1), Pos::new(0, 0)]);
    }

    #[test]
    fn walks_around_walls() {
        let grid = Grid::from_rows(&[
            ".#...", //
            ".#.#.", //
            "...#.", //
        ]);
        let path = find_path(&grid, Pos::new(0, 0), Pos::new(4, 0), &[]);
        assert_eq!(path.len(), 9);
        assert_eq!(path.first(), Some(&Pos::new(0, 0)));
        assert_eq!(path.last(), Some(&Pos::new(4, 0)));
    }

    #[test]
    fn exclusions_can_disconnect() {
        let grid = Grid::from_rows(&["...", "#.#", "..."]);
        let blocked = [Pos::new(1, 1)];
        assert!(find_path(&grid, Pos::new(0, 0), Pos::new(0, 2), &blocked).is_empty());
        assert_eq!(find_path(&grid, Pos::new(0, 0), Pos::new(0, 2), &[]).len(), 5);
    }

    #[test]
    fn excluded_goal_is_unreachable() {
        let grid = Grid::from_rows(&["..."]);
        let goal = Pos::new(2, 0);
        assert!(find_path(&grid, Pos::new(0, 0), goal, &[goal]).is_empty());
    }

    #[test]
    fn out_of_bounds_goal_is_unreachable() {
        let grid = Grid::from_rows(&["..", ".."]);
        assert!(find_path(&grid, Pos::new(0, 0), Pos::new(5, 5), &[]).is_empty());
        assert!(!is_reachable(&grid, Pos::new(0, 0), Pos::new(2, 0)));
        assert!(is_reachable(&grid, Pos::new(0, 0), Pos::new(1, 1)));
    }
}
