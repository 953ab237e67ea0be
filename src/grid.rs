//! Fixed-size occupancy grid and the cell/direction value types used
//! throughout the simulation.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Open,
}

/// A cell coordinate. `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Cell displaced by `(dx, dy)`, or `None` when it would leave the
    /// non-negative quadrant. Upper bounds are the grid's concern.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Pos> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Pos { x, y })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

/// Row-major wall map. Dimensions never change after construction; the only
/// mutation is opening a single cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    /// A grid with every cell blocked.
    pub fn filled(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            tiles: vec![vec![Tile::Wall; cols]; rows],
        }
    }

    /// Builds a grid from text rows where `#` is a wall and anything else is
    /// open. Rows shorter than the first are padded with walls.
    pub fn from_rows(rows: &[&str]) -> Self {
        let cols = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut grid = Grid::filled(rows.len(), cols);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().take(cols).enumerate() {
                if ch != '#' {
                    grid.tiles[y][x] = Tile::Open;
                }
            }
        }
        grid
    }

    /// `(rows, cols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    /// False for walls and for anything outside the grid.
    pub fn is_open(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.tiles[pos.y][pos.x] == Tile::Open
    }

    /// Opens a single cell. Out-of-bounds positions are ignored.
    pub fn set_open(&mut self, pos: Pos) {
        if self.in_bounds(pos) {
            self.tiles[pos.y][pos.x] = Tile::Open;
        }
    }

    /// Adjacent in-bounds cell in `dir`, regardless of walls.
    pub fn neighbor(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        pos.offset(dx, dy).filter(|next| self.in_bounds(*next))
    }

    pub fn open_cells(&self) -> Vec<Pos> {
        let mut cells = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                if self.tiles[y][x] == Tile::Open {
                    cells.push(Pos { x, y });
                }
            }
        }
        cells
    }

    pub fn open_count(&self) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&tile| tile == Tile::Open)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_is_never_open() {
        let grid = Grid::from_rows(&["..", ".."]);
        assert!(grid.is_open(Pos::new(1, 1)));
        assert!(!grid.is_open(Pos::new(2, 0)));
        assert!(!grid.is_open(Pos::new(0, 2)));
        assert_eq!(Pos::new(0, 0).offset(-1, 0), None);
    }

    #[test]
    fn set_open_only_touches_one_cell() {
        let mut grid = Grid::filled(3, 4);
        assert_eq!(grid.dimensions(), (3, 4));
        grid.set_open(Pos::new(3, 2));
        grid.set_open(Pos::new(9, 9));
        assert_eq!(grid.open_cells(), vec![Pos::new(3, 2)]);
    }

    #[test]
    fn neighbor_respects_bounds_not_walls() {
        let grid = Grid::from_rows(&["#.", ".."]);
        assert_eq!(grid.neighbor(Pos::new(1, 0), Dir::Left), Some(Pos::new(0, 0)));
        assert_eq!(grid.neighbor(Pos::new(1, 0), Dir::Up), None);
        assert_eq!(grid.neighbor(Pos::new(1, 1), Dir::Right), None);
    }
}
