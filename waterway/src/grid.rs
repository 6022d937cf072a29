use crate::find::{MapStorage, MapTrait, NodeReference};
use crate::Error;
use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Cost of a horizontal or vertical move
pub const ORTHOGONAL_COST: f64 = 1.0;
/// Cost of a diagonal move
pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;

/// Offsets of the 8 neighbors of a cell, as (dx, dy)
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Water,
    Land,
}

impl Display for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Terrain::Water => "~",
                Terrain::Land => "#",
            }
        )
    }
}

/// Mean color of the pixels sampled for a cell, each channel in `[0, 255]`
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn max(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    pub fn min(&self) -> f64 {
        self.r.min(self.g).min(self.b)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The point moved by (dx, dy), or `None` if that would leave the positive quadrant
    pub fn offset(self, dx: isize, dy: isize) -> Option<Point> {
        Some(Point {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }
}

impl NodeReference for Point {}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = anyhow::Error;

    /// Parses `x,y`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| anyhow::anyhow!("Invalid point, expected x,y: {}", s))?;

        Ok(Point {
            x: x.trim().parse()?,
            y: y.trim().parse()?,
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub terrain: Terrain,
    pub avg: Rgb,
}

impl Cell {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_water(&self) -> bool {
        self.terrain == Terrain::Water
    }
}

/// Cost of moving between two cells that are 8-neighbors, `None` if they are not
pub fn step_cost(from: Point, to: Point) -> Option<f64> {
    match (from.x.abs_diff(to.x), from.y.abs_diff(to.y)) {
        (1, 0) | (0, 1) => Some(ORTHOGONAL_COST),
        (1, 1) => Some(DIAGONAL_COST),
        _ => None,
    }
}

/// A rectangular grid of classified cells, stored row-major.
///
/// A grid is only ever built whole (by the classifier or by parsing a layout) and
/// never modified afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WaterGrid {
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl WaterGrid {
    pub(crate) fn from_cells(columns: usize, rows: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), columns * rows);
        Self {
            columns,
            rows,
            cells,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.columns && y < self.rows {
            Some(&self.cells[y * self.columns + x])
        } else {
            None
        }
    }

    pub fn is_water(&self, point: Point) -> bool {
        self.get(point.x, point.y).is_some_and(Cell::is_water)
    }

    /// True only for an existing land cell, off-grid points are not land
    pub fn is_land(&self, point: Point) -> bool {
        self.get(point.x, point.y).is_some_and(|c| !c.is_water())
    }

    pub fn water_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_water()).count()
    }

    /// Check if a boat can move directly from one cell to the other.
    ///
    /// Both cells must be water and 8-neighbors. A diagonal move is refused when one of
    /// the two cells it passes between is land.
    pub fn allows_step(&self, from: Point, to: Point) -> bool {
        if !self.is_water(from) || !self.is_water(to) || step_cost(from, to).is_none() {
            return false;
        }

        if from.x != to.x && from.y != to.y {
            let side_x = Point::new(to.x, from.y);
            let side_y = Point::new(from.x, to.y);
            return !self.is_land(side_x) && !self.is_land(side_y);
        }

        true
    }

    /// Render the grid like [`Display`] but with the cells of `path` drawn as `*`
    pub fn render_route(&self, path: &[Point]) -> String {
        let mut marks = vec![false; self.cells.len()];
        for p in path {
            if p.x < self.columns && p.y < self.rows {
                marks[p.y * self.columns + p.x] = true;
            }
        }

        let mut out = String::with_capacity((self.columns + 1) * self.rows);
        for (i, cell) in self.cells.iter().enumerate() {
            if marks[i] {
                out.push('*');
            } else {
                out.push_str(&cell.terrain.to_string());
            }
            if cell.x == self.columns - 1 {
                out.push('\n');
            }
        }
        out
    }
}

impl Display for WaterGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.columns) {
            for cell in row {
                write!(f, "{}", cell.terrain)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl FromStr for WaterGrid {
    type Err = Error;

    /// Parses a layout of `~` (water) and `#` (land), one line per row. Averages are
    /// left black since no image was sampled.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let rows = lines.len();
        let columns = lines.first().map_or(0, |l| l.chars().count());
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidDimensions { columns, rows });
        }

        let mut cells = Vec::with_capacity(columns * rows);
        for (y, line) in lines.iter().enumerate() {
            if line.chars().count() != columns {
                return Err(Error::Layout(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    line.chars().count(),
                    columns
                )));
            }
            for (x, c) in line.chars().enumerate() {
                let terrain = match c {
                    '~' => Terrain::Water,
                    '#' => Terrain::Land,
                    other => {
                        return Err(Error::Layout(format!(
                            "unknown terrain {:?} at ({}, {})",
                            other, x, y
                        )))
                    }
                };
                cells.push(Cell {
                    x,
                    y,
                    terrain,
                    avg: Rgb::default(),
                });
            }
        }

        Ok(Self::from_cells(columns, rows, cells))
    }
}

/// A MapStorage that keeps one value per grid cell in a single row-major vec
#[derive(Debug)]
pub struct CellStorage<T> {
    columns: usize,
    cells: Vec<T>,
}

impl<T: Copy + 'static> MapStorage<T> for CellStorage<T> {
    type Reference = Point;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.x < self.columns && node.y * self.columns + node.x < self.cells.len()
    }

    fn get(&self, node: Self::Reference) -> T {
        self.cells[node.y * self.columns + node.x]
    }

    fn get_mut(&mut self, node: Self::Reference) -> &mut T {
        &mut self.cells[node.y * self.columns + node.x]
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(self.columns.max(1)) {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl MapTrait for WaterGrid {
    type Reference = Point;
    type Storage<T: Default + Copy + 'static> = CellStorage<T>;
    type Cost = f64;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.x < self.columns && node.y < self.rows
    }

    fn neighbors_of(
        &self,
        node: Self::Reference,
    ) -> impl Iterator<Item = (Self::Reference, Self::Cost)> {
        let mut points = Vec::with_capacity(8);

        if !self.is_water(node) {
            return points.into_iter();
        }

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let Some(next) = node.offset(dx, dy) else {
                continue;
            };
            if !self.allows_step(node, next) {
                continue;
            }
            let cost = if dx != 0 && dy != 0 {
                DIAGONAL_COST
            } else {
                ORTHOGONAL_COST
            };
            points.push((next, cost));
        }

        points.into_iter()
    }

    fn create_storage<T: Default + Copy + 'static>(&self) -> Self::Storage<T> {
        CellStorage {
            columns: self.columns,
            cells: vec![Default::default(); self.columns * self.rows],
        }
    }
}
