// Paints the sky into a character grid: rain first, then branches, then the bolt on top.
use crate::shared::DisplayState;
use crate::visuals::BoltPath;

pub const DROP: char = '╎';
pub const HEAVY_DROP: char = '│';
pub const BRANCH: char = '·';

#[derive(Clone, Debug, PartialEq)]
pub struct SkyGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<Vec<char>>,
}

impl SkyGrid {
    fn empty(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![vec![' '; width]; height] }
    }

    fn put(&mut self, col: usize, row: usize, c: char) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = c;
        }
    }

    fn col(&self, x: f64) -> usize {
        (x.clamp(0.0, 1.0) * (self.width.saturating_sub(1)) as f64).round() as usize
    }

    fn row(&self, y: f64) -> usize {
        (y.clamp(0.0, 1.0) * (self.height.saturating_sub(1)) as f64).round() as usize
    }

    #[cfg(test)]
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.cells.iter().map(|r| r.iter().collect())
    }
}

fn lit(opacity: Option<f32>) -> bool {
    opacity.is_some_and(|o| o > 0.0)
}

pub fn paint_sky(state: &DisplayState, width: usize, height: usize) -> SkyGrid {
    let mut grid = SkyGrid::empty(width, height);
    if width == 0 || height == 0 {
        return grid;
    }

    if state.rain_visible {
        for drop in state.drops.iter().filter(|d| d.y < 1.0) {
            let c = if drop.opacity > 0.55 { HEAVY_DROP } else { DROP };
            let (col, row) = (grid.col(drop.x), (drop.y * height as f64) as usize);
            grid.put(col, row, c);
        }
    }

    if state.lightning.is_dark() {
        return grid;
    }
    if lit(state.lightning.branches) {
        for branch in &state.branches {
            for &(x, y) in &branch.points {
                let (col, row) = (grid.col(x), grid.row(y));
                grid.put(col, row, BRANCH);
            }
        }
    }

    if lit(state.lightning.bolt) {
        if let Some(bolt) = &state.bolt {
            draw_bolt(&mut grid, bolt);
        }
    }
    grid
}

// One glyph per row crossed; the slant follows the horizontal drift.
fn draw_bolt(grid: &mut SkyGrid, bolt: &BoltPath) {
    for pair in bolt.points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let (c0, c1) = (grid.col(x0), grid.col(x1));
        let (r0, r1) = (grid.row(y0), grid.row(y1));
        let glyph = match c1.cmp(&c0) {
            std::cmp::Ordering::Greater => '╲',
            std::cmp::Ordering::Less => '╱',
            std::cmp::Ordering::Equal => '│',
        };
        let steps = r1.saturating_sub(r0).max(1);
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let col = (c0 as f64 + (c1 as f64 - c0 as f64) * t).round() as usize;
            grid.put(col, r0 + i, glyph);
        }
    }
}
