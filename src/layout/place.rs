use super::error::Result;
use super::squarify::{squarify, Direction, Extent, Row, RowId, TreeMap};

/// Measured size of the element the treemap is drawn into (px).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> f32 {
        self.width * self.height
    }
}

/// Configuration for treemap tile placement.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Smallest tile side (px) worth rendering. Layout stops at the first row
    /// whose smallest tile would not be larger than this squared.
    pub min_tile_side: f32,
    /// Padding around every tile (px)
    pub gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_tile_side: 36.0,
            gap: 2.0,
        }
    }
}

/// A tile positioned in viewport pixels.
#[derive(Debug, Clone)]
pub struct PlacedTile<'a, T> {
    pub item: &'a T,
    pub row: RowId,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Tile holds the synthetic rest item
    pub is_rest: bool,
}

/// Interrupt predicate that stops layout once tiles get too small to render.
///
/// A row covers `edge_length * cross_edge_length / root area` of the viewport;
/// its smallest item gets its weight share of that. An unmeasured viewport
/// never interrupts.
pub fn min_side_interrupt<T, W>(
    viewport: Viewport,
    config: &LayoutConfig,
    weight: W,
) -> impl FnMut(&Row<T>, Extent) -> bool
where
    W: Fn(&T) -> f64,
{
    let min_area = f64::from(config.min_tile_side).powi(2);
    let viewport_area = f64::from(viewport.area());

    move |row: &Row<T>, root: Extent| {
        if viewport_area <= 0.0 || root.area() <= 0.0 {
            return true;
        }
        let Some(min) = row.nodes.iter().map(&weight).reduce(f64::min) else {
            return true;
        };
        let sum: f64 = row.nodes.iter().map(&weight).sum();
        if sum <= 0.0 {
            return true;
        }

        let row_area = viewport_area * row.area() / root.area();
        min / sum * row_area > min_area
    }
}

/// Lay out `items` for a viewport, deferring everything from the first row
/// whose tiles would fall below `config.min_tile_side` into the rest item.
pub fn compute_layout<T, W, R>(
    items: impl IntoIterator<Item = T>,
    weight: W,
    rest: R,
    viewport: Viewport,
    config: &LayoutConfig,
) -> Result<TreeMap<T>>
where
    W: Fn(&T) -> f64,
    R: FnOnce(f64, Vec<T>) -> T,
{
    let map = squarify(
        items,
        &weight,
        min_side_interrupt(viewport, config, &weight),
        rest,
    )?;

    tracing::debug!(
        "Laid out {} items in {} rows for {:.0}x{:.0} viewport",
        map.placed_items().count(),
        map.len(),
        viewport.width,
        viewport.height
    );

    Ok(map)
}

/// Map a layout chain onto viewport pixels.
///
/// A vertical row is a column on the left of the remaining box with its items
/// stacked top to bottom; a horizontal row is a band at the top with its items
/// left to right. The rest of the box goes to the child row.
pub fn place<'a, T, W>(
    map: &'a TreeMap<T>,
    weight: W,
    viewport: Viewport,
    config: &LayoutConfig,
) -> Vec<PlacedTile<'a, T>>
where
    W: Fn(&T) -> f64,
{
    let mut tiles = Vec::new();
    if map.is_empty() {
        return tiles;
    }

    let mut x = 0.0f64;
    let mut y = 0.0f64;
    let mut w = f64::from(viewport.width).max(0.0);
    let mut h = f64::from(viewport.height).max(0.0);
    let gap = f64::from(config.gap).max(0.0);

    for (id, row) in map.rows() {
        let share = if row.container.cross > 0.0 {
            (row.cross_edge_length / row.container.cross).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let (strip_w, strip_h) = match row.direction {
            Direction::Vertical => (w * share, h),
            Direction::Horizontal => (w, h * share),
        };
        let along = match row.direction {
            Direction::Vertical => strip_h,
            Direction::Horizontal => strip_w,
        };

        let sum: f64 = row.nodes.iter().map(&weight).sum();
        let count = row.nodes.len();
        let mut offset = 0.0;

        for (i, item) in row.nodes.iter().enumerate() {
            // Last tile takes the exact remainder of the strip
            let length = if i + 1 == count {
                along - offset
            } else if sum > 0.0 {
                weight(item) / sum * along
            } else {
                along / count as f64
            };

            let (cx, cy, cw, ch) = match row.direction {
                Direction::Vertical => (x, y + offset, strip_w, length),
                Direction::Horizontal => (x + offset, y, length, strip_h),
            };
            offset += length;

            if !(cx.is_finite() && cy.is_finite() && cw.is_finite() && ch.is_finite()) {
                tracing::warn!(
                    "Place: invalid tile (x={}, y={}, w={}, h={}) in row {}, skipping",
                    cx,
                    cy,
                    cw,
                    ch,
                    id.index()
                );
                continue;
            }

            tiles.push(PlacedTile {
                item,
                row: id,
                x: (cx + gap) as f32,
                y: (cy + gap) as f32,
                w: (cw - 2.0 * gap).max(0.0) as f32,
                h: (ch - 2.0 * gap).max(0.0) as f32,
                is_rest: map.is_rest(id),
            });
        }

        match row.direction {
            Direction::Vertical => {
                x += strip_w;
                w = (w - strip_w).max(0.0);
            }
            Direction::Horizontal => {
                y += strip_h;
                h = (h - strip_h).max(0.0);
            }
        }
    }

    tiles
}
