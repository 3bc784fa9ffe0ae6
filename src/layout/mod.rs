mod error;
mod place;
mod squarify;

pub use error::{LayoutError, Result};
pub use place::{compute_layout, min_side_interrupt, place, LayoutConfig, PlacedTile, Viewport};
pub use squarify::{root_edge_length, squarify, Direction, Extent, Row, RowId, Rows, TreeMap};
