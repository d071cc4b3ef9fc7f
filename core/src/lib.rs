//! Pure logic for inksolve: stroke rendering, raster export and solution parsing.
//!
//! Nothing here performs IO beyond in-memory PNG encoding.

mod extract;
mod raster;
mod solution;
mod surface;

pub use extract::extract_json_candidate;
pub use raster::{RasterCanvas, render_png};
pub use solution::parse_solution;
pub use surface::{StrokeStyle, StrokeSurface, redraw, render_live};
