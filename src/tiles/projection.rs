//! Web-Mercator slippy-map tile projection.
//!
//! Standard XYZ tile addressing as used by OpenStreetMap-style servers:
//! at zoom z the world is a 2^z x 2^z grid of 256x256 tiles.

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Address of one raster tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub x: i32,
    pub y: i32,
    pub zoom: u8,
}

/// Project a geographic coordinate to the tile containing it.
///
/// No bounds clamping happens here; callers decide which indices are
/// fetchable via [`in_range`].
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> (i32, i32) {
    let lat_rad = lat.to_radians();
    let n = 2f64.powi(i32::from(zoom));
    let x = ((lon + 180.0) / 360.0 * n).floor() as i32;
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor() as i32;
    (x, y)
}

/// Largest valid tile index at a zoom level. Zoom is capped at 30 so the
/// shift stays in range whatever bounds the config file declares.
pub fn max_tile_index(zoom: u8) -> i32 {
    (1i32 << zoom.min(30)) - 1
}

/// Whether both indices lie inside the tile grid at this zoom.
pub fn in_range(x: i32, y: i32, zoom: u8) -> bool {
    let max = max_tile_index(zoom);
    (0..=max).contains(&x) && (0..=max).contains(&y)
}
