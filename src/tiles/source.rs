//! Tile acquisition: cache plus multi-server failover.
//!
//! A tile is fetched at most once per session: first success goes into the
//! in-memory cache keyed by `(x, y, zoom)` and is served from there forever
//! after (the cache is deliberately unbounded for the manager's lifetime).
//! On a miss, each configured server template is tried in fixed order; the
//! first 200 response that decodes wins. Per-tile failure is not fatal, the
//! caller leaves that mosaic cell blank.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

use super::projection::TileKey;
use super::traits::{TileApi, TileError};

pub struct TileSource {
    api: Arc<dyn TileApi>,
    servers: Vec<String>,
    tint: [u8; 4],
    cache: Mutex<HashMap<TileKey, RgbaImage>>,
}

impl TileSource {
    pub fn new(api: Arc<dyn TileApi>, servers: Vec<String>, tint: [u8; 4]) -> Self {
        Self {
            api,
            servers,
            tint,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Get one tile, from cache or network. `None` means every server
    /// failed; the caller renders the cell blank.
    pub async fn get_tile(&self, key: TileKey) -> Option<RgbaImage> {
        if let Some(tile) = self.cache.lock().get(&key) {
            return Some(tile.clone());
        }

        for server in &self.servers {
            let url = tile_url(server, key);
            match self.api.fetch(&url).await {
                Ok(bytes) => match image::load_from_memory(&bytes) {
                    Ok(img) => {
                        let mut tile = img.into_rgba8();
                        apply_tint(&mut tile, self.tint);
                        self.cache.lock().insert(key, tile.clone());
                        return Some(tile);
                    }
                    Err(e) => {
                        tracing::warn!("Tile {},{} z{} from {}: {}", key.x, key.y, key.zoom, url, TileError::Decode(e.to_string()));
                        continue;
                    }
                },
                Err(e) => {
                    tracing::warn!("Tile {},{} z{} from {}: {}", key.x, key.y, key.zoom, url, e);
                    continue;
                }
            }
        }
        None
    }

    /// Number of tiles currently cached (all zoom levels).
    pub fn cached_tiles(&self) -> usize {
        self.cache.lock().len()
    }
}

/// Substitute {z}/{x}/{y} placeholders in a server template.
fn tile_url(template: &str, key: TileKey) -> String {
    template
        .replace("{z}", &key.zoom.to_string())
        .replace("{x}", &key.x.to_string())
        .replace("{y}", &key.y.to_string())
}

/// Blend a fixed translucent color over the tile (visual styling only).
fn apply_tint(tile: &mut RgbaImage, tint: [u8; 4]) {
    let [tr, tg, tb, ta] = tint.map(u32::from);
    if ta == 0 {
        return;
    }
    for pixel in tile.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        pixel.0 = [
            ((u32::from(r) * (255 - ta) + tr * ta) / 255) as u8,
            ((u32::from(g) * (255 - ta) + tg * ta) / 255) as u8,
            ((u32::from(b) * (255 - ta) + tb * ta) / 255) as u8,
            a,
        ];
    }
}
