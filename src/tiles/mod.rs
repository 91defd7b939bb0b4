//! Map panel: asynchronous slippy-map tile manager.
//!
//! [`TileMapManager`] is the render loop's only map interface. The single
//! synchronous entry point, [`TileMapManager::get_static_map`], never blocks:
//! it returns whatever composite was last published (possibly stale, possibly
//! none) and, when the view has gone stale, starts at most one background
//! load on the manager's own tokio runtime. The worker publishes its result
//! wholesale - composite, label and last-rendered position in one write -
//! so the render thread only ever sees complete snapshots.
//!
//! States: Idle -> Loading -> Idle (success) or Idle -> Loading -> fallback
//! published -> Idle. The Idle/Loading latch is an atomic compare-and-swap,
//! so concurrent callers cannot start two loads.

pub mod compose;
pub mod projection;
pub mod source;
pub mod traits;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use image::RgbaImage;
use parking_lot::RwLock;

use crate::config::MapConfig;
use self::projection::TileKey;
use self::source::TileSource;
use self::traits::{HttpTileApi, TileApi};

/// Manager construction errors.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to start map runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Why a whole-composite load failed.
#[derive(Debug, thiserror::Error)]
enum LoadError {
    #[error("no tiles could be fetched")]
    NoTiles,
}

/// Published map state. Written wholesale by the load worker, read by the
/// render thread.
#[derive(Default)]
struct MapState {
    surface: Option<Arc<RgbaImage>>,
    source_label: String,
    last_lat: Option<f64>,
    last_lon: Option<f64>,
    last_zoom: Option<u8>,
}

struct ManagerInner {
    cfg: MapConfig,
    source: TileSource,
    state: RwLock<MapState>,
    zoom: AtomicU8,
    content_area: RwLock<Option<(u32, u32)>>,
    loading: AtomicBool,
}

pub struct TileMapManager {
    inner: Arc<ManagerInner>,
    // Option only so Drop can take it for shutdown_background.
    runtime: Option<tokio::runtime::Runtime>,
}

impl TileMapManager {
    /// Build a manager over an injected tile API (tests use mocks here).
    pub fn new(cfg: MapConfig, api: Arc<dyn TileApi>) -> Result<Self, MapError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("map-loader")
            .enable_all()
            .build()?;

        let source = TileSource::new(api, cfg.tile_servers.clone(), cfg.tile_tint);
        let zoom = cfg.initial_zoom.clamp(cfg.min_zoom, cfg.max_zoom);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                cfg,
                source,
                state: RwLock::new(MapState {
                    source_label: "LOADING...".to_string(),
                    ..MapState::default()
                }),
                zoom: AtomicU8::new(zoom),
                content_area: RwLock::new(None),
                loading: AtomicBool::new(false),
            }),
            runtime: Some(runtime),
        })
    }

    /// Build a manager with the real HTTP tile fetcher.
    pub fn with_http(cfg: MapConfig) -> Result<Self, MapError> {
        let api = Arc::new(HttpTileApi::new(Duration::from_secs(
            cfg.request_timeout_secs,
        )));
        Self::new(cfg, api)
    }

    /// Return the current composite and status label immediately, kicking
    /// off a background reload first when the view has gone stale and no
    /// load is already in flight.
    pub fn get_static_map(&self, lat: f64, lon: f64) -> (Option<Arc<RgbaImage>>, String) {
        let zoom = self.current_zoom();
        let stale = self.is_stale(lat, lon, zoom);

        // Atomic check-and-set: losing the exchange means another load is
        // already in flight and this request is a no-op.
        if stale
            && self
                .inner
                .loading
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            self.inner.state.write().source_label = "LOADING...".to_string();
            let inner = self.inner.clone();
            self.runtime().spawn(async move {
                inner.load_map(lat, lon).await;
            });
        }

        let state = self.inner.state.read();
        (state.surface.clone(), state.source_label.clone())
    }

    pub fn zoom_in(&self) {
        let max = self.inner.cfg.max_zoom;
        let _ = self
            .inner
            .zoom
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |z| {
                (z < max).then_some(z + 1)
            });
    }

    pub fn zoom_out(&self) {
        let min = self.inner.cfg.min_zoom;
        let _ = self
            .inner
            .zoom
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |z| {
                (z > min).then_some(z - 1)
            });
    }

    pub fn current_zoom(&self) -> u8 {
        self.inner.zoom.load(Ordering::SeqCst)
    }

    /// Target size the composite is scaled to before publishing.
    pub fn set_content_area(&self, width: u32, height: u32) {
        *self.inner.content_area.write() = Some((width, height));
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst)
    }

    /// Block until no load is in flight (one-shot callers and tests).
    /// Returns false if the timeout elapsed first.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        true
    }

    fn is_stale(&self, lat: f64, lon: f64, zoom: u8) -> bool {
        let state = self.inner.state.read();
        if state.surface.is_none() {
            return true;
        }
        let (Some(last_lat), Some(last_lon), Some(last_zoom)) =
            (state.last_lat, state.last_lon, state.last_zoom)
        else {
            return true;
        };
        if last_zoom != zoom {
            return true;
        }
        let eps = self.inner.cfg.staleness_epsilon_deg;
        (lat - last_lat).abs() > eps || (lon - last_lon).abs() > eps
    }

    fn runtime(&self) -> &tokio::runtime::Runtime {
        self.runtime
            .as_ref()
            .expect("runtime present until drop")
    }
}

impl Drop for TileMapManager {
    fn drop(&mut self) {
        // Detached semantics: in-flight loads must not block shutdown.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl ManagerInner {
    /// Background load procedure. Publishes exactly once (real mosaic or
    /// fallback placeholder) and always clears the loading latch at the end.
    async fn load_map(self: Arc<Self>, lat: f64, lon: f64) {
        let zoom = self.zoom.load(Ordering::SeqCst);
        tracing::debug!("Loading map at ({lat:.4}, {lon:.4}) zoom {zoom}");

        match self.build_mosaic(lat, lon, zoom).await {
            Ok((mosaic, loaded, total)) => {
                let content_area = *self.content_area.read();
                let composite = compose::finish(mosaic, content_area);

                let mut state = self.state.write();
                state.surface = Some(Arc::new(composite));
                state.source_label = format!("REAL MAP ({loaded}/{total} tiles)");
                state.last_lat = Some(lat);
                state.last_lon = Some(lon);
                state.last_zoom = Some(zoom);
                tracing::info!("Map loaded: {loaded}/{total} tiles at zoom {zoom}");
            }
            Err(e) => {
                tracing::warn!("Map load failed ({e}), publishing fallback");
                let content_area = *self.content_area.read();
                let placeholder = compose::fallback_placeholder(
                    content_area,
                    self.cfg.tiles_wide,
                    self.cfg.tiles_high,
                );

                // last_rendered_* deliberately not updated: the next
                // get_static_map call retries the load.
                let mut state = self.state.write();
                state.surface = Some(Arc::new(placeholder));
                state.source_label = "FALLBACK MODE".to_string();
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    /// Fetch the tile grid around the center coordinate and composite it.
    async fn build_mosaic(
        &self,
        lat: f64,
        lon: f64,
        zoom: u8,
    ) -> Result<(RgbaImage, u32, u32), LoadError> {
        let (center_x, center_y) = projection::lat_lon_to_tile(lat, lon, zoom);
        let start_x = center_x - (self.cfg.tiles_wide / 2) as i32;
        let start_y = center_y - (self.cfg.tiles_high / 2) as i32;

        let mut mosaic =
            compose::blank_mosaic(self.cfg.tiles_wide, self.cfg.tiles_high, self.cfg.fill_color);
        let total = self.cfg.tiles_wide * self.cfg.tiles_high;
        let mut loaded = 0u32;

        for grid_y in 0..self.cfg.tiles_high {
            for grid_x in 0..self.cfg.tiles_wide {
                let tile_x = start_x + grid_x as i32;
                let tile_y = start_y + grid_y as i32;
                if !projection::in_range(tile_x, tile_y, zoom) {
                    continue;
                }
                let key = TileKey {
                    x: tile_x,
                    y: tile_y,
                    zoom,
                };
                if let Some(tile) = self.source.get_tile(key).await {
                    compose::place_tile(&mut mosaic, &tile, grid_x, grid_y);
                    loaded += 1;
                }
            }
        }

        if loaded == 0 {
            return Err(LoadError::NoTiles);
        }
        Ok((mosaic, loaded, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tile_png;
    use crate::tiles::traits::mocks::MockTileApi;

    const WAIT: Duration = Duration::from_secs(10);

    fn test_config() -> MapConfig {
        MapConfig {
            tile_servers: vec!["https://a.tile.example/{z}/{x}/{y}.png".to_string()],
            ..MapConfig::default()
        }
    }

    fn serving_manager() -> (TileMapManager, Arc<MockTileApi>) {
        let api = Arc::new(MockTileApi::serving(tile_png(8, [40, 60, 40, 255])));
        let manager = TileMapManager::new(test_config(), api.clone()).unwrap();
        (manager, api)
    }

    #[test]
    fn test_first_call_returns_nothing_and_starts_load() {
        let (manager, _api) = serving_manager();

        let (surface, label) = manager.get_static_map(51.5, -0.12);
        assert!(surface.is_none());
        assert_eq!(label, "LOADING...");

        assert!(manager.wait_until_idle(WAIT));
        let (surface, label) = manager.get_static_map(51.5, -0.12);
        assert!(surface.is_some());
        assert_eq!(label, "REAL MAP (9/9 tiles)");
    }

    #[test]
    fn test_repeat_calls_below_epsilon_reuse_composite() {
        let (manager, api) = serving_manager();

        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));
        let calls_after_first = api.call_count();

        let (first, _) = manager.get_static_map(51.5, -0.12);
        let (second, _) = manager.get_static_map(51.50005, -0.12005);
        assert!(manager.wait_until_idle(WAIT));

        // Same published Arc, no further network traffic.
        assert!(Arc::ptr_eq(first.as_ref().unwrap(), second.as_ref().unwrap()));
        assert_eq!(api.call_count(), calls_after_first);
    }

    #[test]
    fn test_location_change_beyond_epsilon_triggers_reload() {
        let (manager, _api) = serving_manager();

        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));
        let (first, _) = manager.get_static_map(51.5, -0.12);

        // Move well past the epsilon (0.0001 degrees).
        manager.get_static_map(51.6, -0.12);
        assert!(manager.wait_until_idle(WAIT));
        let (second, label) = manager.get_static_map(51.6, -0.12);

        assert!(!Arc::ptr_eq(first.as_ref().unwrap(), second.as_ref().unwrap()));
        assert_eq!(label, "REAL MAP (9/9 tiles)");
    }

    #[test]
    fn test_zoom_change_invalidates_composite_but_keeps_tile_cache() {
        let (manager, api) = serving_manager();

        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));
        let calls_zoom_initial = api.call_count();
        assert_eq!(calls_zoom_initial, 9);

        manager.zoom_in();
        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));

        // A fresh grid was fetched at the new zoom...
        assert_eq!(api.call_count(), 18);

        // ...and returning to the old zoom is served from cache.
        manager.zoom_out();
        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));
        assert_eq!(api.call_count(), 18);
    }

    #[test]
    fn test_zoom_clamped_to_bounds() {
        let (manager, _api) = serving_manager();
        for _ in 0..40 {
            manager.zoom_in();
        }
        assert_eq!(manager.current_zoom(), 18);
        for _ in 0..40 {
            manager.zoom_out();
        }
        assert_eq!(manager.current_zoom(), 2);
    }

    #[test]
    fn test_all_servers_failing_publishes_fallback() {
        let api = Arc::new(MockTileApi::failing());
        let manager = TileMapManager::new(test_config(), api).unwrap();

        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));

        let (surface, label) = manager.get_static_map(51.5, -0.12);
        // The second call starts a retry; the published composite is the
        // fallback from the first attempt.
        assert!(surface.is_some());
        assert!(label == "FALLBACK MODE" || label == "LOADING...");
        assert!(manager.wait_until_idle(WAIT));
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_only_one_load_in_flight() {
        let api = Arc::new(
            MockTileApi::serving(tile_png(8, [0, 0, 0, 255]))
                .with_delay(Duration::from_millis(30)),
        );
        let manager = TileMapManager::new(test_config(), api.clone()).unwrap();

        // Hammer the entry point while the first load is still running.
        for _ in 0..20 {
            manager.get_static_map(51.5, -0.12);
        }
        assert!(manager.wait_until_idle(WAIT));

        // Exactly one 3x3 grid was fetched.
        assert_eq!(api.call_count(), 9);
    }

    #[test]
    fn test_content_area_scaling_applied() {
        let (manager, _api) = serving_manager();
        manager.set_content_area(320, 240);

        manager.get_static_map(51.5, -0.12);
        assert!(manager.wait_until_idle(WAIT));

        let (surface, _) = manager.get_static_map(51.5, -0.12);
        assert_eq!(surface.unwrap().dimensions(), (320, 240));
    }

    #[test]
    fn test_out_of_range_rows_fetch_fewer_tiles() {
        // Center at the top of the world at zoom 2: the grid's top row is
        // out of range and must be skipped, not requested.
        let (manager, api) = serving_manager();
        for _ in 0..10 {
            manager.zoom_out();
        }
        assert_eq!(manager.current_zoom(), 2);

        manager.get_static_map(84.9, 0.0);
        assert!(manager.wait_until_idle(WAIT));

        let (_, label) = manager.get_static_map(84.9, 0.0);
        assert!(api.call_count() < 9);
        assert!(label.starts_with("REAL MAP ("));
    }
}
