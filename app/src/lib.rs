use pairtrack_core::scale::LinearScale;

pub mod arcs;
pub mod barbell;
pub mod labels;
pub mod options;
pub mod registry;
pub mod surface;
pub mod svg;
pub mod tiles;

use options::TrackOptions;
use tiles::{Tile, TileId, TiledTrack};

/// Lifecycle hooks a track exposes to the host.
///
/// Tracks keep the shared tiled-track state in a [`TiledTrack`] and hand
/// it out through `base`/`base_mut`; the provided methods delegate to it.
pub trait Track {
    fn base(&self) -> &TiledTrack;

    fn base_mut(&mut self) -> &mut TiledTrack;

    fn init_tile(&mut self, _tile: &TileId) {}

    fn destroy_tile(&mut self, _tile: &TileId) {}

    fn update_tile(&mut self, _tile: &TileId) {}

    fn draw_tile(&mut self, tile: &TileId);

    /// Called by the host when tiles have been fetched.
    fn receive_tiles(&mut self, tiles: Vec<Tile>);

    fn remove_tiles(&mut self, ids: &[TileId]) {
        for id in ids {
            self.destroy_tile(id);
        }
        self.base_mut().remove_tiles(ids);
    }

    fn rerender(&mut self, options: TrackOptions, force: bool);

    fn zoomed(&mut self, x_scale: LinearScale, y_scale: LinearScale);

    fn set_position(&mut self, position: [f64; 2]) {
        self.base_mut().position = position;
    }

    fn set_dimensions(&mut self, dimensions: [f64; 2]) {
        self.base_mut().dimensions = dimensions;
    }

    fn draw(&mut self);

    fn export_svg(&self) -> String;

    /// Tooltip contents for a point in track coordinates, empty if there's
    /// nothing under it.
    fn mouse_over_html(&mut self, x: f64, y: f64) -> String;
}
