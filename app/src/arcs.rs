//! Interval track drawing every record as an arc between its start and
//! end.

use indexmap::IndexMap;
use ultraviolet::Vec2;

use pairtrack_core::geometry::{circle_arc, ellipse_arc, ArcPath};
use pairtrack_core::scale::{LinearScale, LogScale};

use crate::options::{ArcStyle, TrackOptions};
use crate::surface::{Graphics, LineStyle, SceneLayer, TextStyle};
use crate::svg::{self, SvgWriter};
use crate::tiles::{Tile, TileId, TiledTrack};
use crate::Track;

#[derive(Debug, Clone, PartialEq)]
pub struct ArcStroke {
    pub path: ArcPath,
    pub opacity: f32,
}

impl ArcStroke {
    fn points(&self) -> impl Iterator<Item = Vec2> + '_ {
        std::iter::once(self.path.start).chain(self.path.points.iter().copied())
    }
}

fn opacity_scale() -> LogScale {
    LogScale::new([1.0, 1000.0], [1.0, 0.1])
}

pub struct ArcsTrack<G: Graphics = SceneLayer> {
    base: TiledTrack,
    tile_graphics: IndexMap<TileId, G>,
    error_graphics: G,
}

impl<G: Graphics + Default> ArcsTrack<G> {
    pub fn new(options: TrackOptions) -> Self {
        Self {
            base: TiledTrack::new(options),
            tile_graphics: IndexMap::new(),
            error_graphics: G::default(),
        }
    }

    pub fn error_graphics(&self) -> &G {
        &self.error_graphics
    }

    pub fn tile_graphics(&self, tile: &TileId) -> Option<&G> {
        self.tile_graphics.get(tile)
    }

    /// Widest interval over the fetched tiles, at least 1.
    pub fn max_width(&self) -> f64 {
        self.base
            .fetched_tiles()
            .flat_map(|tile| tile.data().iter())
            .map(|r| r.x_end() - r.x_start())
            .filter(|w| !w.is_nan())
            .fold(1.0, f64::max)
    }

    /// Arc polylines for the records of `tile`, in pixels.
    pub fn arc_strokes(&self, tile: &Tile) -> Vec<ArcStroke> {
        let options = &self.base.options;
        let x_scale = self.base.x_scale();
        let [r0, r1] = x_scale.range();
        let [width, height] = self.base.dimensions;

        let height_scale = LinearScale::new(
            [0.0, self.max_width()],
            [height / 4.0, 3.0 * height / 4.0],
        );
        let opacity = opacity_scale();
        let stroke_opacity = options.stroke_opacity();
        let flip = options.flipped();

        let mut strokes = Vec::new();

        for record in tile.data() {
            let x1 = x_scale.map(record.x_start());
            let x2 = x_scale.map(record.x_end());

            if options.completely_contained && (x1 < r0 || x2 > r1) {
                continue;
            }

            let stroke = match options.arc_style() {
                ArcStyle::Circle => {
                    let h = (x2 - x1) / 2.0;
                    circle_arc(x1 as f32, x2 as f32, height as f32, width as f32, flip)
                        .map(|path| (path, h))
                }
                ArcStyle::Ellipse => {
                    let h = height_scale.map(record.x_end() - record.x_start());
                    let path =
                        ellipse_arc(x1 as f32, x2 as f32, h as f32, height as f32, flip);
                    Some((path, h))
                }
            };

            if let Some((path, h)) = stroke {
                strokes.push(ArcStroke {
                    path,
                    opacity: opacity.map(h) as f32 * stroke_opacity,
                });
            }
        }

        strokes
    }

    /// Replaces every arc with the error text, centered on the track.
    fn draw_error(&mut self, err: &str) {
        for graphics in self.tile_graphics.values_mut() {
            graphics.clear();
        }

        let center = Vec2::new(
            (self.base.width() / 2.0) as f32,
            (self.base.height() / 2.0) as f32,
        );
        self.error_graphics.clear();
        self.error_graphics
            .draw_text(err, center, &TextStyle::default());
    }

    fn redraw_all(&mut self) {
        let ids = self.base.fetched_ids().cloned().collect::<Vec<_>>();
        for id in &ids {
            self.draw_tile(id);
        }
    }
}

impl<G: Graphics + Default> Track for ArcsTrack<G> {
    fn base(&self) -> &TiledTrack {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TiledTrack {
        &mut self.base
    }

    fn init_tile(&mut self, tile: &TileId) {
        self.tile_graphics.entry(tile.clone()).or_default();
    }

    fn destroy_tile(&mut self, tile: &TileId) {
        self.tile_graphics.shift_remove(tile);
    }

    fn draw_tile(&mut self, id: &TileId) {
        let Some(tile) = self.base.tile(id) else {
            return;
        };
        let strokes = self.arc_strokes(tile);

        let options = &self.base.options;
        let (color, width) = (options.stroke_color(), options.stroke_width());

        let graphics = self.tile_graphics.entry(id.clone()).or_default();
        graphics.clear();
        for stroke in &strokes {
            graphics.line_style(Some(LineStyle::new(width, color, stroke.opacity)));
            graphics.move_to(stroke.path.start);
            for p in &stroke.path.points {
                graphics.line_to(*p);
            }
        }
    }

    fn receive_tiles(&mut self, tiles: Vec<Tile>) {
        let ids = self.base.insert_tiles(tiles);
        for id in &ids {
            self.init_tile(id);
        }
        self.draw();
    }

    fn rerender(&mut self, options: TrackOptions, force: bool) {
        log::debug!("rerender arcs (force: {force})");
        self.base.options = options;
        self.draw();
    }

    fn zoomed(&mut self, x_scale: LinearScale, y_scale: LinearScale) {
        self.base.set_scales(x_scale, y_scale);
        self.draw();
    }

    fn draw(&mut self) {
        if let Some(err) = self.base.error_text() {
            log::warn!("not drawing arcs, tiles have errors: {err}");
            self.draw_error(&err);
            return;
        }
        self.error_graphics.clear();
        self.redraw_all();
    }

    fn export_svg(&self) -> String {
        let options = &self.base.options;
        let stroke = options.stroke_color().to_string();
        let stroke_width = options.stroke_width().to_string();

        let mut w = SvgWriter::new();
        let [px, py] = self.base.position;
        w.open_group(&[
            ("class", "exported-arcs-track".to_string()),
            ("transform", svg::translate(px, py)),
        ]);

        for tile in self.base.visible_or_fetched_tiles() {
            for arc in self.arc_strokes(tile) {
                let points = arc.points().collect::<Vec<_>>();
                w.path(
                    &svg::path_data(&points),
                    &[
                        ("fill", "transparent".to_string()),
                        ("stroke", stroke.clone()),
                        ("stroke-width", stroke_width.clone()),
                        ("opacity", arc.opacity.to_string()),
                    ],
                );
            }
        }

        w.finish()
    }

    fn mouse_over_html(&mut self, _x: f64, _y: f64) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Shape;
    use pairtrack_core::TileRecord;

    fn track(options: TrackOptions) -> ArcsTrack {
        let mut t: ArcsTrack = ArcsTrack::new(options);
        t.set_dimensions([100.0, 40.0]);
        t.base_mut().set_scales(
            LinearScale::new([0.0, 100.0], [0.0, 100.0]),
            LinearScale::default(),
        );
        t
    }

    fn interval(uid: &str, start: f64, end: f64) -> TileRecord {
        TileRecord::new(uid, ["chr1".to_string(), start.to_string(), end.to_string()])
    }

    #[test]
    fn ellipse_height_follows_interval_width() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [interval("a", 0.0, 20.0), interval("b", 40.0, 50.0)],
        )]);

        assert_eq!(t.max_width(), 20.0);

        let tile = t.base().tile(&TileId::from("0.0")).unwrap();
        let strokes = t.arc_strokes(tile);
        assert_eq!(strokes.len(), 2);

        // the widest arc is 3/4 of the height tall, sampled at 10 angles
        let peak = (4.0 * std::f32::consts::PI / 9.0).sin();
        let apex = |s: &ArcStroke| {
            s.path.points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
        };
        assert!((apex(&strokes[0]) - (40.0 - 30.0 * peak)).abs() < 1e-3);
        assert!((apex(&strokes[1]) - (40.0 - 20.0 * peak)).abs() < 1e-3);
        assert_eq!(strokes[0].path.start, Vec2::new(0.0, 40.0));
    }

    #[test]
    fn draws_one_path_per_arc_with_stroke_style() {
        let opts = TrackOptions::from_json(
            r#"{"arcStyle": "circle", "strokeColor": "red", "strokeWidth": 3}"#,
        )
        .unwrap();
        let mut t = track(opts);
        t.receive_tiles(vec![Tile::records("0.0", [interval("a", 10.0, 30.0)])]);

        let graphics = t.tile_graphics(&TileId::from("0.0")).unwrap();
        let paths = graphics
            .shapes()
            .iter()
            .filter_map(|s| match s {
                Shape::Path { points, line } => Some((points.len(), *line)),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(paths.len(), 1);

        let (len, line) = paths[0];
        assert_eq!(len, 11);
        let line = line.unwrap();
        assert_eq!(line.width, 3.0);
        assert_eq!(line.color.to_string(), "rgb(255,0,0)");
    }

    #[test]
    fn completely_contained_skips_clipped_arcs() {
        let opts = TrackOptions {
            completely_contained: true,
            ..Default::default()
        };
        let mut t = track(opts);
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [interval("in", 10.0, 20.0), interval("out", 90.0, 150.0)],
        )]);
        let tile = t.base().tile(&TileId::from("0.0")).unwrap();
        assert_eq!(t.arc_strokes(tile).len(), 1);
    }

    #[test]
    fn flipped_arcs_hang_from_the_top() {
        let opts = TrackOptions::from_json(r#"{"flip1D": "yes"}"#).unwrap();
        let mut t = track(opts);
        t.receive_tiles(vec![Tile::records("0.0", [interval("a", 0.0, 20.0)])]);
        let tile = t.base().tile(&TileId::from("0.0")).unwrap();
        let stroke = &t.arc_strokes(tile)[0];
        assert_eq!(stroke.path.start.y, 0.0);
        assert!(stroke.path.points.iter().all(|p| p.y >= -1e-3));
    }

    #[test]
    fn exports_transparent_paths() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![Tile::records("0.0", [interval("a", 0.0, 20.0)])]);
        let svg = t.export_svg();
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains("fill=\"transparent\""));
        assert!(svg.contains("stroke=\"rgb(0,0,255)\""));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn errors_replace_the_arcs() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![
            Tile::records("0.0", [interval("a", 0.0, 20.0)]),
            Tile::error("0.1", "broken"),
        ]);

        assert!(t.tile_graphics(&TileId::from("0.0")).unwrap().is_empty());
        assert_eq!(t.error_graphics().texts().collect::<Vec<_>>(), ["0.1: broken"]);

        t.remove_tiles(&[TileId::from("0.1")]);
        t.draw();
        assert!(t.error_graphics().is_empty());
        assert!(!t.tile_graphics(&TileId::from("0.0")).unwrap().is_empty());
    }

    #[test]
    fn removing_tiles_drops_their_graphics() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![Tile::records("0.0", [interval("a", 0.0, 20.0)])]);
        t.remove_tiles(&[TileId::from("0.0")]);
        assert!(t.tile_graphics(&TileId::from("0.0")).is_none());
        assert!(t.base().tile(&TileId::from("0.0")).is_none());
    }
}
