//! Paired-interval track: every record is drawn as a barbell, two end
//! caps joined by a thin connector, packed into rows per strand or placed
//! vertically by a value column.

use std::collections::HashMap;
use std::sync::Arc;

use ultraviolet::Vec2;

use pairtrack_core::color::{ramp_scale, ColorRamp};
use pairtrack_core::layout::{LayoutItem, RowLayout};
use pairtrack_core::record::{sort_by_priority, uniqueify};
use pairtrack_core::scale::{LinearScale, ValueScale};
use pairtrack_core::transform::{
    HorizontalTransform, VerticalTransform, VerticalUpdate,
};
use pairtrack_core::{TileRecord, Uid};

use crate::labels::TextManager;
use crate::options::{ColorEncoding, TrackOptions};
use crate::surface::{
    Graphics, LayerTransform, MonospaceMeasurer, SceneLayer, TextMeasurer,
    TextStyle,
};
use crate::svg::{self, SvgWriter};
use crate::tiles::{Tile, TileId, TiledTrack};
use crate::Track;

mod hover;
mod render;
pub mod values;

pub use render::{resolve_fill, Derived, DrawnGlyph, GlyphKey, GlyphPart};

pub type GlyphRegistry = indexmap::IndexMap<GlyphKey, DrawnGlyph>;

/// Keeps the value extremes from putting glyphs half outside the track.
pub const VALUE_SCALE_MARGIN: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTick {
    pub value: f64,
    pub y: f64,
}

pub struct BarbellTrack<G: Graphics = SceneLayer> {
    base: TiledTrack,

    unique_segments: Vec<Arc<TileRecord>>,
    layout: RowLayout,
    derived: HashMap<Uid, Derived>,
    drawn_rects: GlyphRegistry,

    rect_graphics: G,
    overlay: G,
    error_graphics: G,

    text_manager: TextManager,

    vertical: VerticalTransform,
    drawn_at_scale: Option<LinearScale>,

    value_scale: Option<ValueScale>,
    color_value_scale: Option<LinearScale>,
    color_ramp: ColorRamp,
    value_axis: Vec<AxisTick>,

    selected: Option<Uid>,
    hovered: Option<Uid>,
}

fn color_ramp(options: &TrackOptions) -> ColorRamp {
    options
        .color_range
        .as_deref()
        .and_then(|stops| ColorRamp::from_css(stops))
        .unwrap_or_default()
}

fn text_style(options: &TrackOptions) -> TextStyle {
    let mut style = TextStyle::default();
    if let Some(size) = options.font_size() {
        style.font_size = size;
    }
    if let Some(color) = options.font_color() {
        style.fill = color;
    }
    style
}

impl<G: Graphics + Default> BarbellTrack<G> {
    pub fn new(options: TrackOptions) -> Self {
        Self::with_measurer(options, Box::new(MonospaceMeasurer::default()))
    }

    pub fn with_measurer(
        options: TrackOptions,
        measurer: Box<dyn TextMeasurer>,
    ) -> Self {
        let mut text_manager =
            TextManager::new(options.max_texts(), measurer);
        text_manager.set_style(text_style(&options));

        Self {
            color_ramp: color_ramp(&options),
            base: TiledTrack::new(options),

            unique_segments: Vec::new(),
            layout: RowLayout::default(),
            derived: HashMap::new(),
            drawn_rects: GlyphRegistry::default(),

            rect_graphics: G::default(),
            overlay: G::default(),
            error_graphics: G::default(),

            text_manager,

            vertical: VerticalTransform::default(),
            drawn_at_scale: None,

            value_scale: None,
            color_value_scale: None,
            value_axis: Vec::new(),

            selected: None,
            hovered: None,
        }
    }

    pub fn options(&self) -> &TrackOptions {
        &self.base.options
    }

    /// De-duplicated records of the last layout, most important first.
    pub fn unique_segments(&self) -> &[Arc<TileRecord>] {
        &self.unique_segments
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    pub fn derived(&self, uid: &Uid) -> Option<&Derived> {
        self.derived.get(uid)
    }

    pub fn drawn_rects(&self) -> &GlyphRegistry {
        &self.drawn_rects
    }

    pub fn rect_graphics(&self) -> &G {
        &self.rect_graphics
    }

    pub fn overlay(&self) -> &G {
        &self.overlay
    }

    pub fn error_graphics(&self) -> &G {
        &self.error_graphics
    }

    pub fn text_manager(&self) -> &TextManager {
        &self.text_manager
    }

    pub fn vertical(&self) -> &VerticalTransform {
        &self.vertical
    }

    pub fn value_scale(&self) -> Option<&ValueScale> {
        self.value_scale.as_ref()
    }

    pub fn value_axis(&self) -> &[AxisTick] {
        &self.value_axis
    }

    pub fn selected(&self) -> Option<&Uid> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&Uid> {
        self.hovered.as_ref()
    }

    pub fn error_text(&self) -> Option<String> {
        self.base.error_text()
    }

    /// Rebuilds the record set from the fetched tiles and lays it out.
    pub fn update_existing_graphics(&mut self) {
        if let Some(err) = self.base.error_text() {
            log::warn!("not rendering, tiles have errors: {err}");
            self.draw();
            return;
        }

        let mut unique = uniqueify(self.base.all_records().cloned());
        sort_by_priority(&mut unique);

        let value_column = self.base.options.value_column();
        let fetched = unique.len();
        unique.retain(|r| {
            r.has_finite_bounds()
                && value_column.map_or(true, |c| r.column_value(c).is_finite())
        });
        if unique.len() < fetched {
            log::debug!(
                "skipping {} records with non-numeric fields",
                fetched - unique.len()
            );
        }

        if self.base.options.completely_contained {
            let x_scale = self.base.x_scale();
            let [r0, r1] = x_scale.range();
            unique.retain(|r| {
                x_scale.map(r.x_start()) >= r0 && x_scale.map(r.y_end()) <= r1
            });
        }

        self.layout = if value_column.is_some() {
            RowLayout::single_row(unique.len())
        } else {
            let items = unique
                .iter()
                .map(|r| LayoutItem {
                    span: r.x_start()..r.y_end(),
                    strand: r.strand(),
                })
                .collect::<Vec<_>>();
            RowLayout::pack(&items)
        };

        log::debug!(
            "laid out {} records in {} + {} rows",
            unique.len(),
            self.layout.plus_row_count(),
            self.layout.minus_row_count()
        );

        self.unique_segments = unique;
        self.render();
    }

    /// Selects a record, drawing it with the highlight stroke.
    pub fn select_rect(&mut self, uid: Option<Uid>) {
        self.selected = uid;
        self.render();
        self.draw();
    }

    /// A click landed outside the track.
    pub fn click_outside(&mut self) {
        self.select_rect(None);
    }

    /// Vertical drag by `dy` pixels.
    pub fn moved_y(&mut self, dy: f64) {
        let height = self.base.height();
        if self.vertical.moved_y(dy, height) == VerticalUpdate::Relayout {
            self.render();
        }
        self.draw();
    }

    /// Vertical zoom around `y_pos`; `k_multiplier` below 1 zooms in.
    pub fn zoomed_y(&mut self, y_pos: f64, k_multiplier: f64) {
        let height = self.base.height();
        let update = self.vertical.zoomed_y(y_pos, k_multiplier, height);
        if update == VerticalUpdate::Relayout {
            self.render();
        }
        self.draw();
    }

    fn layer_transform(&self, drawn_at: &LinearScale) -> LayerTransform {
        let h = HorizontalTransform::between(drawn_at, self.base.x_scale());
        LayerTransform {
            position: Vec2::new(h.offset as f32, self.vertical.offset() as f32),
            scale: Vec2::new(
                h.scale as f32,
                self.vertical.transient_scale() as f32,
            ),
        }
    }

    fn draw_error(&mut self, err: &str) {
        self.rect_graphics.clear();
        self.overlay.clear();
        self.drawn_rects.clear();
        self.text_manager.clear();

        let center = Vec2::new(
            (self.base.width() / 2.0) as f32,
            (self.base.height() / 2.0) as f32,
        );
        self.error_graphics.clear();
        self.error_graphics
            .draw_text(err, center, &TextStyle::default());
    }

    fn set_value_scale(&mut self) {
        self.value_scale = None;

        let options = &self.base.options;
        let Some(column) = options.value_column() else {
            return;
        };

        let (min, max) = match options.color_encoding_range {
            Some([min, max]) => (Some(min), Some(max)),
            None => (
                values::min_visible_value(&self.base, column),
                values::max_visible_value(&self.base, column),
            ),
        };
        let median = values::median_visible_value(&self.base, column);

        self.value_scale = ValueScale::from_stats(
            options.value_scaling(),
            min,
            median,
            max,
            self.base.height(),
            VALUE_SCALE_MARGIN,
        );
    }

    fn set_color_value_scale(&mut self) {
        self.color_value_scale = None;

        let options = &self.base.options;
        let Some(ColorEncoding::Column(column)) = options.color_encoding else {
            return;
        };

        let (min, max) = match options.color_encoding_range {
            Some([min, max]) => (Some(min), Some(max)),
            None => (
                values::min_visible_value(&self.base, column),
                values::max_visible_value(&self.base, column),
            ),
        };

        if let (Some(min), Some(max)) = (min, max) {
            self.color_value_scale = Some(ramp_scale(min, max));
        }
    }

    fn update_texts(&mut self) {
        let options = &self.base.options;
        let requests = if options.show_texts {
            render::label_requests(&self.unique_segments, &self.derived)
        } else {
            Vec::new()
        };
        let window = self.vertical.content_extent(self.base.height());
        self.text_manager.update_texts(
            options.show_texts,
            options.max_texts(),
            &requests,
            window,
        );
    }
}

impl<G: Graphics + Default> Track for BarbellTrack<G> {
    fn base(&self) -> &TiledTrack {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TiledTrack {
        &mut self.base
    }

    fn draw_tile(&mut self, _tile: &TileId) {
        if self.base.options.value_column().is_none() {
            return;
        }
        let Some(scale) = &self.value_scale else {
            return;
        };

        let count = (self.base.height() / 30.0).ceil().max(2.0) as usize;
        self.value_axis = scale
            .ticks(count)
            .into_iter()
            .map(|value| AxisTick {
                value,
                y: scale.map(value),
            })
            .collect();
    }

    fn receive_tiles(&mut self, tiles: Vec<Tile>) {
        let ids = self.base.insert_tiles(tiles);
        for id in &ids {
            self.init_tile(id);
        }

        self.update_existing_graphics();

        for id in &ids {
            self.draw_tile(id);
        }
        self.draw();
    }

    fn rerender(&mut self, options: TrackOptions, force: bool) {
        log::debug!("rerender (force: {force})");

        self.color_ramp = color_ramp(&options);
        self.text_manager.set_style(text_style(&options));
        self.base.options = options;

        self.value_scale = None;
        self.drawn_rects.clear();

        self.update_existing_graphics();
        self.draw();
    }

    fn zoomed(&mut self, x_scale: LinearScale, y_scale: LinearScale) {
        self.base.set_scales(x_scale, y_scale);
        self.draw();
    }

    fn set_position(&mut self, position: [f64; 2]) {
        self.base.position = position;
        let options = self.base.options.clone();
        self.rerender(options, false);
    }

    /// Positions the glyph layers and labels for the current scales.
    /// Calling it repeatedly without changing anything in between gives
    /// the same result.
    fn draw(&mut self) {
        if let Some(err) = self.base.error_text() {
            self.draw_error(&err);
            return;
        }
        self.error_graphics.clear();

        let Some(drawn_at) = self.drawn_at_scale else {
            return;
        };

        let transform = self.layer_transform(&drawn_at);
        self.rect_graphics.set_transform(transform);
        self.overlay.set_transform(transform);

        let x_scale = *self.base.x_scale();
        let vertical = self.vertical;
        self.text_manager
            .draw_frame(self.base.options.show_texts, |[x, y]| {
                Vec2::new(x_scale.map(x) as f32, vertical.to_screen(y) as f32)
            });
    }

    fn export_svg(&self) -> String {
        let mut w = SvgWriter::new();
        let [px, py] = self.base.position;
        w.open_group(&[("transform", svg::translate(px, py))]);

        let transform = self.rect_graphics.transform();
        let opacity = self.base.options.fill_opacity();

        w.open_group(&[]);
        for record in &self.unique_segments {
            w.open_group(&[("transform", svg::layer_transform(&transform))]);
            for part in GlyphPart::ALL {
                let key = GlyphKey::new(record.uid.clone(), part);
                let Some(glyph) = self.drawn_rects.get(&key) else {
                    continue;
                };
                let fill = glyph.fill.to_string();
                w.path(
                    &svg::path_data(&glyph.polygon.points),
                    &[
                        ("fill", fill.clone()),
                        ("opacity", opacity.to_string()),
                        ("style", format!("stroke: {fill}; stroke-width: 1px")),
                    ],
                );
            }
            w.close();
        }
        w.close();

        let style = self.text_manager.style();
        w.open_group(&[]);
        for label in self.text_manager.visible_labels() {
            let Some(uid) = &label.uid else {
                continue;
            };
            let fill = self
                .base
                .options
                .font_color()
                .or_else(|| self.derived.get(uid).map(|d| d.fill))
                .unwrap_or(style.fill);

            w.open_group(&[(
                "transform",
                format!(
                    "{}scale(1,1)",
                    svg::translate(label.position.x as f64, label.position.y as f64)
                ),
            )]);
            w.text(
                &label.text,
                &[
                    ("text-anchor", "middle".to_string()),
                    ("font-family", style.font_family.clone()),
                    ("font-size", style.font_size.to_string()),
                    ("font-weight", "bold".to_string()),
                    ("dy", "5px".to_string()),
                    ("fill", fill.to_string()),
                    ("stroke", style.stroke.to_string()),
                    ("stroke-width", "0.4".to_string()),
                ],
            );
            w.close();
        }
        w.close();

        w.finish()
    }

    fn mouse_over_html(&mut self, x: f64, y: f64) -> String {
        self.hover_at(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairtrack_core::Strand;

    fn record(uid: &str, xs: f64, xe: f64, ys: f64, ye: f64, strand: &str) -> TileRecord {
        let f = |v: f64| v.to_string();
        TileRecord::new(
            uid,
            [
                "chr1".to_string(),
                f(xs),
                f(xe),
                format!("name_{uid}"),
                "chr1".to_string(),
                f(ys),
                f(ye),
                strand.to_string(),
            ],
        )
    }

    fn track(options: TrackOptions) -> BarbellTrack {
        let mut t: BarbellTrack = BarbellTrack::new(options);
        t.base_mut()
            .set_scales(LinearScale::new([0.0, 1000.0], [0.0, 1000.0]), LinearScale::default());
        t.base_mut().dimensions = [1000.0, 100.0];
        t
    }

    #[test]
    fn every_record_gets_three_glyph_parts() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [
                record("a", 0.0, 100.0, 300.0, 400.0, "+"),
                record("b", 500.0, 600.0, 700.0, 800.0, "-"),
            ],
        )]);

        assert_eq!(t.drawn_rects().len(), 6);
        let key = GlyphKey::new(Uid::from("a"), GlyphPart::Middle);
        assert_eq!(key.to_string(), "a_m");
        let middle = &t.drawn_rects()[&key];
        assert_eq!(middle.start, 100.0);
        assert_eq!(middle.end, 300.0);
        assert_eq!(middle.strand, Strand::Plus);
    }

    #[test]
    fn duplicate_uids_across_tiles_are_drawn_once() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![
            Tile::records("0.0", [record("a", 0.0, 10.0, 20.0, 30.0, "+")]),
            Tile::records("0.1", [record("a", 0.0, 10.0, 20.0, 30.0, "+")]),
        ]);
        assert_eq!(t.unique_segments().len(), 1);
        assert_eq!(t.drawn_rects().len(), 3);
    }

    #[test]
    fn tile_errors_replace_rendering() {
        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![
            Tile::records("0.0", [record("a", 0.0, 10.0, 20.0, 30.0, "+")]),
            Tile::error("0.1", "broken"),
        ]);
        assert_eq!(t.error_text().as_deref(), Some("0.1: broken"));
        assert!(t.drawn_rects().is_empty());
        assert_eq!(t.error_graphics().texts().collect::<Vec<_>>(), ["0.1: broken"]);
    }

    #[test]
    fn completely_contained_drops_partial_records() {
        let opts = TrackOptions {
            completely_contained: true,
            ..Default::default()
        };
        let mut t = track(opts);
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [
                record("inside", 10.0, 20.0, 30.0, 40.0, "+"),
                record("outside", 900.0, 950.0, 990.0, 1200.0, "+"),
            ],
        )]);
        let uids = t
            .unique_segments()
            .iter()
            .map(|r| r.uid.as_str())
            .collect::<Vec<_>>();
        assert_eq!(uids, ["inside"]);
    }

    #[test]
    fn value_column_places_glyphs_by_value() {
        let opts = TrackOptions {
            value_column: Some(10.0),
            ..Default::default()
        };
        let mut t = track(opts);
        let with_value = |uid: &str, value: &str| {
            let mut r = record(uid, 0.0, 10.0, 20.0, 30.0, "+");
            r.fields.push("0,0,0".to_string());
            r.fields.push(value.to_string());
            r
        };

        t.receive_tiles(vec![Tile::records(
            "0.0",
            [with_value("lo", "1"), with_value("hi", "10")],
        )]);

        assert_eq!(t.layout().plus.len(), 1);
        let y_lo = t.derived(&Uid::from("lo")).unwrap().y_middle;
        let y_hi = t.derived(&Uid::from("hi")).unwrap().y_middle;
        assert_eq!(y_hi, VALUE_SCALE_MARGIN);
        assert_eq!(y_lo, 100.0 - VALUE_SCALE_MARGIN);
        assert!(!t.value_axis().is_empty());
    }

    #[test]
    fn non_numeric_rows_are_skipped() {
        let opts = TrackOptions {
            show_texts: true,
            value_column: Some(10.0),
            ..Default::default()
        };
        let mut t = track(opts);
        let records = (0..20).map(|i| {
            let x = i as f64 * 40.0;
            let mut r = record(&format!("r{i}"), x, x + 10.0, x + 20.0, x + 30.0, "+");
            r.fields.push("0,0,0".to_string());
            r.fields.push(if i % 3 == 0 { "NA".to_string() } else { i.to_string() });
            r
        });
        t.receive_tiles(vec![Tile::records("0.0", records)]);

        assert_eq!(t.unique_segments().len(), 13);
        assert!(t.derived(&Uid::from("r0")).is_none());
        assert!(t.derived(&Uid::from("r1")).is_some());
        assert!(t.text_manager().label(&Uid::from("r3")).is_none());
        assert!(t.text_manager().visible_count() > 0);

        let opts = TrackOptions {
            show_texts: true,
            ..Default::default()
        };
        let mut t = track(opts);
        let records = (0..20).map(|i| {
            let x = i as f64 * 40.0;
            let mut r = record(&format!("r{i}"), x, x + 10.0, x + 20.0, x + 30.0, "+");
            if i % 3 == 0 {
                r.fields[1] = "x".to_string();
            }
            r
        });
        t.receive_tiles(vec![Tile::records("0.0", records)]);

        assert_eq!(t.unique_segments().len(), 13);
        assert_eq!(t.drawn_rects().len(), 13 * 3);
        assert!(t.drawn_rects().values().all(|g| g.start.is_finite()));
        assert!(t.text_manager().visible_count() > 0);
    }

    #[test]
    fn selection_overrides_stroke() {
        use crate::surface::{LineStyle, Shape};

        let mut t = track(TrackOptions::default());
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [record("a", 0.0, 100.0, 300.0, 400.0, "+")],
        )]);
        t.select_rect(Some(Uid::from("a")));

        let strokes = t
            .rect_graphics()
            .shapes()
            .iter()
            .filter_map(|s| match s {
                Shape::Polygon { line, .. } => *line,
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(strokes.len(), 3);
        assert!(strokes.iter().all(|l| *l == LineStyle::HIGHLIGHT));

        t.click_outside();
        assert!(t.selected().is_none());
    }

    #[test]
    fn export_contains_every_glyph_and_label() {
        let opts = TrackOptions {
            show_texts: true,
            ..Default::default()
        };
        let mut t = track(opts);
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [record("a&b", 0.0, 100.0, 300.0, 400.0, "+")],
        )]);

        let svg = t.export_svg();
        assert_eq!(svg.matches("<path").count(), 3);
        assert!(svg.contains("name_a&amp;b"));
        assert!(svg.starts_with("<g transform=\"translate(0,0)\">"));
    }
}
