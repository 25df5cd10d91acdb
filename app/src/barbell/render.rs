use std::collections::HashMap;
use std::sync::Arc;

use pairtrack_core::color::{parse_item_rgb, Color, ColorRamp};
use pairtrack_core::geometry::{barbell_cap, connector, Polygon};
use pairtrack_core::scale::{BandScale, LinearScale, ValueScale};
use pairtrack_core::{Strand, TileRecord, Uid};

use crate::labels::LabelRequest;
use crate::options::{AnnotationHeight, ColorEncoding, TrackOptions};
use crate::surface::{FillStyle, Graphics, LineStyle};

use super::{BarbellTrack, GlyphRegistry};

/// Per-render state of a record; replaced on every layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub row: usize,
    pub fill: Color,
    /// Vertical center in layout space.
    pub y_middle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphPart {
    X,
    Middle,
    Y,
}

impl GlyphPart {
    pub const ALL: [GlyphPart; 3] = [GlyphPart::X, GlyphPart::Middle, GlyphPart::Y];
}

impl std::fmt::Display for GlyphPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GlyphPart::X => "x",
            GlyphPart::Middle => "m",
            GlyphPart::Y => "y",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub uid: Uid,
    pub part: GlyphPart,
}

impl GlyphKey {
    pub fn new(uid: Uid, part: GlyphPart) -> Self {
        Self { uid, part }
    }
}

impl std::fmt::Display for GlyphKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.uid, self.part)
    }
}

/// A polygon as it was drawn, in layer coordinates, with the genome span
/// it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnGlyph {
    pub polygon: Polygon,
    pub start: f64,
    pub end: f64,
    pub record: Arc<TileRecord>,
    pub fill: Color,
    pub strand: Strand,
}

/// Fill for a record: a valid `itemRgb` when that's the encoding, else the
/// color ramp when a column encoding is active, else `default`.
pub fn resolve_fill(
    record: &TileRecord,
    options: &TrackOptions,
    colors: Option<(&LinearScale, &ColorRamp)>,
    default: Color,
) -> Color {
    match options.color_encoding {
        Some(ColorEncoding::ItemRgb) => record
            .item_rgb()
            .and_then(parse_item_rgb)
            .unwrap_or(default),
        Some(ColorEncoding::Column(column)) => colors
            .and_then(|(scale, ramp)| {
                ramp.value_to_color(scale, record.column_value(column))
            })
            .unwrap_or(default),
        None => default,
    }
}

struct RowPass<'a, G> {
    records: &'a [Arc<TileRecord>],
    options: &'a TrackOptions,
    x_scale: &'a LinearScale,
    value_scale: Option<&'a ValueScale>,
    colors: Option<(&'a LinearScale, &'a ColorRamp)>,
    selected: Option<&'a Uid>,
    k: f32,

    graphics: &'a mut G,
    registry: &'a mut GlyphRegistry,
    derived: &'a mut HashMap<Uid, Derived>,
}

impl<'a, G: Graphics> RowPass<'a, G> {
    fn rows(
        &mut self,
        rows: &[Vec<usize>],
        row_count: usize,
        band: [f64; 2],
        default_fill: Color,
    ) {
        let row_scale = BandScale::new(row_count, band);

        let rect_height = match self.options.annotation_height {
            AnnotationHeight::Scaled => {
                let h = row_scale.bandwidth();
                match self.options.max_annotation_height {
                    Some(max) => h.min(max),
                    None => h,
                }
            }
            AnnotationHeight::Fixed(h) => h,
        };

        for (row, items) in rows.iter().enumerate() {
            for &ix in items {
                let Some(record) = self.records.get(ix) else {
                    continue;
                };

                let fill =
                    resolve_fill(record, self.options, self.colors, default_fill);

                let y_middle = match (self.value_scale, self.options.value_column()) {
                    (Some(scale), Some(column)) => {
                        scale.map(record.column_value(column))
                    }
                    _ => row_scale.band_middle(row),
                };
                if !y_middle.is_finite() {
                    continue;
                }

                self.glyph(record, fill, y_middle, rect_height);

                self.derived.insert(
                    record.uid.clone(),
                    Derived {
                        row,
                        fill,
                        y_middle,
                    },
                );
            }
        }
    }

    fn glyph(
        &mut self,
        record: &Arc<TileRecord>,
        fill: Color,
        y_middle: f64,
        rect_height: f64,
    ) {
        let opacity = self.options.fill_opacity();

        if self.selected == Some(&record.uid) {
            self.graphics.line_style(Some(LineStyle::HIGHLIGHT));
        } else {
            self.graphics.line_style(Some(LineStyle::new(1.0, fill, opacity)));
        }
        self.graphics.begin_fill(FillStyle {
            color: fill,
            alpha: opacity,
        });

        let k = self.k;
        let rect_y = (y_middle - rect_height / 2.0) as f32;
        let rect_height = rect_height as f32;
        let x_scale = self.x_scale;
        let px = |x: f64| x_scale.map(x) as f32;

        let (x_start, x_end) = (record.x_start(), record.x_end());
        let (y_start, y_end) = (record.y_start(), record.y_end());
        let strand = record.strand();

        let parts = [
            (
                GlyphPart::X,
                barbell_cap(px(x_start), px(x_end), rect_y * k, rect_height * k, strand),
                x_start,
                x_end,
            ),
            (
                GlyphPart::Middle,
                connector(px(x_end), px(y_start), (rect_y + rect_height / 2.0) * k),
                x_end,
                y_start,
            ),
            (
                GlyphPart::Y,
                barbell_cap(px(y_start), px(y_end), rect_y * k, rect_height * k, strand),
                y_start,
                y_end,
            ),
        ];

        for (part, polygon, start, end) in parts {
            self.graphics.draw_polygon(&polygon);
            self.registry.insert(
                GlyphKey::new(record.uid.clone(), part),
                DrawnGlyph {
                    polygon,
                    start,
                    end,
                    record: record.clone(),
                    fill,
                    strand,
                },
            );
        }

        self.graphics.end_fill();
    }
}

/// Label candidates for the laid out records, most important first,
/// anchored at the barbell's center.
pub(super) fn label_requests(
    records: &[Arc<TileRecord>],
    derived: &HashMap<Uid, Derived>,
) -> Vec<LabelRequest> {
    records
        .iter()
        .map(|r| LabelRequest {
            uid: r.uid.clone(),
            priority: r.priority(),
            text: r.name().unwrap_or_default().to_string(),
            x: r.midpoint(),
            y: derived.get(&r.uid).map(|d| d.y_middle),
        })
        .collect()
}

impl<G: Graphics + Default> BarbellTrack<G> {
    /// Draws every laid out record into a fresh glyph layer and rebuilds
    /// the glyph registry and label pool.
    pub(super) fn render(&mut self) {
        self.vertical.mark_layout();
        self.drawn_at_scale = Some(*self.base.x_scale());

        self.set_value_scale();
        self.set_color_value_scale();

        self.drawn_rects.clear();
        self.derived.clear();

        let mut graphics = G::default();

        let separate = self.base.options.separate_plus_minus_strands;
        let [plus_band, minus_band] =
            self.layout.strand_bands(self.base.height(), separate);

        let mut pass = RowPass {
            records: &self.unique_segments,
            options: &self.base.options,
            x_scale: self.base.x_scale(),
            value_scale: self.value_scale.as_ref(),
            colors: self
                .color_value_scale
                .as_ref()
                .map(|scale| (scale, &self.color_ramp)),
            selected: self.selected.as_ref(),
            k: self.vertical.committed_scale() as f32,

            graphics: &mut graphics,
            registry: &mut self.drawn_rects,
            derived: &mut self.derived,
        };

        let options = &self.base.options;
        pass.rows(
            &self.layout.plus,
            self.layout.plus_row_count(),
            plus_band,
            options.plus_strand_fill(),
        );
        pass.rows(
            &self.layout.minus,
            self.layout.minus_row_count(),
            minus_band,
            options.minus_strand_fill(),
        );

        self.rect_graphics = graphics;
        if let Some(drawn_at) = self.drawn_at_scale {
            let transform = self.layer_transform(&drawn_at);
            self.rect_graphics.set_transform(transform);
        }

        self.hovered = None;
        self.overlay.clear();

        self.update_texts();
    }
}
