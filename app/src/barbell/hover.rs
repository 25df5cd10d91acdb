use ultraviolet::Vec2;

use crate::surface::{FillStyle, Graphics, LineStyle};

use super::{BarbellTrack, GlyphKey, GlyphPart};

impl<G: Graphics + Default> BarbellTrack<G> {
    /// Finds the first drawn glyph under `(x, y)`, highlights its record
    /// in the overlay and returns its text. Glyphs are tested in the order
    /// they were drawn.
    pub(super) fn hover_at(&mut self, x: f64, y: f64) -> String {
        if self.base.tileset_info().is_none() {
            return String::new();
        }

        let point = Vec2::new(x as f32, y as f32);
        let transform = self.rect_graphics.transform();

        let hit = self
            .drawn_rects
            .values()
            .find(|glyph| transform.apply_polygon(&glyph.polygon).contains(point))
            .map(|glyph| glyph.record.clone());

        let Some(record) = hit else {
            self.hovered = None;
            self.overlay.clear();
            return String::new();
        };

        self.overlay.clear();
        self.overlay.set_transform(transform);
        self.overlay.line_style(Some(LineStyle::HIGHLIGHT));
        for part in GlyphPart::ALL {
            let key = GlyphKey::new(record.uid.clone(), part);
            if let Some(glyph) = self.drawn_rects.get(&key) {
                self.overlay.begin_fill(FillStyle {
                    color: glyph.fill,
                    alpha: self.base.options.fill_opacity(),
                });
                self.overlay.draw_polygon(&glyph.polygon);
                self.overlay.end_fill();
            }
        }
        self.hovered = Some(record.uid.clone());

        log::trace!("hovering {}", record.uid);

        match &record.mouse_over {
            Some(text) => text.clone(),
            None => record.fields.join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TrackOptions;
    use crate::tiles::{Tile, TilesetInfo};
    use crate::Track;
    use pairtrack_core::scale::LinearScale;
    use pairtrack_core::TileRecord;

    fn track() -> BarbellTrack {
        let mut t: BarbellTrack = BarbellTrack::new(TrackOptions::default());
        t.base_mut().dimensions = [100.0, 16.0];
        t.base_mut().set_scales(
            LinearScale::new([0.0, 100.0], [0.0, 100.0]),
            LinearScale::default(),
        );
        t.base_mut().set_tileset_info(Ok(TilesetInfo::spanning(0.0, 100.0)));
        t
    }

    #[test]
    fn hit_returns_fields_and_highlights() {
        let mut t = track();
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [TileRecord::new(
                "a",
                ["chr1", "10", "20", "a", "chr1", "60", "70", "."],
            )],
        )]);

        assert_eq!(t.mouse_over_html(15.0, 8.0), "chr1 10 20 a chr1 60 70 .");
        assert_eq!(t.hovered().map(|u| u.as_str()), Some("a"));
        assert_eq!(t.overlay().polygons().count(), 3);

        assert_eq!(t.mouse_over_html(40.0, 2.0), "");
        assert!(t.hovered().is_none());
        assert!(t.overlay().is_empty());
    }

    #[test]
    fn supplied_mouse_over_text_wins() {
        let mut t = track();
        t.receive_tiles(vec![Tile::records(
            "0.0",
            [TileRecord::new("a", ["chr1", "10", "20", "a", "chr1", "60", "70"])
                .with_mouse_over("<b>a</b>")],
        )]);
        assert_eq!(t.mouse_over_html(65.0, 8.0), "<b>a</b>");
    }

    #[test]
    fn nothing_without_tileset_info() {
        let mut t = BarbellTrack::<crate::surface::SceneLayer>::new(TrackOptions::default());
        assert_eq!(t.mouse_over_html(0.0, 0.0), "");
    }
}
