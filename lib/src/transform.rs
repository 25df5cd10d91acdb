use crate::scale::LinearScale;

/// How far the transient vertical scale may drift from the committed one
/// before glyphs are laid out again.
pub const RELAYOUT_ZOOM_RATIO: f64 = 1.5;

/// Uniform scale and offset re-projecting a layer drawn at one horizontal
/// scale onto another, without redrawing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalTransform {
    pub scale: f64,
    pub offset: f64,
}

impl Default for HorizontalTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl HorizontalTransform {
    pub fn between(drawn_at: &LinearScale, now: &LinearScale) -> Self {
        let now_width = now.domain_width();
        if now_width == 0.0 {
            return Self::default();
        }
        let scale = drawn_at.domain_width() / now_width;
        let new_start = drawn_at.map(now.domain()[0]);
        Self {
            scale,
            offset: -new_start * scale,
        }
    }

    pub fn apply(&self, x: f64) -> f64 {
        x * self.scale + self.offset
    }
}

/// Scale and translation along the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self { k: 1.0, y: 0.0 }
    }
}

/// Keeps content from being dragged above the top or past the bottom.
pub fn clamp_offset(y: f64, k: f64, height: f64) -> f64 {
    y.max(-(k - 1.0) * height).min(0.0)
}

/// Zooms `transform` by `k_multiplier` around `y_pos`, keeping the content
/// under the cursor in place. The scale never drops below 1.
pub fn zoomed_y(
    y_pos: f64,
    k_multiplier: f64,
    transform: ZoomTransform,
    height: f64,
) -> ZoomTransform {
    let k0 = transform.k;
    let t0 = transform.y;
    let dp = (y_pos - t0) / k0;
    let k1 = (k0 / k_multiplier).max(1.0);
    let t1 = k0 * dp + t0 - k1 * dp;

    ZoomTransform {
        k: k1,
        y: clamp_offset(t1, k1, height),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalUpdate {
    /// Only the layer transform changed.
    Redraw,
    /// Glyphs have to be laid out again.
    Relayout,
}

/// Vertical pan/zoom state of a track.
///
/// The full scale is split in two: `committed` is baked into the glyph
/// coordinates at layout time, `transient` is applied to the layer on
/// top of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalTransform {
    zoom: ZoomTransform,
    offset: f64,
    transient: f64,
    committed: f64,
    offset_at_layout: f64,
}

impl Default for VerticalTransform {
    fn default() -> Self {
        Self {
            zoom: ZoomTransform::default(),
            offset: 0.0,
            transient: 1.0,
            committed: 1.0,
            offset_at_layout: 0.0,
        }
    }
}

impl VerticalTransform {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Offset at the last full layout.
    pub fn offset_at_layout(&self) -> f64 {
        self.offset_at_layout
    }

    pub fn transient_scale(&self) -> f64 {
        self.transient
    }

    pub fn committed_scale(&self) -> f64 {
        self.committed
    }

    pub fn total_scale(&self) -> f64 {
        self.transient * self.committed
    }

    pub fn zoom(&self) -> ZoomTransform {
        self.zoom
    }

    /// Records that a full layout just happened at the current offset.
    pub fn mark_layout(&mut self) {
        self.offset_at_layout = self.offset;
    }

    /// Layout-space y to screen y.
    pub fn to_screen(&self, y: f64) -> f64 {
        y * self.total_scale() + self.offset
    }

    /// The part of layout space visible in a track of `height` pixels.
    pub fn content_extent(&self, height: f64) -> [f64; 2] {
        let k = self.total_scale();
        [(0.0 - self.offset) / k, (height - self.offset) / k]
    }

    pub fn moved_y(&mut self, dy: f64, height: f64) -> VerticalUpdate {
        let k = self.zoom.k;
        self.zoom.y = clamp_offset(self.zoom.y + dy, k, height);
        self.offset = self.zoom.y;

        log::trace!("moved_y: dy {dy}, offset {}", self.offset);

        if (self.offset - self.offset_at_layout).abs() > height / 2.0 {
            VerticalUpdate::Relayout
        } else {
            VerticalUpdate::Redraw
        }
    }

    pub fn zoomed_y(
        &mut self,
        y_pos: f64,
        k_multiplier: f64,
        height: f64,
    ) -> VerticalUpdate {
        let zoom = zoomed_y(y_pos, k_multiplier, self.zoom, height);
        self.zoom = zoom;

        let mut ratio = zoom.k / self.committed;
        let mut update = VerticalUpdate::Redraw;

        if ratio > RELAYOUT_ZOOM_RATIO || ratio < 1.0 / RELAYOUT_ZOOM_RATIO {
            // keep fixed size glyphs from getting too distorted
            self.committed *= ratio;
            ratio = 1.0;
            update = VerticalUpdate::Relayout;
        }

        self.transient = ratio;
        self.offset = zoom.y;

        log::trace!(
            "zoomed_y: k {}, committed {}, offset {}",
            zoom.k,
            self.committed,
            self.offset
        );

        update
    }
}
