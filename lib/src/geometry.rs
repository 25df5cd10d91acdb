use ultraviolet::Vec2;

use crate::record::Strand;

/// Fixed glyph height used to decide whether an interval is too narrow
/// to be drawn as a chevron.
pub const GENE_RECT_HEIGHT: f32 = 16.0;

/// Number of vertices along an arc.
pub const ARC_RESOLUTION: usize = 10;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Builds a polygon from interleaved `[x0, y0, x1, y1, ..]` values; a
    /// trailing odd value is ignored.
    pub fn from_flat(coords: &[f32]) -> Self {
        let points = coords
            .chunks_exact(2)
            .map(|c| Vec2::new(c[0], c[1]))
            .collect();
        Self { points }
    }

    pub fn flat(&self) -> Vec<f32> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Applies a per-axis scale followed by a translation to every vertex.
    pub fn transformed(&self, scale: Vec2, offset: Vec2) -> Polygon {
        let points = self
            .points
            .iter()
            .map(|p| Vec2::new(p.x * scale.x + offset.x, p.y * scale.y + offset.y))
            .collect();
        Polygon { points }
    }

    /// True if `p` lies strictly inside the polygon; points on an edge or
    /// vertex are outside.
    pub fn contains(&self, p: Vec2) -> bool {
        point_in_polygon(&self.points, p)
    }

    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let first = *self.points.first()?;
        let bounds = self
            .points
            .iter()
            .fold((first, first), |(min, max), p| {
                (min.min_by_component(*p), max.max_by_component(*p))
            });
        Some(bounds)
    }
}

/// Even-odd point-in-polygon test that treats the boundary as outside.
pub fn point_in_polygon(poly: &[Vec2], p: Vec2) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let (px, py) = (p.x as f64, p.y as f64);
    let mut inside = false;

    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (bx, by) = (b.x as f64, b.y as f64);

        // on the edge
        let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
        if cross == 0.0
            && px >= ax.min(bx)
            && px <= ax.max(bx)
            && py >= ay.min(by)
            && py <= ay.max(by)
        {
            return false;
        }

        if (ay > py) != (by > py) {
            let x_at = ax + (py - ay) / (by - ay) * (bx - ax);
            if px < x_at {
                inside = !inside;
            }
        }
    }

    inside
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapShape {
    /// Triangle pointing in the strand direction, for narrow intervals.
    Arrow,
    /// Rectangle with a pointed end in the strand direction.
    Chevron,
    Rect,
}

pub fn cap_shape(strand: Strand, x_start: f32, x_end: f32) -> CapShape {
    let stranded = matches!(strand, Strand::Plus | Strand::Minus);
    if stranded && x_end - x_start < GENE_RECT_HEIGHT / 2.0 {
        CapShape::Arrow
    } else if stranded {
        CapShape::Chevron
    } else {
        CapShape::Rect
    }
}

/// Vertices of one end of a barbell, spanning `x_start..x_end` in pixels
/// with its top edge at `rect_y`.
pub fn barbell_cap(
    x_start: f32,
    x_end: f32,
    rect_y: f32,
    rect_height: f32,
    strand: Strand,
) -> Polygon {
    let half = rect_height / 2.0;
    let top = rect_y;
    let mid = rect_y + half;
    let bottom = rect_y + rect_height;

    let coords: Vec<f32> = match (cap_shape(strand, x_start, x_end), strand) {
        (CapShape::Arrow, Strand::Minus) => {
            vec![x_end, top, x_end - half, mid, x_end, bottom]
        }
        (CapShape::Arrow, _) => {
            vec![x_start, top, x_start + half, mid, x_start, bottom]
        }
        (CapShape::Chevron, Strand::Minus) => vec![
            x_start + half,
            top,
            x_end,
            top,
            x_end,
            bottom,
            x_start + half,
            bottom,
            x_start,
            mid,
        ],
        (CapShape::Chevron, _) => vec![
            x_start,
            top,
            x_end - half,
            top,
            x_end,
            mid,
            x_end - half,
            bottom,
            x_start,
            bottom,
        ],
        (CapShape::Rect, _) => plain_rect(x_start, x_end, top, bottom),
    };

    Polygon::from_flat(&coords)
}

/// The 1px bar joining the two ends of a barbell, centered on `y_mid`.
pub fn connector(x_start: f32, x_end: f32, y_mid: f32) -> Polygon {
    Polygon::from_flat(&plain_rect(x_start, x_end, y_mid, y_mid + 1.0))
}

fn plain_rect(x0: f32, x1: f32, top: f32, bottom: f32) -> Vec<f32> {
    vec![x0, top, x1, top, x1, bottom, x0, bottom]
}

/// Polyline for an arc, starting at `start` and passing through `points`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPath {
    pub start: Vec2,
    pub points: Vec<Vec2>,
}

fn angle_steps(start: f32, end: f32) -> impl Iterator<Item = f32> {
    let n = ARC_RESOLUTION;
    (0..n).map(move |k| start + (end - start) * k as f32 / (n - 1) as f32)
}

/// Semicircle between `x1` and `x2` standing on the bottom of a track of
/// `height` (or hanging from the top when `flip`), clipped horizontally to
/// `0..width`.
pub fn circle_arc(
    x1: f32,
    x2: f32,
    height: f32,
    width: f32,
    flip: bool,
) -> Option<ArcPath> {
    let h = (x2 - x1) / 2.0;
    if h.is_nan() || h <= 0.0 {
        return None;
    }

    let r = h;
    let cx = (x1 + x2) / 2.0;

    let limit_x1 = x1.max(0.0);
    let limit_x2 = x2.min(width);

    let start_angle = (-(limit_x1 - cx) / r).clamp(-1.0, 1.0).acos();
    let mut end_angle = (-(limit_x2 - cx) / r).clamp(-1.0, 1.0).acos();

    let (cy, start) = if flip {
        end_angle = -std::f32::consts::PI;
        (0.0, Vec2::new(x1, 0.0))
    } else {
        (height, Vec2::new(x1, height))
    };

    let points = angle_steps(start_angle, end_angle)
        .map(|a| Vec2::new(cx - r * a.cos(), cy - r * a.sin()))
        .collect();

    Some(ArcPath { start, points })
}

/// Half ellipse between `x1` and `x2` with the given apex height.
pub fn ellipse_arc(
    x1: f32,
    x2: f32,
    arc_height: f32,
    height: f32,
    flip: bool,
) -> ArcPath {
    let r = (x2 - x1) / 2.0;
    let cx = (x1 + x2) / 2.0;

    let (cy, end_angle, start) = if flip {
        (0.0, -std::f32::consts::PI, Vec2::new(x1, 0.0))
    } else {
        (height, std::f32::consts::PI, Vec2::new(x1, height))
    };

    let points = angle_steps(0.0, end_angle)
        .map(|a| Vec2::new(cx - r * a.cos(), cy - arc_height * a.sin()))
        .collect();

    ArcPath { start, points }
}
