use pairtrack_core::color::Color;
use pairtrack_core::geometry::Polygon;
use ultraviolet::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f32,
    pub color: Color,
    pub alpha: f32,
}

impl LineStyle {
    /// Stroke used for the selected and hovered glyphs.
    pub const HIGHLIGHT: LineStyle = LineStyle {
        width: 3.0,
        color: Color::BLACK,
        alpha: 0.75,
    };

    pub fn new(width: f32, color: Color, alpha: f32) -> Self {
        Self {
            width,
            color,
            alpha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub alpha: f32,
}

/// Position and per-axis scale of a layer; content coordinates are
/// multiplied by `scale`, then translated by `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerTransform {
    pub position: Vec2,
    pub scale: Vec2,
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self {
            position: Vec2::zero(),
            scale: Vec2::one(),
        }
    }
}

impl LayerTransform {
    pub fn apply(&self, p: Vec2) -> Vec2 {
        p * self.scale + self.position
    }

    pub fn apply_polygon(&self, poly: &Polygon) -> Polygon {
        poly.transformed(self.scale, self.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub font_family: String,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_thickness: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        // white outline keeps labels readable on top of similarly colored
        // glyphs
        Self {
            font_size: 14.0,
            font_family: "Arial".to_string(),
            fill: Color::BLACK,
            stroke: Color::rgb(255, 255, 255),
            stroke_thickness: 2.0,
        }
    }
}

/// The drawing capability a track renders into.
///
/// Mirrors a retained 2D scene layer: polygons and paths are drawn with
/// the current line/fill style, and the layer as a whole carries a
/// transform that the host composes when presenting it.
pub trait Graphics {
    fn clear(&mut self);

    /// `None` disables stroking.
    fn line_style(&mut self, style: Option<LineStyle>);

    fn begin_fill(&mut self, fill: FillStyle);

    fn end_fill(&mut self);

    fn draw_polygon(&mut self, poly: &Polygon);

    fn move_to(&mut self, p: Vec2);

    fn line_to(&mut self, p: Vec2);

    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle);

    fn transform(&self) -> LayerTransform;

    fn set_transform(&mut self, transform: LayerTransform);
}

/// Measures rendered text; stands in for a text node's bounds.
pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Vec2;
}

/// Fixed advance per character, enough for headless rendering and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> Vec2 {
        let chars = text.chars().count() as f32;
        let outline = 2.0 * style.stroke_thickness;
        Vec2::new(
            chars * style.font_size * self.advance + outline,
            style.font_size * self.line_height + outline,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon {
        points: Vec<Vec2>,
        line: Option<LineStyle>,
        fill: Option<FillStyle>,
    },
    Path {
        points: Vec<Vec2>,
        line: Option<LineStyle>,
    },
    Text {
        text: String,
        position: Vec2,
        style: TextStyle,
    },
}

/// Recording implementation of [`Graphics`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneLayer {
    shapes: Vec<Shape>,
    line: Option<LineStyle>,
    fill: Option<FillStyle>,
    transform: LayerTransform,
    path_open: bool,
}

impl SceneLayer {
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(|s| matches!(s, Shape::Polygon { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Graphics for SceneLayer {
    fn clear(&mut self) {
        self.shapes.clear();
        self.line = None;
        self.fill = None;
        self.path_open = false;
    }

    fn line_style(&mut self, style: Option<LineStyle>) {
        self.line = style;
    }

    fn begin_fill(&mut self, fill: FillStyle) {
        self.fill = Some(fill);
    }

    fn end_fill(&mut self) {
        self.fill = None;
    }

    fn draw_polygon(&mut self, poly: &Polygon) {
        self.path_open = false;
        self.shapes.push(Shape::Polygon {
            points: poly.points.clone(),
            line: self.line,
            fill: self.fill,
        });
    }

    fn move_to(&mut self, p: Vec2) {
        self.path_open = true;
        self.shapes.push(Shape::Path {
            points: vec![p],
            line: self.line,
        });
    }

    fn line_to(&mut self, p: Vec2) {
        if self.path_open {
            if let Some(Shape::Path { points, .. }) = self.shapes.last_mut() {
                points.push(p);
                return;
            }
        }
        self.move_to(Vec2::zero());
        self.line_to(p);
    }

    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle) {
        self.path_open = false;
        self.shapes.push(Shape::Text {
            text: text.to_string(),
            position,
            style: style.clone(),
        });
    }

    fn transform(&self) -> LayerTransform {
        self.transform
    }

    fn set_transform(&mut self, transform: LayerTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_shapes_with_current_style() {
        let mut layer = SceneLayer::default();
        let line = LineStyle::new(1.0, Color::BLUE, 0.3);
        layer.line_style(Some(line));
        layer.begin_fill(FillStyle {
            color: Color::BLUE,
            alpha: 0.3,
        });
        layer.draw_polygon(&Polygon::from_flat(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0]));
        layer.end_fill();

        layer.move_to(Vec2::new(0.0, 10.0));
        layer.line_to(Vec2::new(5.0, 0.0));
        layer.line_to(Vec2::new(10.0, 10.0));

        let shapes = layer.shapes();
        assert_eq!(shapes.len(), 2);
        match &shapes[0] {
            Shape::Polygon { fill, line: l, .. } => {
                assert!(fill.is_some());
                assert_eq!(*l, Some(line));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &shapes[1] {
            Shape::Path { points, .. } => assert_eq!(points.len(), 3),
            other => panic!("unexpected {other:?}"),
        }

        layer.clear();
        assert!(layer.is_empty());
    }

    #[test]
    fn layer_transform_scales_then_translates() {
        let t = LayerTransform {
            position: Vec2::new(10.0, 5.0),
            scale: Vec2::new(2.0, 0.5),
        };
        assert_eq!(t.apply(Vec2::new(1.0, 4.0)), Vec2::new(12.0, 7.0));
    }

    #[test]
    fn monospace_measure_grows_with_text() {
        let m = MonospaceMeasurer::default();
        let style = TextStyle::default();
        let short = m.measure("ab", &style);
        let long = m.measure("abcd", &style);
        assert!(long.x > short.x);
        assert_eq!(long.y, short.y);
    }
}
