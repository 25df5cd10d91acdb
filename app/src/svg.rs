use std::fmt::Write;

use ultraviolet::Vec2;

use crate::surface::LayerTransform;

/// `M x y L x y ..` path data through `points`.
pub fn path_data(points: &[Vec2]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        if i > 0 {
            d.push(' ');
        }
        let _ = write!(d, "{cmd} {} {}", p.x, p.y);
    }
    d
}

pub fn translate(x: f64, y: f64) -> String {
    format!("translate({x},{y})")
}

pub fn layer_transform(t: &LayerTransform) -> String {
    format!(
        "translate({},{})scale({},{})",
        t.position.x, t.position.y, t.scale.x, t.scale.y
    )
}

/// Minimal SVG fragment builder producing nested `<g>` groups, paths and
/// text elements.
#[derive(Debug, Default)]
pub struct SvgWriter {
    out: String,
    open: Vec<&'static str>,
}

impl SvgWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn attrs(&mut self, attrs: &[(&str, String)]) {
        for (key, value) in attrs {
            let value = html_escape::encode_double_quoted_attribute(value);
            let _ = write!(self.out, " {key}=\"{value}\"");
        }
    }

    pub fn open_group(&mut self, attrs: &[(&str, String)]) {
        self.out.push_str("<g");
        self.attrs(attrs);
        self.out.push('>');
        self.open.push("g");
    }

    pub fn close(&mut self) {
        if let Some(tag) = self.open.pop() {
            let _ = write!(self.out, "</{tag}>");
        }
    }

    pub fn path(&mut self, d: &str, attrs: &[(&str, String)]) {
        self.out.push_str("<path");
        self.attrs(&[("d", d.to_string())]);
        self.attrs(attrs);
        self.out.push_str("/>");
    }

    pub fn text(&mut self, text: &str, attrs: &[(&str, String)]) {
        self.out.push_str("<text");
        self.attrs(attrs);
        self.out.push('>');
        self.out.push_str(&html_escape::encode_text(text));
        self.out.push_str("</text>");
    }

    /// Closes any groups still open and returns the fragment.
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.close();
        }
        self.out
    }
}
