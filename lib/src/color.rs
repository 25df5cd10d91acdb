use std::fmt;

use palette::Srgb;

use crate::scale::LinearScale;

/// Number of entries in a color ramp; value color scales map onto
/// `0..=RAMP_LEN - 1`.
pub const RAMP_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parses CSS-style colors: named colors, `#rgb`, `#rrggbb`,
    /// `#rrggbbaa`, `rgb(..)` and `rgba(..)`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        if let Some(args) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
        {
            let args = args.strip_suffix(')')?;
            return parse_components(args);
        }

        if s == "transparent" {
            return Some(Color::rgba(0, 0, 0, 0.0));
        }

        let named: Srgb<u8> = palette::named::from_str(&s)?;
        Some(Color::rgb(named.red, named.green, named.blue))
    }

    /// Packed `0xRRGGBB`, alpha dropped.
    pub fn to_hex(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    /// Channels as floats in `0..=1`.
    pub fn to_f32(&self) -> [f32; 4] {
        let max = u8::MAX as f32;
        [
            self.r as f32 / max,
            self.g as f32 / max,
            self.b as f32 / max,
            self.a,
        ]
    }

    fn lerp(&self, other: &Color, t: f32) -> Color {
        let ch = |a: u8, b: u8| {
            (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
        };
        Color {
            r: ch(self.r, other.r),
            g: ch(self.g, other.g),
            b: ch(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "rgb({},{},{})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match hex.len() {
        3 => Some(Color::rgb(
            digit(0)? * 17,
            digit(1)? * 17,
            digit(2)? * 17,
        )),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)? as f32 / 255.0,
        )),
        _ => None,
    }
}

fn parse_components(args: &str) -> Option<Color> {
    let parts = args.split(',').map(|p| p.trim()).collect::<Vec<_>>();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |p: &str| {
        let v = p.parse::<f32>().ok()?;
        v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
    };

    let alpha = match parts.get(3) {
        Some(p) => p.parse::<f32>().ok()?.clamp(0.0, 1.0),
        None => 1.0,
    };

    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

/// Parses an `itemRgb` column value, three comma separated channels.
pub fn parse_item_rgb(field: &str) -> Option<Color> {
    if field.split(',').count() != 3 {
        return None;
    }
    parse_components(field)
}

/// Fixed-size lookup table from a normalized value onto colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    colors: Vec<Color>,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::from_gradient(colorous::INFERNO)
    }
}

impl ColorRamp {
    pub fn from_gradient(gradient: colorous::Gradient) -> Self {
        let colors = (0..RAMP_LEN)
            .map(|i| {
                let [r, g, b] = gradient.eval_rational(i, RAMP_LEN).as_array();
                Color::rgb(r, g, b)
            })
            .collect();
        Self { colors }
    }

    /// Evenly spaced stops, interpolated channel-wise. Fewer than two
    /// stops can't define a ramp.
    pub fn from_colors(stops: &[Color]) -> Option<Self> {
        if stops.len() < 2 {
            return None;
        }

        let segments = (stops.len() - 1) as f32;
        let colors = (0..RAMP_LEN)
            .map(|i| {
                let t = i as f32 / (RAMP_LEN - 1) as f32 * segments;
                let ix = (t.floor() as usize).min(stops.len() - 2);
                stops[ix].lerp(&stops[ix + 1], t - ix as f32)
            })
            .collect();

        Some(Self { colors })
    }

    /// Builds a ramp from a list of CSS colors, skipping unparseable ones.
    pub fn from_css<S: AsRef<str>>(stops: &[S]) -> Option<Self> {
        let parsed = stops
            .iter()
            .filter_map(|s| {
                let color = Color::parse(s.as_ref());
                if color.is_none() {
                    log::warn!("ignoring unknown color `{}`", s.as_ref());
                }
                color
            })
            .collect::<Vec<_>>();
        Self::from_colors(&parsed)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, ix: usize) -> Option<Color> {
        self.colors.get(ix).copied()
    }

    /// Looks up `value` through `scale`, which should map onto
    /// `0..=RAMP_LEN - 1`. Out of range positions are clamped; `None` if
    /// the value has no position at all.
    pub fn value_to_color(&self, scale: &LinearScale, value: f64) -> Option<Color> {
        let pos = scale.map(value);
        if !pos.is_finite() || self.colors.is_empty() {
            return None;
        }
        let last = (self.colors.len() - 1) as f64;
        let ix = pos.floor().clamp(0.0, last) as usize;
        self.colors.get(ix).copied()
    }
}

/// Linear scale from a value domain onto ramp indices.
pub fn ramp_scale(min: f64, max: f64) -> LinearScale {
    LinearScale::new([min, max], [0.0, (RAMP_LEN - 1) as f64])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_css_colors() {
        assert_eq!(Color::parse("blue"), Some(Color::BLUE));
        assert_eq!(Color::parse("Purple"), Some(Color::PURPLE));
        assert_eq!(Color::parse("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#0a0B0c"), Some(Color::rgb(10, 11, 12)));
        assert_eq!(Color::parse("rgb(1, 2, 3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(
            Color::parse("rgba(1,2,3,0.5)"),
            Some(Color::rgba(1, 2, 3, 0.5))
        );
        assert_eq!(Color::parse("not a color"), None);
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn item_rgb_needs_three_channels() {
        let c = parse_item_rgb("12,34,56").unwrap();
        assert_eq!(c.to_string(), "rgb(12,34,56)");
        assert_eq!(c.to_hex(), 0x0c2238);

        assert_eq!(parse_item_rgb("12,34"), None);
        assert_eq!(parse_item_rgb("12,34,56,1"), None);
        assert_eq!(parse_item_rgb("a,b,c"), None);
    }

    #[test]
    fn displays_alpha_only_when_translucent() {
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "rgb(1,2,3)");
        assert_eq!(Color::rgba(1, 2, 3, 0.25).to_string(), "rgba(1,2,3,0.25)");
    }

    #[test]
    fn ramp_interpolates_between_stops() {
        let ramp =
            ColorRamp::from_colors(&[Color::rgb(0, 0, 0), Color::rgb(255, 255, 255)])
                .unwrap();
        assert_eq!(ramp.len(), RAMP_LEN);
        assert_eq!(ramp.get(0), Some(Color::rgb(0, 0, 0)));
        assert_eq!(ramp.get(255), Some(Color::rgb(255, 255, 255)));
        assert_eq!(ramp.get(128), Some(Color::rgb(128, 128, 128)));

        assert!(ColorRamp::from_colors(&[Color::BLUE]).is_none());
        assert!(ColorRamp::from_css(&["white", "bogus"]).is_none());
        assert!(ColorRamp::from_css(&["white", "black"]).is_some());
    }

    #[test]
    fn value_lookup_clamps_to_ramp() {
        let ramp = ColorRamp::from_css(&["#000000", "#ff0000"]).unwrap();
        let scale = ramp_scale(0.0, 10.0);

        assert_eq!(ramp.value_to_color(&scale, 0.0), ramp.get(0));
        assert_eq!(ramp.value_to_color(&scale, 10.0), ramp.get(255));
        assert_eq!(ramp.value_to_color(&scale, 50.0), ramp.get(255));
        assert_eq!(ramp.value_to_color(&scale, -3.0), ramp.get(0));
        assert_eq!(ramp.value_to_color(&scale, f64::NAN), None);

        let default = ColorRamp::default();
        assert_eq!(default.len(), RAMP_LEN);
    }
}
