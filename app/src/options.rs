use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use pairtrack_core::color::Color;
use pairtrack_core::scale::ValueScaling;

use crate::labels::MAX_TEXTS;

/// Host options may carry numbers as JSON numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => Some(*n),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

fn opt_number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<NumberOrString> = Option::deserialize(d)?;
    Ok(v.and_then(|v| v.as_f64()).filter(|v| v.is_finite()))
}

fn opt_range<'de, D>(d: D) -> Result<Option<[f64; 2]>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<Vec<NumberOrString>> = Option::deserialize(d)?;
    let Some(v) = v else {
        return Ok(None);
    };
    match v.as_slice() {
        [a, b] => Ok(a.as_f64().zip(b.as_f64()).map(|(a, b)| [a, b])),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorEncoding {
    /// Colors come from the `itemRgb` column.
    ItemRgb,
    /// 1-indexed column mapped through the color ramp.
    Column(usize),
}

impl<'de> Deserialize<'de> for ColorEncoding {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = NumberOrString::deserialize(d)?;
        if let NumberOrString::String(s) = &v {
            if s == "itemRgb" {
                return Ok(ColorEncoding::ItemRgb);
            }
        }
        match v.as_f64() {
            Some(n) if n >= 1.0 => Ok(ColorEncoding::Column(n as usize)),
            _ => Err(serde::de::Error::custom(
                "colorEncoding must be `itemRgb` or a column number",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnnotationHeight {
    /// Fill the row band.
    #[default]
    Scaled,
    Fixed(f64),
}

impl<'de> Deserialize<'de> for AnnotationHeight {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = NumberOrString::deserialize(d)?;
        match v.as_f64() {
            Some(h) if h > 0.0 => Ok(AnnotationHeight::Fixed(h)),
            _ => Ok(AnnotationHeight::Scaled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcStyle {
    Circle,
    Ellipse,
}

/// Options for both track types, as sent by the host.
///
/// Unknown keys are ignored. Unset options behave like the host's falsy
/// defaults; accessors apply those defaults.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackOptions {
    pub arc_style: Option<String>,
    pub completely_contained: bool,
    #[serde(rename = "flip1D")]
    pub flip_1d: Option<String>,

    pub stroke_color: Option<String>,
    #[serde(deserialize_with = "opt_number")]
    pub stroke_width: Option<f64>,
    #[serde(deserialize_with = "opt_number")]
    pub stroke_opacity: Option<f64>,

    pub show_texts: bool,
    #[serde(deserialize_with = "opt_number")]
    pub max_texts: Option<f64>,
    #[serde(deserialize_with = "opt_number")]
    pub font_size: Option<f64>,
    pub font_color: Option<String>,

    #[serde(deserialize_with = "opt_number")]
    pub value_column: Option<f64>,
    pub value_scaling: Option<String>,
    pub color_encoding: Option<ColorEncoding>,
    #[serde(deserialize_with = "opt_range")]
    pub color_encoding_range: Option<[f64; 2]>,
    pub color_range: Option<Vec<String>>,

    pub annotation_height: AnnotationHeight,
    #[serde(deserialize_with = "opt_number")]
    pub max_annotation_height: Option<f64>,
    pub separate_plus_minus_strands: bool,

    pub fill_color: Option<String>,
    pub plus_strand_color: Option<String>,
    pub minus_strand_color: Option<String>,
    #[serde(deserialize_with = "opt_number")]
    pub fill_opacity: Option<f64>,
}

impl TrackOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Error parsing track options")
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).context("Error parsing track options")
    }

    pub fn arc_style(&self) -> ArcStyle {
        match self.arc_style.as_deref() {
            Some("circle") => ArcStyle::Circle,
            _ => ArcStyle::Ellipse,
        }
    }

    pub fn flipped(&self) -> bool {
        self.flip_1d.as_deref() == Some("yes")
    }

    /// Label budget; zero or unset falls back to [`MAX_TEXTS`].
    pub fn max_texts(&self) -> usize {
        self.max_texts
            .filter(|n| *n >= 1.0)
            .map(|n| n as usize)
            .unwrap_or(MAX_TEXTS)
    }

    pub fn value_column(&self) -> Option<usize> {
        self.value_column.filter(|c| *c >= 1.0).map(|c| c as usize)
    }

    pub fn value_scaling(&self) -> ValueScaling {
        match self.value_scaling.as_deref() {
            Some("log") => ValueScaling::Log,
            _ => ValueScaling::Linear,
        }
    }

    pub fn fill_opacity(&self) -> f32 {
        self.fill_opacity
            .filter(|o| *o != 0.0)
            .unwrap_or(0.3) as f32
    }

    pub fn font_size(&self) -> Option<f32> {
        self.font_size.filter(|s| *s > 0.0).map(|s| s as f32)
    }

    pub fn font_color(&self) -> Option<Color> {
        self.font_color.as_deref().and_then(parse_color)
    }

    pub fn plus_strand_fill(&self) -> Color {
        self.plus_strand_color
            .as_deref()
            .or(self.fill_color.as_deref())
            .and_then(parse_color)
            .unwrap_or(Color::BLUE)
    }

    pub fn minus_strand_fill(&self) -> Color {
        self.minus_strand_color
            .as_deref()
            .or(self.fill_color.as_deref())
            .and_then(parse_color)
            .unwrap_or(Color::PURPLE)
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(Color::BLUE)
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width.filter(|w| *w != 0.0).unwrap_or(2.0) as f32
    }

    pub fn stroke_opacity(&self) -> f32 {
        self.stroke_opacity.filter(|o| *o != 0.0).unwrap_or(1.0) as f32
    }
}

fn parse_color(s: &str) -> Option<Color> {
    let color = Color::parse(s);
    if color.is_none() {
        log::warn!("ignoring unknown color `{s}`");
    }
    color
}
