use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use serde_json::Value;

use crate::arcs::ArcsTrack;
use crate::barbell::BarbellTrack;
use crate::options::TrackOptions;
use crate::surface::SceneLayer;
use crate::Track;

pub const ICON: &str = include_str!("../assets/icon.svg");

/// Static description of a track type, as shown to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackConfig {
    pub track_type: &'static str,
    pub datatype: &'static [&'static str],
    pub orientation: &'static str,
    pub name: &'static str,
    pub thumbnail: &'static str,
    pub available_options: &'static [&'static str],
    /// JSON object merged under the user's options.
    pub default_options: &'static str,
}

pub const BARBELL: TrackConfig = TrackConfig {
    track_type: "barbell",
    datatype: &["bedpe"],
    orientation: "1d-horizontal",
    name: "Barbell",
    thumbnail: ICON,
    available_options: &[],
    default_options: "{}",
};

pub const ARCS_1D: TrackConfig = TrackConfig {
    track_type: "1d-arcs",
    datatype: &["bedlike"],
    orientation: "1d-horizontal",
    name: "Arcs1D",
    thumbnail: ICON,
    available_options: &[
        "arcStyle",
        "completelyContained",
        "flip1D",
        "labelPosition",
        "labelColor",
        "labelTextOpacity",
        "labelBackgroundOpacity",
        "strokeColor",
        "strokeOpacity",
        "strokeWidth",
        "trackBorderWidth",
        "trackBorderColor",
    ],
    default_options: r#"{
        "arcStyle": "ellipse",
        "completelyContained": false,
        "flip1D": "no",
        "labelColor": "black",
        "labelPosition": "hidden",
        "strokeColor": "black",
        "strokeOpacity": 1,
        "strokeWidth": 1,
        "trackBorderWidth": 0,
        "trackBorderColor": "black"
    }"#,
};

pub type TrackFactory = fn(TrackOptions) -> Box<dyn Track>;

struct Registered {
    config: TrackConfig,
    factory: TrackFactory,
}

/// Track types known to the host, by type name.
#[derive(Default)]
pub struct TrackRegistry {
    types: IndexMap<&'static str, Registered>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the barbell and arcs tracks.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(BARBELL, |opts| {
            Box::new(BarbellTrack::<SceneLayer>::new(opts))
        })?;
        registry.register(ARCS_1D, |opts| {
            Box::new(ArcsTrack::<SceneLayer>::new(opts))
        })?;
        Ok(registry)
    }

    pub fn register(
        &mut self,
        config: TrackConfig,
        factory: TrackFactory,
    ) -> Result<()> {
        if self.types.contains_key(config.track_type) {
            bail!("track type `{}` is already registered", config.track_type);
        }

        serde_json::from_str::<Value>(config.default_options).with_context(
            || format!("bad default options for `{}`", config.track_type),
        )?;

        log::debug!("registered track type `{}`", config.track_type);
        self.types
            .insert(config.track_type, Registered { config, factory });
        Ok(())
    }

    pub fn get(&self, track_type: &str) -> Option<&TrackConfig> {
        self.types.get(track_type).map(|r| &r.config)
    }

    pub fn types(&self) -> impl Iterator<Item = &TrackConfig> {
        self.types.values().map(|r| &r.config)
    }

    /// The type's default options overlaid with `user`.
    pub fn options(&self, track_type: &str, user: Value) -> Result<TrackOptions> {
        let config = self
            .get(track_type)
            .ok_or_else(|| anyhow!("unknown track type `{track_type}`"))?;

        let mut merged: Value = serde_json::from_str(config.default_options)?;
        match (merged.as_object_mut(), user) {
            (Some(defaults), Value::Object(user)) => defaults.extend(user),
            (_, Value::Null) => {}
            (_, other) => bail!("track options must be an object, got {other}"),
        }

        TrackOptions::from_value(merged)
    }

    pub fn create(&self, track_type: &str, user: Value) -> Result<Box<dyn Track>> {
        let options = self.options(track_type, user)?;
        let registered = self
            .types
            .get(track_type)
            .ok_or_else(|| anyhow!("unknown track type `{track_type}`"))?;
        Ok((registered.factory)(options))
    }
}
