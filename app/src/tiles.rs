use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

use pairtrack_core::scale::LinearScale;
use pairtrack_core::TileRecord;

use crate::options::TrackOptions;

/// Host tile identifier, `"<zoom>.<position>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(String);

impl TileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn zoom_level(&self) -> Option<u32> {
        self.0.split('.').next()?.parse().ok()
    }
}

impl From<&str> for TileId {
    fn from(s: &str) -> Self {
        TileId::new(s)
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileData {
    Records(Vec<Arc<TileRecord>>),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub data: TileData,
}

impl Tile {
    pub fn records(
        id: impl Into<TileId>,
        records: impl IntoIterator<Item = TileRecord>,
    ) -> Self {
        Self {
            id: id.into(),
            data: TileData::Records(
                records.into_iter().map(Arc::new).collect(),
            ),
        }
    }

    pub fn error(id: impl Into<TileId>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: TileData::Error(error.into()),
        }
    }

    /// The tile's records; empty for error tiles.
    pub fn data(&self) -> &[Arc<TileRecord>] {
        match &self.data {
            TileData::Records(records) => records,
            TileData::Error(_) => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.data {
            TileData::Error(err) => Some(err),
            TileData::Records(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TilesetInfo {
    pub min_pos: Vec<f64>,
    pub max_pos: Vec<f64>,
    #[serde(default)]
    pub max_zoom: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TilesetInfo {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Error parsing tileset info")
    }

    /// Covers `min..max` along the first axis.
    pub fn spanning(min: f64, max: f64) -> Self {
        Self {
            min_pos: vec![min],
            max_pos: vec![max],
            max_zoom: None,
            name: None,
        }
    }
}

/// State shared by every tiled track: fetched tiles, scales, placement
/// and options. Concrete tracks hold one and delegate to it.
#[derive(Debug, Clone)]
pub struct TiledTrack {
    fetched: IndexMap<TileId, Tile>,
    visible: Vec<TileId>,

    x_scale: LinearScale,
    y_scale: LinearScale,

    pub position: [f64; 2],
    pub dimensions: [f64; 2],

    pub options: TrackOptions,

    tileset_info: Option<TilesetInfo>,
    tileset_error: Option<String>,
}

impl TiledTrack {
    pub fn new(options: TrackOptions) -> Self {
        Self {
            fetched: IndexMap::new(),
            visible: Vec::new(),
            x_scale: LinearScale::default(),
            y_scale: LinearScale::default(),
            position: [0.0, 0.0],
            dimensions: [1.0, 1.0],
            options,
            tileset_info: None,
            tileset_error: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.dimensions[0]
    }

    pub fn height(&self) -> f64 {
        self.dimensions[1]
    }

    pub fn x_scale(&self) -> &LinearScale {
        &self.x_scale
    }

    pub fn y_scale(&self) -> &LinearScale {
        &self.y_scale
    }

    pub fn set_scales(&mut self, x_scale: LinearScale, y_scale: LinearScale) {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
    }

    pub fn tileset_info(&self) -> Option<&TilesetInfo> {
        self.tileset_info.as_ref()
    }

    pub fn tileset_error(&self) -> Option<&str> {
        self.tileset_error.as_deref()
    }

    /// Records the outcome of fetching tileset metadata.
    pub fn set_tileset_info(&mut self, info: Result<TilesetInfo, String>) {
        match info {
            Ok(info) => {
                self.tileset_info = Some(info);
                self.tileset_error = None;
            }
            Err(err) => {
                log::warn!("tileset info error: {err}");
                self.tileset_info = None;
                self.tileset_error = Some(err);
            }
        }
    }

    /// Stores fetched tiles, replacing any earlier copy with the same id.
    /// Returns the ids in arrival order.
    pub fn insert_tiles(
        &mut self,
        tiles: impl IntoIterator<Item = Tile>,
    ) -> Vec<TileId> {
        let mut ids = Vec::new();
        for tile in tiles {
            ids.push(tile.id.clone());
            self.fetched.insert(tile.id.clone(), tile);
        }
        ids
    }

    pub fn remove_tiles(&mut self, ids: &[TileId]) {
        for id in ids {
            self.fetched.shift_remove(id);
        }
    }

    pub fn set_visible_tiles(&mut self, ids: impl IntoIterator<Item = TileId>) {
        self.visible = ids.into_iter().collect();
    }

    pub fn tile(&self, id: &TileId) -> Option<&Tile> {
        self.fetched.get(id)
    }

    pub fn fetched_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.fetched.values()
    }

    pub fn fetched_ids(&self) -> impl Iterator<Item = &TileId> {
        self.fetched.keys()
    }

    /// Visible tiles that have already been fetched, in visible order.
    pub fn visible_and_fetched_ids(&self) -> Vec<&TileId> {
        self.visible
            .iter()
            .filter(|id| self.fetched.contains_key(*id))
            .collect()
    }

    /// Visible and fetched tiles, or every fetched tile if none of the
    /// visible ones have arrived yet.
    pub fn visible_or_fetched_tiles(&self) -> Vec<&Tile> {
        let visible = self.visible_and_fetched_ids();
        if visible.is_empty() {
            self.fetched.values().collect()
        } else {
            visible
                .into_iter()
                .filter_map(|id| self.fetched.get(id))
                .collect()
        }
    }

    /// All records of all fetched tiles, in tile order.
    pub fn all_records(&self) -> impl Iterator<Item = &Arc<TileRecord>> {
        self.fetched.values().flat_map(|tile| tile.data().iter())
    }

    /// Per-tile errors as `"<tile id>: <error>"`.
    pub fn tile_errors(&self) -> Vec<String> {
        self.fetched
            .values()
            .filter_map(|tile| {
                let err = tile.error_message()?;
                Some(format!("{}: {}", tile.id, err))
            })
            .collect()
    }

    /// Text shown in place of the track when something went wrong, or
    /// `None` if everything is fine. A tileset error hides tile errors.
    pub fn error_text(&self) -> Option<String> {
        if let Some(err) = &self.tileset_error {
            return Some(err.clone());
        }
        let errors = self.tile_errors();
        if errors.is_empty() {
            None
        } else {
            Some(errors.join("\n"))
        }
    }
}
