//! Aggregates over a value column of the visible data, used to build the
//! value and color scales.

use std::cmp::Reverse;

use crate::tiles::TiledTrack;

/// Only the most important records of a tile contribute to aggregates.
pub const MAX_TILE_ENTRIES: usize = 5000;

/// Column values of the top records of every visible (or, failing that,
/// fetched) tile, per tile.
fn tile_values(track: &TiledTrack, column: usize) -> Vec<Vec<f64>> {
    track
        .visible_or_fetched_tiles()
        .into_iter()
        .filter(|tile| !tile.data().is_empty())
        .map(|tile| {
            let mut records = tile.data().iter().collect::<Vec<_>>();
            records.sort_by_cached_key(|r| Reverse(r.priority()));
            records
                .into_iter()
                .take(MAX_TILE_ENTRIES)
                .map(|r| r.column_value(column))
                .filter(|v| !v.is_nan())
                .collect()
        })
        .collect()
}

fn fold_values(
    track: &TiledTrack,
    column: usize,
    f: impl Fn(f64, f64) -> f64,
) -> Option<f64> {
    tile_values(track, column)
        .into_iter()
        .flatten()
        .reduce(f)
}

pub fn min_visible_value(track: &TiledTrack, column: usize) -> Option<f64> {
    fold_values(track, column, f64::min)
}

pub fn max_visible_value(track: &TiledTrack, column: usize) -> Option<f64> {
    fold_values(track, column, f64::max)
}

/// Median of the positive values; `None` if there are none.
pub fn median_visible_value(track: &TiledTrack, column: usize) -> Option<f64> {
    let mut values = tile_values(track, column)
        .into_iter()
        .flatten()
        .filter(|v| *v > 0.0)
        .collect::<Vec<_>>();

    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TrackOptions;
    use crate::tiles::{Tile, TileId};
    use pairtrack_core::TileRecord;

    fn record(uid: &str, value: &str) -> TileRecord {
        TileRecord::new(uid, ["chr1", "0", "10", value])
    }

    fn track(tiles: Vec<Tile>) -> TiledTrack {
        let mut track = TiledTrack::new(TrackOptions::default());
        track.insert_tiles(tiles);
        track
    }

    #[test]
    fn aggregates_skip_non_numeric_values() {
        let t = track(vec![
            Tile::records("0.0", [record("a", "3"), record("b", "x")]),
            Tile::records("0.1", [record("c", "-2"), record("d", "8")]),
        ]);
        assert_eq!(min_visible_value(&t, 4), Some(-2.0));
        assert_eq!(max_visible_value(&t, 4), Some(8.0));
        // positive values only: 3, 8
        assert_eq!(median_visible_value(&t, 4), Some(5.5));
    }

    #[test]
    fn empty_data_has_no_aggregates() {
        let t = track(vec![Tile::error("0.0", "nope")]);
        assert_eq!(min_visible_value(&t, 4), None);
        assert_eq!(max_visible_value(&t, 4), None);
        assert_eq!(median_visible_value(&t, 4), None);
    }

    #[test]
    fn visible_tiles_take_precedence() {
        let mut t = track(vec![
            Tile::records("0.0", [record("a", "1")]),
            Tile::records("0.1", [record("b", "100")]),
        ]);
        t.set_visible_tiles([TileId::from("0.0")]);
        assert_eq!(max_visible_value(&t, 4), Some(1.0));
    }
}
