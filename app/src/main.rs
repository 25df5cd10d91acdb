use std::path::PathBuf;

use anyhow::{Context, Result};

use pairtrack::registry::{TrackRegistry, ARCS_1D, BARBELL};
use pairtrack::tiles::{Tile, TilesetInfo};
use pairtrack::Track;
use pairtrack_core::scale::LinearScale;
use pairtrack_core::TileRecord;

#[derive(Debug)]
pub struct Args {
    records: PathBuf,

    range: Option<[f64; 2]>,
    width: f64,
    height: f64,

    options: Option<String>,
    labels: bool,
    arcs: bool,
}

pub fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            let name = std::env::args().next().unwrap_or("pairtrack".into());
            eprintln!("{e}");
            println!(
                "Usage: {name} <records.tsv> [--range start-end] \
                 [--width W] [--height H] [--options JSON] [--labels] [--arcs]"
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        log::error!("{e:?}");
        std::process::exit(1);
    }

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let records = load_records(&args.records)?;

    let range = args.range.unwrap_or_else(|| record_extent(&records));

    let mut user: serde_json::Value = match &args.options {
        Some(json) => {
            serde_json::from_str(json).context("Error parsing --options")?
        }
        None => serde_json::json!({}),
    };
    if args.labels {
        if let Some(obj) = user.as_object_mut() {
            obj.insert("showTexts".into(), true.into());
        }
    }

    let registry = TrackRegistry::with_builtin()?;
    let track_type = if args.arcs {
        ARCS_1D.track_type
    } else {
        BARBELL.track_type
    };
    let mut track = registry.create(track_type, user)?;

    track.set_dimensions([args.width, args.height]);
    track.base_mut().set_scales(
        LinearScale::new(range, [0.0, args.width]),
        LinearScale::new([0.0, args.height], [0.0, args.height]),
    );
    track
        .base_mut()
        .set_tileset_info(Ok(TilesetInfo::spanning(range[0], range[1])));

    track.receive_tiles(vec![Tile::records("0.0", records)]);
    track.draw();

    println!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\">",
        args.width, args.height
    );
    println!("{}", track.export_svg());
    println!("</svg>");

    Ok(())
}

/// One record per tab separated line; blank lines and `#` comments are
/// skipped. Records are identified by line number.
fn load_records(path: &std::path::Path) -> Result<Vec<TileRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading {}", path.display()))?;

    let records = text
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(ix, line)| TileRecord::new(format!("line{}", ix + 1), line.split('\t')))
        .collect::<Vec<_>>();

    log::debug!("loaded {} records from {}", records.len(), path.display());

    Ok(records)
}

fn record_extent(records: &[TileRecord]) -> [f64; 2] {
    let (min, max) = records
        .iter()
        .flat_map(|r| [r.x_start(), r.x_end(), r.y_start(), r.y_end()])
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min < max {
        [min, max]
    } else {
        [0.0, 1.0]
    }
}

pub fn parse_args() -> std::result::Result<Args, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    let range = pargs.opt_value_from_fn("--range", parse_range)?;
    let width = pargs.opt_value_from_str("--width")?.unwrap_or(800.0);
    let height = pargs.opt_value_from_str("--height")?.unwrap_or(100.0);
    let options = pargs.opt_value_from_str("--options")?;
    let labels = pargs.contains("--labels");
    let arcs = pargs.contains("--arcs");

    let args = Args {
        records: pargs.free_from_os_str(parse_path)?,

        range,
        width,
        height,

        options,
        labels,
        arcs,
    };

    Ok(args)
}

/// Genome coordinates shown across the track, as `start-end` or
/// `start..end`. Digit groups may be separated with `,` or `_`.
fn parse_range(s: &str) -> Result<[f64; 2]> {
    let s = s.trim();
    let (start, end) = s
        .split_once("..")
        .or_else(|| s.split_once('-'))
        .with_context(|| format!("`{s}` is not a `start-end` range"))?;

    let coord = |v: &str| -> Result<f64> {
        let digits = v.trim().replace([',', '_'], "");
        let value = digits
            .parse::<f64>()
            .with_context(|| format!("`{v}` is not a genome coordinate"))?;
        if !value.is_finite() || value < 0.0 {
            anyhow::bail!("`{v}` is not a genome coordinate");
        }
        Ok(value)
    };

    let range = [coord(start)?, coord(end)?];
    if range[0] >= range[1] {
        anyhow::bail!("range start must be before its end, got `{s}`");
    }

    Ok(range)
}

fn parse_path(s: &std::ffi::OsStr) -> Result<PathBuf, &'static str> {
    Ok(s.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_accept_separators() {
        assert_eq!(parse_range("100-2000").unwrap(), [100.0, 2000.0]);
        assert_eq!(parse_range(" 1,000..1_500 ").unwrap(), [1000.0, 1500.0]);
        assert_eq!(parse_range("0.5-10").unwrap(), [0.5, 10.0]);
    }

    #[test]
    fn bad_ranges_are_rejected() {
        assert!(parse_range("100").is_err());
        assert!(parse_range("200-100").is_err());
        assert!(parse_range("a-b").is_err());
        assert!(parse_range("0-inf").is_err());
    }
}
