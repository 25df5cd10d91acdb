use std::ops::Range;

use iset::IntervalSet;

use crate::record::Strand;

/// Assigns each segment to the lowest row where it doesn't overlap any
/// segment already placed, in input order. Rows hold indices into
/// `segments`.
///
/// Segments are half-open, so touching segments can share a row. An
/// empty input yields a single empty row. Segments with non-finite
/// bounds are put in the first row without occupying any space.
pub fn segments_to_rows(segments: &[Range<f64>]) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = vec![Vec::new()];
    let mut occupied: Vec<IntervalSet<f64>> = vec![IntervalSet::new()];

    for (ix, seg) in segments.iter().enumerate() {
        let Some(span) = occupied_span(seg) else {
            rows[0].push(ix);
            continue;
        };

        let free = occupied
            .iter()
            .position(|set| set.iter(span.clone()).next().is_none());

        let row = match free {
            Some(row) => row,
            None => {
                rows.push(Vec::new());
                occupied.push(IntervalSet::new());
                rows.len() - 1
            }
        };

        occupied[row].insert(span);
        rows[row].push(ix);
    }

    rows
}

fn occupied_span(seg: &Range<f64>) -> Option<Range<f64>> {
    let (a, b) = (seg.start, seg.end);
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    // zero-width segments still take up a sliver
    let to = if to > from {
        to
    } else {
        from + (from.abs() * f64::EPSILON).max(f64::MIN_POSITIVE)
    };
    Some(from..to)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutItem {
    pub span: Range<f64>,
    pub strand: Strand,
}

/// Row assignment for one render pass, split by strand. Rows contain
/// indices into the item slice the layout was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub plus: Vec<Vec<usize>>,
    pub minus: Vec<Vec<usize>>,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            plus: vec![Vec::new()],
            minus: vec![Vec::new()],
        }
    }
}

impl RowLayout {
    /// Packs plus and minus strand items into rows independently.
    /// Unstranded items are packed with the plus strand.
    pub fn pack(items: &[LayoutItem]) -> Self {
        let mut plus_ix = Vec::new();
        let mut minus_ix = Vec::new();

        for (ix, item) in items.iter().enumerate() {
            match item.strand.row_partition() {
                Strand::Minus => minus_ix.push(ix),
                _ => plus_ix.push(ix),
            }
        }

        let pack_strand = |ixs: &[usize]| {
            let spans = ixs
                .iter()
                .map(|&i| items[i].span.clone())
                .collect::<Vec<_>>();
            segments_to_rows(&spans)
                .into_iter()
                .map(|row| row.into_iter().map(|j| ixs[j]).collect())
                .collect::<Vec<Vec<usize>>>()
        };

        Self {
            plus: pack_strand(&plus_ix),
            minus: pack_strand(&minus_ix),
        }
    }

    /// Every item in one pseudo-row, used when vertical position comes
    /// from a value column instead of packing.
    pub fn single_row(count: usize) -> Self {
        Self {
            plus: vec![(0..count).collect()],
            minus: vec![Vec::new()],
        }
    }

    pub fn plus_row_count(&self) -> usize {
        self.plus.len().max(1)
    }

    pub fn minus_row_count(&self) -> usize {
        self.minus.len().max(1)
    }

    pub fn item_count(&self) -> usize {
        self.plus
            .iter()
            .chain(self.minus.iter())
            .map(|row| row.len())
            .sum()
    }

    /// Vertical pixel ranges for the plus and minus strand rows.
    ///
    /// When strands share the track both get the full height; otherwise the
    /// height is split in proportion to the number of occupied rows. A
    /// layout with no items gets zero height.
    pub fn strand_bands(&self, height: f64, separate: bool) -> [[f64; 2]; 2] {
        let occupied = |rows: &[Vec<usize>]| {
            rows.iter().filter(|r| !r.is_empty()).count()
        };
        let plus_rows = occupied(&self.plus);
        let minus_rows = occupied(&self.minus);

        if plus_rows + minus_rows == 0 {
            return [[0.0, 0.0], [0.0, 0.0]];
        }

        if separate {
            let plus_height =
                plus_rows as f64 * height / (plus_rows + minus_rows) as f64;
            [[0.0, plus_height], [plus_height, height]]
        } else {
            [[0.0, height], [0.0, height]]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn overlaps(a: &Range<f64>, b: &Range<f64>) -> bool {
        a.start < b.end && b.start < a.end
    }

    #[test]
    fn overlapping_segments_get_separate_rows() {
        // priority order: importance 10 first, then 5
        let rows = segments_to_rows(&[0.0..100.0, 50.0..150.0]);
        assert_eq!(rows, vec![vec![0], vec![1]]);
    }

    #[test]
    fn disjoint_segments_share_the_lowest_row() {
        let rows = segments_to_rows(&[0.0..10.0, 10.0..20.0, 5.0..15.0, 30.0..40.0]);
        assert_eq!(rows, vec![vec![0, 1, 3], vec![2]]);
    }

    #[test]
    fn empty_input_has_one_empty_row() {
        let rows = segments_to_rows(&[]);
        assert_eq!(rows, vec![Vec::<usize>::new()]);

        let layout = RowLayout::pack(&[]);
        assert_eq!(layout.plus_row_count(), 1);
        assert_eq!(layout.item_count(), 0);
        assert_eq!(layout.strand_bands(100.0, true), [[0.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn nan_segments_still_get_a_row() {
        let rows = segments_to_rows(&[f64::NAN..1.0, 0.0..1.0, 0.0..1.0]);
        assert_eq!(rows, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn packing_never_overlaps_within_a_row() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let n = rng.gen_range(0..120);
            let segs = (0..n)
                .map(|_| {
                    let start = rng.gen_range(0.0..1000.0);
                    let len = rng.gen_range(0.0..200.0);
                    start..(start + len)
                })
                .collect::<Vec<_>>();

            let rows = segments_to_rows(&segs);

            let mut seen = vec![0usize; n];
            for row in &rows {
                for (i, &a) in row.iter().enumerate() {
                    seen[a] += 1;
                    for &b in &row[i + 1..] {
                        let (sa, sb) = (&segs[a], &segs[b]);
                        if sa.start < sa.end && sb.start < sb.end {
                            assert!(!overlaps(sa, sb), "{sa:?} {sb:?}");
                        }
                    }
                }
            }
            assert!(seen.iter().all(|&c| c == 1));
        }
    }

    #[test]
    fn strands_are_packed_independently() {
        let items = vec![
            LayoutItem { span: 0.0..10.0, strand: Strand::Plus },
            LayoutItem { span: 0.0..10.0, strand: Strand::Minus },
            LayoutItem { span: 0.0..10.0, strand: Strand::Unknown },
        ];
        let layout = RowLayout::pack(&items);
        assert_eq!(layout.plus, vec![vec![0], vec![2]]);
        assert_eq!(layout.minus, vec![vec![1]]);

        let bands = layout.strand_bands(90.0, true);
        assert_eq!(bands, [[0.0, 60.0], [60.0, 90.0]]);
        let bands = layout.strand_bands(90.0, false);
        assert_eq!(bands, [[0.0, 90.0], [0.0, 90.0]]);
    }

    #[test]
    fn single_row_holds_everything() {
        let layout = RowLayout::single_row(3);
        assert_eq!(layout.plus, vec![vec![0, 1, 2]]);
        assert_eq!(layout.item_count(), 3);
    }
}
