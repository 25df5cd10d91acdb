use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Column positions within a BEDPE-like record. Option values such as
/// `valueColumn` are 1-indexed and refer to these positions plus one.
pub mod col {
    pub const CHROM: usize = 0;
    pub const X_START: usize = 1;
    pub const X_END: usize = 2;
    pub const NAME: usize = 3;
    pub const CHROM2: usize = 4;
    pub const Y_START: usize = 5;
    pub const Y_END: usize = 6;
    pub const STRAND: usize = 7;
    pub const ITEM_RGB: usize = 8;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(Arc<str>);

impl Uid {
    pub fn new(uid: impl Into<Arc<str>>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Uid {
        Uid::new(s)
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Uid {
        Uid::new(s)
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "+" => Strand::Plus,
            "-" => Strand::Minus,
            _ => Strand::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
            Strand::Unknown => ".",
        }
    }

    /// Strand used when partitioning into rows; anything that isn't
    /// explicitly `-` is laid out with the plus strand.
    pub fn row_partition(&self) -> Strand {
        match self {
            Strand::Minus => Strand::Minus,
            _ => Strand::Plus,
        }
    }
}

/// Java-style 32-bit string hash over UTF-16 code units.
///
/// Used to give records without an explicit importance a stable,
/// pseudo-random priority.
pub fn hash_uid(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, c| {
        hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(c as i32)
    })
}

/// A single interval pair as delivered by the host's tiles. Records are
/// immutable once fetched; anything derived during layout is stored
/// elsewhere, keyed by `uid`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    pub uid: Uid,
    pub fields: Vec<String>,
    pub x_chr_offset: f64,
    pub y_chr_offset: f64,
    pub importance: Option<f64>,
    pub mouse_over: Option<String>,
}

impl TileRecord {
    pub fn new<S: ToString>(
        uid: impl Into<Uid>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            uid: uid.into(),
            fields: fields.into_iter().map(|f| f.to_string()).collect(),
            x_chr_offset: 0.0,
            y_chr_offset: 0.0,
            importance: None,
            mouse_over: None,
        }
    }

    pub fn with_offsets(mut self, x_chr_offset: f64, y_chr_offset: f64) -> Self {
        self.x_chr_offset = x_chr_offset;
        self.y_chr_offset = y_chr_offset;
        self
    }

    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn with_mouse_over(mut self, text: impl Into<String>) -> Self {
        self.mouse_over = Some(text.into());
        self
    }

    pub fn field(&self, ix: usize) -> Option<&str> {
        self.fields.get(ix).map(|s| s.as_str())
    }

    /// Parses the 0-indexed field as a number, `NaN` if it's missing or
    /// not numeric.
    pub fn numeric(&self, ix: usize) -> f64 {
        self.field(ix)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN)
    }

    /// Value of a 1-indexed option column (`valueColumn`, `colorEncoding`).
    pub fn column_value(&self, column: usize) -> f64 {
        match column.checked_sub(1) {
            Some(ix) => self.numeric(ix),
            None => f64::NAN,
        }
    }

    pub fn x_start(&self) -> f64 {
        self.numeric(col::X_START) + self.x_chr_offset
    }

    pub fn x_end(&self) -> f64 {
        self.numeric(col::X_END) + self.x_chr_offset
    }

    pub fn y_start(&self) -> f64 {
        self.numeric(col::Y_START) + self.y_chr_offset
    }

    pub fn y_end(&self) -> f64 {
        self.numeric(col::Y_END) + self.y_chr_offset
    }

    /// Center of the whole barbell, from the start of the first interval
    /// to the end of the second.
    pub fn midpoint(&self) -> f64 {
        (self.x_start() + self.y_end()) / 2.0
    }

    pub fn name(&self) -> Option<&str> {
        self.field(col::NAME)
    }

    pub fn strand(&self) -> Strand {
        self.field(col::STRAND)
            .map(Strand::parse)
            .unwrap_or(Strand::Unknown)
    }

    pub fn item_rgb(&self) -> Option<&str> {
        self.field(col::ITEM_RGB).filter(|s| !s.is_empty())
    }

    /// Explicit importance, or the uid hash when it's missing, zero or
    /// `NaN`.
    pub fn importance(&self) -> f64 {
        self.importance
            .filter(|i| *i != 0.0 && !i.is_nan())
            .unwrap_or_else(|| hash_uid(self.uid.as_str()) as f64)
    }

    /// Whether all four interval bounds are numbers.
    pub fn has_finite_bounds(&self) -> bool {
        [self.x_start(), self.x_end(), self.y_start(), self.y_end()]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn priority(&self) -> Priority {
        Priority {
            importance: self.importance(),
            hash: hash_uid(self.uid.as_str()),
            uid: self.uid.clone(),
        }
    }
}

/// Total order over records: importance first, then the uid hash, then
/// the uid itself. Greater means more important.
#[derive(Debug, Clone)]
pub struct Priority {
    pub importance: f64,
    pub hash: i32,
    pub uid: Uid,
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.importance
            .total_cmp(&other.importance)
            .then(self.hash.cmp(&other.hash))
            .then_with(|| self.uid.cmp(&other.uid))
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Priority {}

/// Collapses records sharing a uid, keeping the last one seen at the
/// position where the uid first appeared.
pub fn uniqueify(
    records: impl IntoIterator<Item = Arc<TileRecord>>,
) -> Vec<Arc<TileRecord>> {
    let mut index: HashMap<Uid, usize> = HashMap::new();
    let mut unique: Vec<Arc<TileRecord>> = Vec::new();

    for record in records {
        if let Some(&i) = index.get(&record.uid) {
            unique[i] = record;
        } else {
            index.insert(record.uid.clone(), unique.len());
            unique.push(record);
        }
    }

    unique
}

/// Sorts records from most to least important.
pub fn sort_by_priority(records: &mut [Arc<TileRecord>]) {
    records.sort_by_cached_key(|r| std::cmp::Reverse(r.priority()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn hash_matches_java_string_hash() {
        assert_eq!(hash_uid(""), 0);
        assert_eq!(hash_uid("a"), 97);
        assert_eq!(hash_uid("ab"), 97 * 31 + 98);
        assert_eq!(hash_uid("hello"), 99162322);
        // wraps at 32 bits
        assert_eq!(hash_uid("polygenelubricants"), i32::MIN);
    }

    #[test]
    fn missing_importance_falls_back_to_hash() {
        let r = TileRecord::new("hello", ["chr1"]);
        assert_eq!(r.importance(), 99162322.0);
        let r = r.with_importance(3.0);
        assert_eq!(r.importance(), 3.0);

        let zero = TileRecord::new("hello", ["chr1"]).with_importance(0.0);
        assert_eq!(zero.importance(), 99162322.0);
        let nan = TileRecord::new("hello", ["chr1"]).with_importance(f64::NAN);
        assert_eq!(nan.importance(), 99162322.0);
    }

    #[test]
    fn non_numeric_bounds_are_reported() {
        let ok = TileRecord::new("a", ["chr1", "0", "10", "a", "chr1", "20", "30"]);
        assert!(ok.has_finite_bounds());
        let bad = TileRecord::new("b", ["chr1", "x", "10", "b", "chr1", "20", "30"]);
        assert!(!bad.has_finite_bounds());
        let short = TileRecord::new("c", ["chr1", "0", "10"]);
        assert!(!short.has_finite_bounds());
    }

    #[test]
    fn priority_breaks_ties_by_hash_then_uid() {
        let a = TileRecord::new("a", ["x"]).with_importance(1.0);
        let b = TileRecord::new("b", ["x"]).with_importance(1.0);
        // hash("b") > hash("a")
        assert!(b.priority() > a.priority());
        assert_eq!(a.priority(), a.clone().priority());
    }

    #[test]
    fn uniqueify_keeps_one_record_per_uid() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let n = rng.gen_range(0..200);
            let records = (0..n)
                .map(|i| {
                    let uid = format!("u{}", rng.gen_range(0..40));
                    Arc::new(TileRecord::new(uid, [i.to_string()]))
                })
                .collect::<Vec<_>>();

            let expected =
                records.iter().map(|r| r.uid.clone()).collect::<HashSet<_>>();

            let unique = uniqueify(records.clone());
            let uids = unique.iter().map(|r| r.uid.clone()).collect::<Vec<_>>();
            let uid_set = uids.iter().cloned().collect::<HashSet<_>>();

            assert_eq!(uids.len(), uid_set.len());
            assert_eq!(uid_set, expected);

            // last seen wins
            for u in &unique {
                let last = records.iter().rev().find(|r| r.uid == u.uid);
                assert_eq!(last.map(|r| &r.fields), Some(&u.fields));
            }
        }
    }

    #[test]
    fn parses_positional_fields() {
        let r = TileRecord::new(
            "r",
            ["chr1", "100", "200", "name", "chr1", "300", "400", "-"],
        )
        .with_offsets(1000.0, 2000.0);

        assert_eq!(r.x_start(), 1100.0);
        assert_eq!(r.x_end(), 1200.0);
        assert_eq!(r.y_start(), 2300.0);
        assert_eq!(r.y_end(), 2400.0);
        assert_eq!(r.strand(), Strand::Minus);
        assert_eq!(r.name(), Some("name"));
        assert_eq!(r.column_value(2), 100.0);
        assert!(r.column_value(4).is_nan());
        assert!(r.column_value(0).is_nan());
        assert!(r.item_rgb().is_none());
    }

    #[test]
    fn sorts_most_important_first() {
        let mut records = vec![
            Arc::new(TileRecord::new("a", ["x"]).with_importance(1.0)),
            Arc::new(TileRecord::new("b", ["x"]).with_importance(10.0)),
            Arc::new(TileRecord::new("c", ["x"]).with_importance(5.0)),
        ];
        sort_by_priority(&mut records);
        let uids = records.iter().map(|r| r.uid.as_str()).collect::<Vec<_>>();
        assert_eq!(uids, ["b", "c", "a"]);
    }
}
