/// Continuous linear mapping from a domain interval onto a range interval.
///
/// This is the shape of the host's coordinate scales: the horizontal
/// scale maps genome coordinates onto track pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new([0.0, 1.0], [0.0, 1.0])
    }
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn domain_width(&self) -> f64 {
        self.domain[1] - self.domain[0]
    }

    pub fn set_domain(&mut self, domain: [f64; 2]) {
        self.domain = domain;
    }

    pub fn set_range(&mut self, range: [f64; 2]) {
        self.range = range;
    }

    pub fn map(&self, x: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let dw = d1 - d0;
        if dw == 0.0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (x - d0) / dw * (r1 - r0)
    }

    pub fn invert(&self, y: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let rw = r1 - r0;
        if rw == 0.0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (y - r0) / rw * (d1 - d0)
    }

    /// Roughly `count` evenly spaced, human friendly values spanning the
    /// domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [a, b] = self.domain;
        let (start, stop) = if a <= b { (a, b) } else { (b, a) };

        if count == 0 || !start.is_finite() || !stop.is_finite() {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }

        let inc = tick_increment(start, stop, count);
        let i0 = (start / inc).ceil() as i64;
        let i1 = (stop / inc).floor() as i64;

        let mut ticks = (i0..=i1).map(|i| i as f64 * inc).collect::<Vec<_>>();
        if a > b {
            ticks.reverse();
        }
        ticks
    }
}

fn tick_increment(start: f64, stop: f64, count: usize) -> f64 {
    let step = (stop - start) / count as f64;
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);

    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    factor * 10f64.powf(power)
}

/// Logarithmic mapping; non-positive inputs map to `NaN`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LogScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn map(&self, x: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        if x <= 0.0 || d0 <= 0.0 || d1 <= 0.0 {
            return f64::NAN;
        }
        let (l0, l1) = (d0.ln(), d1.ln());
        if l0 == l1 {
            return (r0 + r1) / 2.0;
        }
        r0 + (x.ln() - l0) / (l1 - l0) * (r1 - r0)
    }
}

/// Equal-width bands, one per row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    count: usize,
    range: [f64; 2],
}

impl BandScale {
    pub fn new(count: usize, range: [f64; 2]) -> Self {
        Self { count, range }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn bandwidth(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        (self.range[1] - self.range[0]) / self.count as f64
    }

    /// Top edge of band `ix`.
    pub fn band_start(&self, ix: usize) -> f64 {
        self.range[0] + ix as f64 * self.bandwidth()
    }

    pub fn band_middle(&self, ix: usize) -> f64 {
        self.band_start(ix) + self.bandwidth() / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueScaling {
    #[default]
    Linear,
    Log,
}

/// Maps a data column onto vertical pixels, larger values towards the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueScale {
    Linear(LinearScale),
    Log(LogScale),
}

impl ValueScale {
    /// Builds the value scale from aggregated column statistics.
    ///
    /// Returns `None` if either end of the domain is missing. For log
    /// scaling the median anchors the bottom of the domain (falling back
    /// to the minimum), since zero and negative values have no position.
    pub fn from_stats(
        scaling: ValueScaling,
        min: Option<f64>,
        median: Option<f64>,
        max: Option<f64>,
        height: f64,
        margin: f64,
    ) -> Option<Self> {
        let max = max?;
        let range = [height - margin, margin];

        match scaling {
            ValueScaling::Linear => {
                let min = min?;
                Some(ValueScale::Linear(LinearScale::new([min, max], range)))
            }
            ValueScaling::Log => {
                let offset = median.filter(|m| *m > 0.0).or(min)?;
                Some(ValueScale::Log(LogScale::new([offset, max], range)))
            }
        }
    }

    pub fn map(&self, value: f64) -> f64 {
        match self {
            ValueScale::Linear(s) => s.map(value),
            ValueScale::Log(s) => s.map(value),
        }
    }

    pub fn domain(&self) -> [f64; 2] {
        match self {
            ValueScale::Linear(s) => s.domain(),
            ValueScale::Log(s) => s.domain(),
        }
    }

    pub fn range(&self) -> [f64; 2] {
        match self {
            ValueScale::Linear(s) => s.range(),
            ValueScale::Log(s) => s.range(),
        }
    }

    /// Tick values for an axis; log scales use decades within the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self {
            ValueScale::Linear(s) => s.ticks(count),
            ValueScale::Log(s) => {
                let [d0, d1] = s.domain();
                let (lo, hi) = (d0.min(d1), d0.max(d1));
                if lo <= 0.0 || !hi.is_finite() {
                    return Vec::new();
                }
                let e0 = (lo.log10() - 1e-9).ceil() as i32;
                let e1 = (hi.log10() + 1e-9).floor() as i32;
                (e0..=e1).map(|e| 10f64.powi(e)).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_maps_and_inverts() {
        let s = LinearScale::new([100.0, 200.0], [0.0, 500.0]);
        assert_eq!(s.map(150.0), 250.0);
        assert_eq!(s.invert(250.0), 150.0);
        assert_eq!(s.map(50.0), -250.0);
    }

    #[test]
    fn degenerate_domain_maps_to_range_middle() {
        let s = LinearScale::new([5.0, 5.0], [0.0, 10.0]);
        assert_eq!(s.map(5.0), 5.0);
    }

    #[test]
    fn ticks_are_nice() {
        let s = LinearScale::new([0.0, 1.0], [0.0, 100.0]);
        let ticks = s.ticks(5);
        assert_eq!(ticks.len(), 6);
        assert!((ticks[1] - 0.2).abs() < 1e-12);

        let s = LinearScale::new([0.0, 97.0], [0.0, 100.0]);
        assert_eq!(s.ticks(10), (0..10).map(|i| i as f64 * 10.0).collect::<Vec<_>>());

        let s = LinearScale::new([10.0, 0.0], [0.0, 100.0]);
        assert_eq!(s.ticks(2), vec![10.0, 5.0, 0.0]);
    }

    #[test]
    fn log_scale_matches_opacity_curve() {
        let s = LogScale::new([1.0, 1000.0], [1.0, 0.1]);
        assert!((s.map(1.0) - 1.0).abs() < 1e-12);
        assert!((s.map(1000.0) - 0.1).abs() < 1e-12);
        assert!((s.map(10.0) - 0.7).abs() < 1e-12);
        assert!(s.map(0.0).is_nan());
    }

    #[test]
    fn band_scale_splits_range() {
        let b = BandScale::new(4, [0.0, 100.0]);
        assert_eq!(b.bandwidth(), 25.0);
        assert_eq!(b.band_start(2), 50.0);
        assert_eq!(b.band_middle(0), 12.5);
        assert_eq!(BandScale::new(0, [0.0, 10.0]).bandwidth(), 0.0);
    }

    #[test]
    fn value_scale_tolerates_missing_stats() {
        let s = ValueScale::from_stats(
            ValueScaling::Linear,
            None,
            None,
            Some(1.0),
            100.0,
            0.0,
        );
        assert!(s.is_none());

        let s = ValueScale::from_stats(
            ValueScaling::Linear,
            Some(0.0),
            None,
            Some(10.0),
            100.0,
            0.0,
        )
        .unwrap();
        // larger values sit higher up
        assert_eq!(s.map(10.0), 0.0);
        assert_eq!(s.map(0.0), 100.0);

        let s = ValueScale::from_stats(
            ValueScaling::Log,
            Some(-5.0),
            Some(10.0),
            Some(1000.0),
            100.0,
            0.0,
        )
        .unwrap();
        assert_eq!(s.domain(), [10.0, 1000.0]);
        assert_eq!(s.ticks(5), vec![10.0, 100.0, 1000.0]);
    }
}
