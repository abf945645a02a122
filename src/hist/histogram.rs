//! Equi-width histogram with a parallel raw (per-key) frequency view

use crate::error::{Error, Result};
use crate::hist::bin::Bin;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Threshold below which a bin value counts as zero; also the continuous
/// bin offset and the slack added to range queries over raw keys.
pub(crate) const SMALL_VALUE: f64 = 0.001;
const DISCRETE_BIN_OFFSET: f64 = 0.5;
const CONTINUOUS_BIN_OFFSET: f64 = SMALL_VALUE;

/// A totally ordered numeric sample type a histogram can be built over.
///
/// Continuous types collapse near-duplicate values by rounding to three
/// decimals before keying the raw map; the integer `raw key` space preserves
/// the sample ordering so the map can be range-queried per bin.
pub trait Sample: Copy + PartialOrd + fmt::Display {
    /// Whether this type uses the discrete binning formulas.
    const DISCRETE: bool;

    fn as_f64(self) -> f64;

    /// Key of this sample in the ordered raw map.
    fn raw_key(self) -> i64;

    fn from_raw_key(key: i64) -> Self;

    /// Smallest raw key whose sample value is `>= v`.
    fn key_ceil(v: f64) -> i64;

    /// Largest raw key whose sample value is `<= v`.
    fn key_floor(v: f64) -> i64;
}

impl Sample for i32 {
    const DISCRETE: bool = true;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn raw_key(self) -> i64 {
        self as i64
    }

    fn from_raw_key(key: i64) -> Self {
        key as i32
    }

    fn key_ceil(v: f64) -> i64 {
        v.ceil() as i64
    }

    fn key_floor(v: f64) -> i64 {
        v.floor() as i64
    }
}

impl Sample for i64 {
    const DISCRETE: bool = true;

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn raw_key(self) -> i64 {
        self
    }

    fn from_raw_key(key: i64) -> Self {
        key
    }

    fn key_ceil(v: f64) -> i64 {
        v.ceil() as i64
    }

    fn key_floor(v: f64) -> i64 {
        v.floor() as i64
    }
}

impl Sample for f64 {
    const DISCRETE: bool = false;

    fn as_f64(self) -> f64 {
        self
    }

    // Three-decimal rounding, half away from zero.
    fn raw_key(self) -> i64 {
        (self * 1000.0).round() as i64
    }

    fn from_raw_key(key: i64) -> Self {
        key as f64 / 1000.0
    }

    fn key_ceil(v: f64) -> i64 {
        (v * 1000.0).ceil() as i64
    }

    fn key_floor(v: f64) -> i64 {
        (v * 1000.0).floor() as i64
    }
}

/// Behavioral switches where historical histogram variants diverged.
#[derive(Debug, Clone, Copy)]
pub struct HistogramOptions {
    /// Stop creating bins once a bin's left edge passes `max + 0.001`,
    /// truncating the computed bin count for skewed data.
    pub truncate_tail: bool,
    /// Skip rows with value below 1 when rendering the textual views.
    pub render_skip_zero: bool,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            truncate_tail: true,
            render_skip_zero: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Raw,
    Percentage,
}

/// Dual raw/binned frequency distribution over one sample sequence.
///
/// Built once from a finite non-empty sequence and read-only afterwards,
/// except for the one-shot [`Histogram::normalize_to_percents`].
#[derive(Debug, Clone)]
pub struct Histogram<K: Sample> {
    name: String,
    min: f64,
    max: f64,
    bin_width: f64,
    bin_offset: f64,
    bins: Vec<Bin>,
    raw: BTreeMap<i64, f64>,
    observations: usize,
    kind: ValueKind,
    options: HistogramOptions,
    _key: PhantomData<K>,
}

impl<K: Sample> Histogram<K> {
    /// Build a histogram with default options. `min`/`max` bound the bin
    /// range; when omitted, both are computed by a linear scan of `samples`.
    pub fn new(name: &str, samples: &[K], min: Option<K>, max: Option<K>) -> Result<Self> {
        Self::with_options(name, samples, min, max, HistogramOptions::default())
    }

    pub fn with_options(
        name: &str,
        samples: &[K],
        min: Option<K>,
        max: Option<K>,
        options: HistogramOptions,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptySamples(name.to_string()));
        }
        let (min, max) = match (min, max) {
            (Some(lo), Some(hi)) => (lo.as_f64(), hi.as_f64()),
            _ => {
                let mut lo = f64::MAX;
                let mut hi = f64::MIN;
                for s in samples {
                    lo = lo.min(s.as_f64());
                    hi = hi.max(s.as_f64());
                }
                (lo, hi)
            }
        };
        let mut hist = Self {
            name: name.to_string(),
            min,
            max,
            bin_width: 0.0,
            bin_offset: 0.0,
            bins: Vec::new(),
            raw: BTreeMap::new(),
            observations: samples.len(),
            kind: ValueKind::Raw,
            options,
            _key: PhantomData,
        };
        hist.build_raw(samples);
        trace!(name, "raw histogram built");
        hist.build_bins(samples);
        trace!(name, "binned histogram built");
        Ok(hist)
    }

    fn build_raw(&mut self, samples: &[K]) {
        for s in samples {
            *self.raw.entry(s.raw_key()).or_insert(0.0) += 1.0;
        }
    }

    fn build_bins(&mut self, samples: &[K]) {
        let bin_count;
        if K::DISCRETE {
            self.bin_offset = DISCRETE_BIN_OFFSET;
            let distinct = self.raw.len();
            self.bin_width =
                f64::max(1.0, (self.max - self.min) / (2.0 + distinct as f64).sqrt().ceil());
            bin_count = ((self.max - self.min + 1.0) / self.bin_width).ceil() as usize;
            debug!(name = %self.name, distinct, "distinct discrete values");
        } else {
            self.bin_offset = CONTINUOUS_BIN_OFFSET;
            bin_count = (samples.len() as f64).sqrt() as usize;
            self.bin_width = SMALL_VALUE + (self.max - self.min) / bin_count as f64;
        }
        debug!(
            name = %self.name,
            min = self.min,
            max = self.max,
            bin_width = self.bin_width,
            bin_count,
            "binning"
        );
        for i in 0..bin_count {
            let left = -self.bin_offset + self.min + i as f64 * self.bin_width;
            let right = left + self.bin_width;
            if self.options.truncate_tail && left > self.max + SMALL_VALUE {
                break;
            }
            self.bins.push(Bin::new(i, left, right, 0.0));
        }
        for s in samples {
            let id = self.binify(*s);
            assert!(
                id < self.bins.len(),
                "sample {} binned out of range in '{}'",
                s,
                self.name
            );
            debug_assert!(
                self.bins[id].left() <= s.as_f64() && s.as_f64() <= self.bins[id].right()
            );
            self.bins[id].increment();
        }
    }

    /// Index of the bin covering `k`. Guaranteed in bounds for any sample
    /// within `[min, max]` by the width/count formulas above.
    fn binify(&self, k: K) -> usize {
        ((k.as_f64() - (self.min - self.bin_offset)) / self.bin_width) as usize
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_discrete(&self) -> bool {
        K::DISCRETE
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn bin(&self, id: usize) -> &Bin {
        &self.bins[id]
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Accumulated count (or percentage) of `key` in the raw view, 0 if never
    /// observed.
    pub fn raw_value(&self, key: K) -> f64 {
        self.raw.get(&key.raw_key()).copied().unwrap_or(0.0)
    }

    pub fn distinct_raw_count(&self) -> usize {
        self.raw.len()
    }

    /// The raw key with the highest accumulated value. Among ties the
    /// numerically largest key wins (ascending scan keeps the last `>=` hit).
    pub fn max_raw_key(&self) -> K {
        let mut result = 0i64;
        let mut max_occ = f64::MIN;
        for (&key, &value) in &self.raw {
            if value >= max_occ {
                max_occ = value;
                result = key;
            }
        }
        K::from_raw_key(result)
    }

    /// The bin with the highest value. Among ties the lowest-id bin wins
    /// (strict `>` keeps the first hit).
    pub fn max_bin(&self) -> &Bin {
        let mut best = 0usize;
        let mut max_occ = f64::MIN;
        for bin in &self.bins {
            if bin.value() > max_occ {
                max_occ = bin.value();
                best = bin.id();
            }
        }
        &self.bins[best]
    }

    /// Highest bin id whose value exceeds 0.001, or 0 if none.
    pub fn last_non_zero_bin(&self) -> usize {
        let mut result = 0;
        for bin in &self.bins {
            if bin.value() > SMALL_VALUE {
                result = bin.id();
            }
        }
        result
    }

    /// The most frequent raw key within `[bin.left, bin.right + 0.001]`,
    /// with the same largest-key-wins tie-break as [`Histogram::max_raw_key`].
    /// `None` when no raw key falls inside the bin.
    pub fn max_raw_key_in_bin(&self, bin_id: usize) -> Option<K> {
        let bin = &self.bins[bin_id];
        let lo = K::key_ceil(bin.left());
        let hi = K::key_floor(bin.right() + SMALL_VALUE);
        let mut result = None;
        let mut max_occ = f64::MIN;
        for (&key, &value) in self.raw.range(lo..=hi) {
            if value >= max_occ {
                max_occ = value;
                result = Some(key);
            }
        }
        result.map(K::from_raw_key)
    }

    /// Rewrite every raw count and bin value as `100 * count / observations`.
    ///
    /// One-shot: callers must not invoke this twice.
    pub fn normalize_to_percents(&mut self) {
        debug!(name = %self.name, "normalizing to percents");
        let observations = self.observations as f64;
        for value in self.raw.values_mut() {
            *value = 100.0 * *value / observations;
        }
        for bin in &mut self.bins {
            bin.set_value(100.0 * bin.value() / observations);
        }
        self.kind = ValueKind::Percentage;
    }

    fn unit(&self) -> &'static str {
        match self.kind {
            ValueKind::Raw => "pcs",
            ValueKind::Percentage => "%",
        }
    }

    fn kind_tag(&self) -> &'static str {
        if K::DISCRETE {
            "{discrete}"
        } else {
            "{continuous}"
        }
    }

    /// ASCII bar view of the raw map.
    pub fn render_raw(&self) -> String {
        let mut out = format!("\n{} [RAW]{}\n", self.name, self.kind_tag());
        for (&key, &value) in &self.raw {
            if self.options.render_skip_zero && value < 1.0 {
                continue;
            }
            out.push_str(&format!(
                "{}[{:.2}]{}:\t\t|{}\n",
                K::from_raw_key(key),
                value,
                self.unit(),
                "=".repeat(value as usize)
            ));
        }
        out
    }

    /// ASCII bar view of the bins. Runs of below-one bins collapse into a
    /// `:` marker when `render_skip_zero` is set.
    pub fn render_bins(&self) -> String {
        let mut out = format!("\n{} [EQU_WIDTH_BINNED]{}\n", self.name, self.kind_tag());
        let mut in_zero_run = false;
        for bin in &self.bins {
            if self.options.render_skip_zero && bin.value() < 1.0 {
                if !in_zero_run {
                    out.push_str(":\n:\n");
                }
                in_zero_run = true;
                continue;
            }
            in_zero_run = false;
            out.push_str(&format!(
                "{}{}:\t\t|{}\n",
                bin,
                self.unit(),
                "=".repeat(bin.value() as usize)
            ));
        }
        out
    }
}

impl<K: Sample> fmt::Display for Histogram<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n'''''''''''''''''''''''''''''''''''''''''''''''\n{}",
            self.render_raw(),
            self.render_bins()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn raw_counts_sum_to_sample_count() {
        let samples = vec![1, 1, 1, 2, 2, 3];
        let hist = Histogram::new("test", &samples, Some(1), Some(3)).unwrap();
        let total: f64 = (1..=3).map(|k| hist.raw_value(k)).sum();
        assert_eq!(total, samples.len() as f64);
    }

    #[test]
    fn max_raw_key_prefers_highest_count() {
        let samples = vec![1, 1, 1, 2, 2, 3];
        let hist = Histogram::new("test", &samples, Some(1), Some(3)).unwrap();
        assert_eq!(hist.max_raw_key(), 1);
    }

    #[test]
    fn max_raw_key_tie_breaks_to_largest_key() {
        let samples = vec![1, 1, 2, 2];
        let hist = Histogram::new("test", &samples, Some(1), Some(2)).unwrap();
        assert_eq!(hist.max_raw_key(), 2);
    }

    #[test]
    fn continuous_keys_round_to_three_decimals() {
        let samples = vec![0.1231, 0.1234, 0.5];
        let hist = Histogram::new("test", &samples, Some(0.0), Some(1.0)).unwrap();
        // Both near-duplicates collapse into the 0.123 bucket.
        assert_eq!(hist.raw_value(0.123), 2.0);
        assert_eq!(hist.distinct_raw_count(), 2);
    }

    #[test]
    fn normalize_sums_to_hundred() {
        let samples = vec![1, 2, 2, 3, 3, 3, 4, 4];
        let mut hist = Histogram::new("test", &samples, Some(1), Some(4)).unwrap();
        hist.normalize_to_percents();
        let raw_total: f64 = (1..=4).map(|k| hist.raw_value(k)).sum();
        assert!((raw_total - 100.0).abs() < 1e-9);
        let bin_total: f64 = hist.bins().iter().map(|b| b.value()).sum();
        assert!((bin_total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_samples_rejected() {
        let samples: Vec<i32> = Vec::new();
        let err = Histogram::new("empty", &samples, None, None).unwrap_err();
        assert!(matches!(err, crate::error::Error::EmptySamples(_)));
    }

    #[test]
    fn max_bin_tie_breaks_to_first() {
        // Two values with equal counts far enough apart to land in
        // different bins.
        let samples = vec![1, 1, 10, 10];
        let hist = Histogram::new("test", &samples, Some(1), Some(10)).unwrap();
        let max = hist.max_bin();
        let first_nonzero = hist.bins().iter().find(|b| b.value() > 0.0).unwrap();
        assert_eq!(max.id(), first_nonzero.id());
    }

    #[test]
    fn last_non_zero_bin_scans_all() {
        let samples = vec![1, 1, 1, 9];
        let hist = Histogram::new("test", &samples, Some(1), Some(20)).unwrap();
        let last = hist.last_non_zero_bin();
        assert!(hist.bin(last).value() > 0.0);
        for bin in &hist.bins()[last + 1..] {
            assert_eq!(bin.value(), 0.0);
        }
    }

    #[test]
    fn max_raw_key_in_bin_restricts_to_bin_range() {
        let samples = vec![1, 1, 1, 9, 9, 9, 9];
        let hist = Histogram::new("test", &samples, Some(1), Some(9)).unwrap();
        let max_bin = hist.max_bin();
        let key = hist.max_raw_key_in_bin(max_bin.id()).unwrap();
        assert!(max_bin.left() <= key as f64 && key as f64 <= max_bin.right() + 0.001);
    }

    #[test]
    fn degenerate_single_value_range() {
        let samples = vec![5, 5, 5];
        let hist = Histogram::new("test", &samples, Some(5), Some(5)).unwrap();
        assert_eq!(hist.bin_count(), 1);
        assert_eq!(hist.bin(0).value(), 3.0);
    }

    #[test]
    fn min_max_computed_when_omitted() {
        let samples = vec![3, 7, 1, 9, 4];
        let hist = Histogram::new("test", &samples, None, None).unwrap();
        for &s in &samples {
            let id = hist.bins().iter().position(|b| {
                b.left() <= s as f64 && (s as f64) <= b.right()
            });
            assert!(id.is_some(), "sample {} not covered by any bin", s);
        }
    }

    proptest! {
        #[test]
        fn prop_raw_counts_sum(samples in proptest::collection::vec(-50i32..50, 1..200)) {
            let hist = Histogram::new("prop", &samples, None, None).unwrap();
            let total: f64 = (-50..50).map(|k| hist.raw_value(k)).sum();
            prop_assert_eq!(total, samples.len() as f64);
        }

        #[test]
        fn prop_binify_in_bounds(samples in proptest::collection::vec(0.0f64..100.0, 1..200)) {
            // Construction asserts every sample lands in a valid bin; the
            // returned bin must also contain the sample.
            let hist = Histogram::new("prop", &samples, Some(0.0), Some(100.0)).unwrap();
            let total: f64 = hist.bins().iter().map(|b| b.value()).sum();
            prop_assert_eq!(total, samples.len() as f64);
        }

        #[test]
        fn prop_normalized_sums_to_hundred(samples in proptest::collection::vec(0i64..30, 1..100)) {
            let mut hist = Histogram::new("prop", &samples, None, None).unwrap();
            hist.normalize_to_percents();
            let total: f64 = hist.bins().iter().map(|b| b.value()).sum();
            prop_assert!((total - 100.0).abs() < 1e-6);
        }
    }
}
