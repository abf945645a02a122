//! Discrete derivatives over histogram bins and island segmentation

use crate::hist::bin::Bin;
use crate::hist::histogram::{Histogram, Sample};
use serde::Serialize;
use tracing::debug;

/// Sentinel derivative at the boundary bins, never zero so the edges are not
/// classified as flat.
const BOUNDARY_DERIVATIVE: f64 = 0.001;

/// One monotonic rise-then-fall (or plateau) run of bins, by zero-based id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Island {
    pub begin: usize,
    pub top: usize,
    pub end: usize,
}

/// `left[i] = (bin[i] - bin[i-1]) / bin_width`, with the sentinel at 0.
pub fn left_derivatives(bins: &[Bin], bin_width: f64) -> Vec<f64> {
    let mut ders = vec![BOUNDARY_DERIVATIVE; bins.len()];
    for i in 1..bins.len() {
        ders[i] = (bins[i].value() - bins[i - 1].value()) / bin_width;
    }
    ders
}

/// `right[i] = (bin[i] - bin[i+1]) / bin_width`, with the sentinel at the end.
pub fn right_derivatives(bins: &[Bin], bin_width: f64) -> Vec<f64> {
    let mut ders = vec![BOUNDARY_DERIVATIVE; bins.len()];
    for i in 0..bins.len().saturating_sub(1) {
        ders[i] = (bins[i].value() - bins[i + 1].value()) / bin_width;
    }
    ders
}

/// Bins where both the left and right derivative are positive.
pub fn local_maxima(bins: &[Bin], bin_width: f64) -> Vec<&Bin> {
    let left = left_derivatives(bins, bin_width);
    let right = right_derivatives(bins, bin_width);
    bins.iter()
        .filter(|bin| left[bin.id()] > 0.0 && right[bin.id()] > 0.0)
        .collect()
}

/// Partition the bins into consecutive islands using the left derivative:
/// a maximal `>= 0` run (its last index is `top`) followed by a maximal
/// `< 0` run (its last index is `end`, or `top` when the run is empty).
/// No gaps, no overlaps, every id indexes a bin.
pub fn islands(bins: &[Bin], bin_width: f64) -> Vec<Island> {
    let ders = left_derivatives(bins, bin_width);
    let mut islands = Vec::new();
    let mut cur = 0;
    while cur < bins.len() {
        let begin = cur;
        let mut top = cur;
        while cur < ders.len() && ders[cur] >= 0.0 {
            top = cur;
            cur += 1;
        }
        let mut end = top;
        while cur < ders.len() && ders[cur] < 0.0 {
            end = cur;
            cur += 1;
        }
        debug!(begin, top, end, "detected island");
        islands.push(Island { begin, top, end });
    }
    islands
}

/// A histogram is flat enough when no two adjacent bins differ in value by
/// more than `threshold` (percentage points, for normalized bins).
pub fn is_flat_enough(bins: &[Bin], threshold: f64) -> bool {
    for i in 1..bins.len() {
        if (bins[i].value() - bins[i - 1].value()).abs() > threshold {
            return false;
        }
    }
    true
}

impl<K: Sample> Histogram<K> {
    pub fn left_derivatives(&self) -> Vec<f64> {
        left_derivatives(self.bins(), self.bin_width())
    }

    pub fn right_derivatives(&self) -> Vec<f64> {
        right_derivatives(self.bins(), self.bin_width())
    }

    pub fn local_maxima(&self) -> Vec<&Bin> {
        local_maxima(self.bins(), self.bin_width())
    }

    pub fn islands(&self) -> Vec<Island> {
        islands(self.bins(), self.bin_width())
    }

    pub fn is_flat_enough(&self, threshold: f64) -> bool {
        is_flat_enough(self.bins(), threshold)
    }
}
