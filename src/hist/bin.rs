//! One interval bucket of an equi-width histogram

use std::fmt;

/// A half-open interval `[left, right)` with an accumulated count, or a
/// percentage once the owning histogram has been normalized.
///
/// Bins are created once per histogram construction and never resized.
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    id: usize,
    left: f64,
    right: f64,
    value: f64,
}

impl Bin {
    pub fn new(id: usize, left: f64, right: f64, value: f64) -> Self {
        Self {
            id,
            left,
            right,
            value,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn increment(&mut self) {
        self.value += 1.0;
    }

    pub(crate) fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

impl fmt::Display for Bin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{:.3}; {:.3}) = {:.2}",
            self.id, self.left, self.right, self.value
        )
    }
}
