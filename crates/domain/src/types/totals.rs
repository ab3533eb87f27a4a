//! Processed/failed counters returned by crawls and flat scans.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Leaves (or entities) handled by a scan.
///
/// Addition is associative and commutative, so totals from concurrently
/// running scans can be combined in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlTotals {
    pub processed: u64,
    pub failed: u64,
}

impl CrawlTotals {
    pub const fn new(processed: u64, failed: u64) -> Self {
        Self { processed, failed }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub const fn total(&self) -> u64 {
        self.processed + self.failed
    }
}

impl Add for CrawlTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self { processed: self.processed + rhs.processed, failed: self.failed + rhs.failed }
    }
}

impl AddAssign for CrawlTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for CrawlTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
