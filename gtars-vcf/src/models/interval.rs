use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::models::chrom::{ChromosomeOrder, DefaultChromosomeOrder};

/// Represent a range from [start, end)
/// Inclusive start, exclusive of end. The null interval has no bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interval {
    bounds: Option<(u64, u64)>,
}

impl Interval {
    /// An `end` before `start` collapses to the empty interval at `start`.
    pub fn new(start: u64, end: u64) -> Self {
        Interval {
            bounds: Some((start, end.max(start))),
        }
    }

    pub fn null() -> Self {
        Interval { bounds: None }
    }

    pub fn is_null(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn start(&self) -> Option<u64> {
        self.bounds.map(|(s, _)| s)
    }

    pub fn end(&self) -> Option<u64> {
        self.bounds.map(|(_, e)| e)
    }

    pub fn bounds(&self) -> Option<(u64, u64)> {
        self.bounds
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.bounds.map_or(0, |(s, e)| e - s)
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    #[inline]
    pub fn contains(&self, pos: u64) -> bool {
        self.bounds.is_some_and(|(s, e)| s <= pos && pos < e)
    }

    /// Check if two intervals share at least one position
    #[inline]
    pub fn overlap(&self, other: &Interval) -> bool {
        match (self.bounds, other.bounds) {
            (Some((s1, e1)), Some((s2, e2))) => s1 < e2 && s2 < e1,
            _ => false,
        }
    }

    /// Overlapping or directly adjacent.
    #[inline]
    pub fn overlap_or_touch(&self, other: &Interval) -> bool {
        match (self.bounds, other.bounds) {
            (Some((s1, e1)), Some((s2, e2))) => s1 <= e2 && s2 <= e1,
            _ => false,
        }
    }

    pub fn intersection(&self, other: &Interval) -> Interval {
        match (self.bounds, other.bounds) {
            (Some((s1, e1)), Some((s2, e2))) if self.overlap(other) => {
                Interval::new(s1.max(s2), e1.min(e2))
            }
            _ => Interval::null(),
        }
    }

    ///
    /// Minimal interval covering both operands when they overlap or touch,
    /// otherwise `self` unchanged. A null operand is the identity.
    ///
    pub fn combination(&self, other: &Interval) -> Interval {
        match (self.bounds, other.bounds) {
            (None, _) => *other,
            (_, None) => *self,
            (Some((s1, e1)), Some((s2, e2))) if self.overlap_or_touch(other) => {
                Interval::new(s1.min(s2), e1.max(e2))
            }
            _ => *self,
        }
    }

    /// Part of `self` strictly left of `other`.
    pub fn left_difference(&self, other: &Interval) -> Interval {
        let Some((s1, e1)) = self.bounds else {
            return Interval::null();
        };
        let Some((s2, _)) = other.bounds else {
            return *self;
        };
        if self.overlap(other) {
            if s1 < s2 {
                Interval::new(s1, s2)
            } else {
                Interval::null()
            }
        } else if e1 <= s2 {
            *self
        } else {
            Interval::null()
        }
    }

    /// Part of `self` strictly right of `other`.
    pub fn right_difference(&self, other: &Interval) -> Interval {
        let Some((s1, e1)) = self.bounds else {
            return Interval::null();
        };
        let Some((_, e2)) = other.bounds else {
            return Interval::null();
        };
        if self.overlap(other) {
            if e1 > e2 {
                Interval::new(e2, e1)
            } else {
                Interval::null()
            }
        } else if s1 >= e2 {
            *self
        } else {
            Interval::null()
        }
    }
}

impl Ord for Interval {
    /// Null sorts first, then by (start, end).
    fn cmp(&self, other: &Self) -> Ordering {
        self.bounds.cmp(&other.bounds)
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            Some((s, e)) => write!(f, "[{}, {})", s, e),
            None => write!(f, "null"),
        }
    }
}

///
/// An interval on a named chromosome. A null interval stands for the
/// whole chromosome.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromInterval {
    pub chrom: String,
    pub interval: Interval,
}

impl ChromInterval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        ChromInterval {
            chrom: chrom.into(),
            interval: Interval::new(start, end),
        }
    }

    pub fn whole_chrom(chrom: impl Into<String>) -> Self {
        ChromInterval {
            chrom: chrom.into(),
            interval: Interval::null(),
        }
    }

    pub fn is_whole_chrom(&self) -> bool {
        self.interval.is_null()
    }

    pub fn overlap(&self, other: &ChromInterval) -> bool {
        self.chrom == other.chrom
            && (self.is_whole_chrom()
                || other.is_whole_chrom()
                || self.interval.overlap(&other.interval))
    }

    /// `None` when the chromosomes differ or nothing is shared.
    pub fn intersection(&self, other: &ChromInterval) -> Option<ChromInterval> {
        if !self.overlap(other) {
            return None;
        }
        let interval = match (self.is_whole_chrom(), other.is_whole_chrom()) {
            (true, _) => other.interval,
            (_, true) => self.interval,
            _ => self.interval.intersection(&other.interval),
        };
        Some(ChromInterval {
            chrom: self.chrom.clone(),
            interval,
        })
    }

    pub fn cmp_with<O: ChromosomeOrder + ?Sized>(
        &self,
        other: &ChromInterval,
        order: &O,
    ) -> Ordering {
        order
            .compare(&self.chrom, &other.chrom)
            .then_with(|| self.interval.cmp(&other.interval))
    }
}

impl Ord for ChromInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_with(other, &DefaultChromosomeOrder)
    }
}

impl PartialOrd for ChromInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for ChromInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval.bounds() {
            Some((s, e)) => write!(f, "{}:{}-{}", self.chrom, s, e),
            None => write!(f, "{}", self.chrom),
        }
    }
}

///
/// Coalesce a pre-sorted sequence of intervals, joining neighbours that
/// overlap or touch. Null and empty intervals are dropped.
///
pub fn merge_intervals<I>(sorted: I) -> Vec<Interval>
where
    I: IntoIterator<Item = Interval>,
{
    let mut merged: Vec<Interval> = Vec::new();
    for interval in sorted.into_iter().filter(|i| !i.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.overlap_or_touch(&interval) => {
                *last = last.combination(&interval);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

///
/// Number of positions of `main` covered by the union of `intervals`.
///
/// # Arguments
/// - main: the interval coverage is restricted to
/// - intervals: sub-intervals in any order
///
pub fn interval_coverage(main: &Interval, intervals: &[Interval]) -> u64 {
    let mut clipped: Vec<Interval> = intervals
        .iter()
        .map(|i| main.intersection(i))
        .filter(|i| !i.is_null())
        .collect();
    clipped.sort();
    merge_intervals(clipped).iter().map(Interval::length).sum()
}
