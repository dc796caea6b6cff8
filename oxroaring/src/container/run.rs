use std::fmt;

use super::array::ArrayContainer;
use super::bitset::BitsetContainer;
use super::RUN_DEFAULT_INIT_SIZE;

/// One run of consecutive values: covers `value ..= value + length`.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) struct Rle16 {
    pub value: u16,
    pub length: u16,
}

impl Rle16 {
    pub fn new(value: u16, length: u16) -> Self {
        Self { value, length }
    }

    /// Last value covered by the run.
    pub fn end(&self) -> u16 {
        self.value + self.length
    }

    pub fn run_len(&self) -> usize {
        usize::from(self.length) + 1
    }
}

impl fmt::Debug for Rle16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.value, self.end())
    }
}

/// Run-length encoded container: disjoint, non-adjacent runs sorted by
/// start.
///
/// Preferred when the run encoding is strictly smaller than both the array
/// and the bitset encodings; only `run_optimize` creates these.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub(crate) struct RunContainer {
    runs: Vec<Rle16>,
}

impl RunContainer {
    pub fn new() -> Self {
        Self { runs: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            runs: Vec::with_capacity(capacity.max(RUN_DEFAULT_INIT_SIZE)),
        }
    }

    /// The container covering every 16-bit value.
    pub fn full() -> Self {
        Self {
            runs: vec![Rle16::new(0, u16::MAX)],
        }
    }

    /// A single closed run `[lo, hi]`.
    pub fn from_range(lo: u16, hi: u16) -> Self {
        debug_assert!(lo <= hi);
        Self {
            runs: vec![Rle16::new(lo, hi - lo)],
        }
    }

    /// Builds a container from runs already known to be sorted, disjoint
    /// and non-adjacent.
    pub fn from_runs(runs: Vec<Rle16>) -> Self {
        debug_assert!(runs
            .windows(2)
            .all(|w| u32::from(w[0].end()) + 1 < u32::from(w[1].value)));
        Self { runs }
    }

    pub fn runs(&self) -> &[Rle16] {
        &self.runs
    }

    pub fn num_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn cardinality(&self) -> usize {
        self.runs.iter().map(Rle16::run_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.runs.len() == 1 && self.runs[0].value == 0 && self.runs[0].length == u16::MAX
    }

    /// Index of the run containing `value`, if any.
    fn find_run(&self, value: u16) -> Option<usize> {
        let idx = self.runs.partition_point(|r| r.value <= value);
        let idx = idx.checked_sub(1)?;
        (value <= self.runs[idx].end()).then_some(idx)
    }

    pub fn contains(&self, value: u16) -> bool {
        self.find_run(value).is_some()
    }

    pub fn contains_range(&self, lo: u16, hi: u16) -> bool {
        // Runs are disjoint and non-adjacent, so a closed range is covered
        // only if a single run covers it whole.
        match self.find_run(lo) {
            Some(idx) => hi <= self.runs[idx].end(),
            None => false,
        }
    }

    pub fn add(&mut self, value: u16) -> bool {
        if self.contains(value) {
            return false;
        }
        self.add_range(value, value);
        true
    }

    /// Adds the closed range `[lo, hi]`, merging with overlapping or
    /// adjacent runs.
    pub fn add_range(&mut self, lo: u16, hi: u16) {
        debug_assert!(lo <= hi);
        // First run that could merge: ends at lo-1 or later. Last run that
        // could merge: starts at hi+1 or earlier. Work in u32 to dodge the
        // u16 edges.
        let first = self
            .runs
            .partition_point(|r| u32::from(r.end()) + 1 < u32::from(lo));
        let last = self
            .runs
            .partition_point(|r| u32::from(r.value) <= u32::from(hi) + 1);
        if first == last {
            self.runs.insert(first, Rle16::new(lo, hi - lo));
            return;
        }
        let value = lo.min(self.runs[first].value);
        let end = hi.max(self.runs[last - 1].end());
        self.runs
            .splice(first..last, [Rle16::new(value, end - value)]);
    }

    pub fn remove(&mut self, value: u16) -> bool {
        let Some(idx) = self.find_run(value) else {
            return false;
        };
        let run = self.runs[idx];
        match (value == run.value, value == run.end()) {
            (true, true) => {
                self.runs.remove(idx);
            }
            (true, false) => {
                self.runs[idx] = Rle16::new(value + 1, run.length - 1);
            }
            (false, true) => {
                self.runs[idx].length -= 1;
            }
            (false, false) => {
                self.runs[idx] = Rle16::new(run.value, value - 1 - run.value);
                self.runs
                    .insert(idx + 1, Rle16::new(value + 1, run.end() - value - 1));
            }
        }
        true
    }

    /// Removes the closed range `[lo, hi]`, splitting boundary runs.
    pub fn remove_range(&mut self, lo: u16, hi: u16) {
        debug_assert!(lo <= hi);
        let first = self.runs.partition_point(|r| r.end() < lo);
        let last = self.runs.partition_point(|r| r.value <= hi);
        if first == last {
            return;
        }
        let mut replacement = Vec::new();
        if self.runs[first].value < lo {
            replacement.push(Rle16::new(
                self.runs[first].value,
                lo - 1 - self.runs[first].value,
            ));
        }
        if self.runs[last - 1].end() > hi {
            replacement.push(Rle16::new(hi + 1, self.runs[last - 1].end() - hi - 1));
        }
        self.runs.splice(first..last, replacement);
    }

    pub fn minimum(&self) -> Option<u16> {
        self.runs.first().map(|r| r.value)
    }

    pub fn maximum(&self) -> Option<u16> {
        self.runs.last().map(Rle16::end)
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u16) -> usize {
        let mut rank = 0;
        for run in &self.runs {
            if run.value > value {
                break;
            }
            rank += usize::from(value.min(run.end()) - run.value) + 1;
        }
        rank
    }

    pub fn select(&self, rank: usize) -> Option<u16> {
        let mut remaining = rank;
        for run in &self.runs {
            if remaining < run.run_len() {
                return Some(run.value + remaining as u16);
            }
            remaining -= run.run_len();
        }
        None
    }

    pub fn successor(&self, value: u16) -> Option<u16> {
        if let Some(idx) = self.find_run(value) {
            if value < self.runs[idx].end() {
                return Some(value + 1);
            }
            return self.runs.get(idx + 1).map(|r| r.value);
        }
        let idx = self.runs.partition_point(|r| r.value <= value);
        self.runs.get(idx).map(|r| r.value)
    }

    pub fn predecessor(&self, value: u16) -> Option<u16> {
        if let Some(idx) = self.find_run(value) {
            if value > self.runs[idx].value {
                return Some(value - 1);
            }
            return idx.checked_sub(1).map(|i| self.runs[i].end());
        }
        let idx = self.runs.partition_point(|r| r.value < value);
        idx.checked_sub(1).map(|i| self.runs[i].end())
    }

    /// Two-pointer run merge; shared spans collapse into one run.
    pub fn or(&self, other: &Self) -> Self {
        let mut out = RunContainer::with_capacity(self.runs.len() + other.runs.len());
        let (mut i, mut j) = (0, 0);
        while i < self.runs.len() && j < other.runs.len() {
            let run = if self.runs[i].value <= other.runs[j].value {
                i += 1;
                self.runs[i - 1]
            } else {
                j += 1;
                other.runs[j - 1]
            };
            out.push_coalesce(run);
        }
        for &run in &self.runs[i..] {
            out.push_coalesce(run);
        }
        for &run in &other.runs[j..] {
            out.push_coalesce(run);
        }
        out
    }

    /// Two-pointer run intersection.
    pub fn and(&self, other: &Self) -> Self {
        let mut out = RunContainer::new();
        let (mut i, mut j) = (0, 0);
        while i < self.runs.len() && j < other.runs.len() {
            let (a, b) = (self.runs[i], other.runs[j]);
            let lo = a.value.max(b.value);
            let hi = a.end().min(b.end());
            if lo <= hi {
                out.runs.push(Rle16::new(lo, hi - lo));
            }
            if a.end() <= b.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        out
    }

    pub fn intersects(&self, other: &Self) -> bool {
        let (mut i, mut j) = (0, 0);
        while i < self.runs.len() && j < other.runs.len() {
            let (a, b) = (self.runs[i], other.runs[j]);
            if a.value.max(b.value) <= a.end().min(b.end()) {
                return true;
            }
            if a.end() <= b.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        false
    }

    /// Appends a run to the tail, coalescing with the last run when they
    /// overlap or touch. `run.value` must be >= the last run's start.
    fn push_coalesce(&mut self, run: Rle16) {
        match self.runs.last_mut() {
            Some(last) if u32::from(run.value) <= u32::from(last.end()) + 1 => {
                if run.end() > last.end() {
                    last.length = run.end() - last.value;
                }
            }
            _ => self.runs.push(run),
        }
    }

    pub fn iter(&self) -> RunIter<'_> {
        RunIter {
            runs: &self.runs,
            idx: 0,
            offset: 0,
        }
    }

    pub fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.cardinality());
        for run in &self.runs {
            values.extend(run.value..=run.end());
        }
        ArrayContainer::from_sorted(values)
    }

    pub fn to_bitset(&self) -> BitsetContainer {
        let mut bitset = BitsetContainer::new();
        for run in &self.runs {
            bitset.add_range(run.value, run.end());
        }
        bitset
    }

    pub fn from_array(array: &ArrayContainer) -> Self {
        let mut out = RunContainer::new();
        for &value in array.iter() {
            out.push_coalesce(Rle16::new(value, 0));
        }
        out
    }

    pub fn from_bitset(bitset: &BitsetContainer) -> Self {
        let mut out = RunContainer::new();
        let mut iter = bitset.iter();
        let Some(first) = iter.next() else {
            return out;
        };
        let mut start = first;
        let mut end = first;
        for value in iter {
            if value == end + 1 {
                end = value;
            } else {
                out.runs.push(Rle16::new(start, end - start));
                start = value;
                end = value;
            }
        }
        out.runs.push(Rle16::new(start, end - start));
        out
    }

    /// Bytes reclaimed by dropping excess capacity.
    pub fn shrink_to_fit(&mut self) -> u64 {
        let saved = (self.runs.capacity() - self.runs.len()) * 4;
        self.runs.shrink_to_fit();
        saved as u64
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RunIter<'a> {
    runs: &'a [Rle16],
    idx: usize,
    offset: u32,
}

impl Iterator for RunIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let run = self.runs.get(self.idx)?;
        let value = run.value + self.offset as u16;
        if self.offset == u32::from(run.length) {
            self.idx += 1;
            self.offset = 0;
        } else {
            self.offset += 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(pairs: &[(u16, u16)]) -> RunContainer {
        RunContainer::from_runs(pairs.iter().map(|&(v, l)| Rle16::new(v, l)).collect())
    }

    #[test]
    fn add_merges_adjacent_runs() {
        let mut r = RunContainer::new();
        r.add_range(10, 20);
        r.add_range(30, 40);
        assert_eq!(r.num_runs(), 2);
        r.add_range(21, 29);
        assert_eq!(r.num_runs(), 1);
        assert_eq!(r.cardinality(), 31);
        assert!(r.add(9));
        assert!(!r.add(10));
        assert_eq!(r.runs(), &[Rle16::new(9, 32)]);
    }

    #[test]
    fn remove_splits_runs() {
        let mut r = runs(&[(10, 10)]);
        assert!(r.remove(15));
        assert_eq!(r.runs(), &[Rle16::new(10, 4), Rle16::new(16, 4)]);
        assert!(r.remove(10));
        assert!(r.remove(20));
        assert!(!r.remove(15));
        assert_eq!(r.runs(), &[Rle16::new(11, 3), Rle16::new(16, 3)]);
        r.remove_range(0, 17);
        assert_eq!(r.runs(), &[Rle16::new(18, 1)]);
    }

    #[test]
    fn boundary_runs() {
        let mut r = RunContainer::full();
        assert!(r.is_full());
        assert!(r.contains(u16::MAX));
        r.remove_range(0, 0);
        assert_eq!(r.runs(), &[Rle16::new(1, u16::MAX - 1)]);
        r.add_range(0, 0);
        assert!(r.is_full());
    }

    #[test]
    fn set_ops() {
        let a = runs(&[(0, 9), (100, 9)]);
        let b = runs(&[(5, 9), (200, 0)]);
        let union = a.or(&b);
        assert_eq!(
            union.runs(),
            &[Rle16::new(0, 14), Rle16::new(100, 9), Rle16::new(200, 0)]
        );
        let inter = a.and(&b);
        assert_eq!(inter.runs(), &[Rle16::new(5, 4)]);
        assert!(a.intersects(&b));
        assert!(!runs(&[(0, 1)]).intersects(&runs(&[(3, 1)])));
    }

    #[test]
    fn rank_select_navigation() {
        let r = runs(&[(10, 4), (20, 4)]);
        assert_eq!(r.rank(12), 3);
        assert_eq!(r.rank(19), 5);
        assert_eq!(r.select(5), Some(20));
        assert_eq!(r.select(10), None);
        assert_eq!(r.successor(14), Some(20));
        assert_eq!(r.predecessor(20), Some(14));
        assert_eq!(r.successor(24), None);
    }

    #[test]
    fn conversions_round_trip() {
        let r = runs(&[(3, 2), (1000, 100)]);
        assert_eq!(RunContainer::from_array(&r.to_array()), r);
        assert_eq!(RunContainer::from_bitset(&r.to_bitset()), r);
    }
}
