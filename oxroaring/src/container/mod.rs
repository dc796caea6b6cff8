//! The container layer: every 16-bit chunk of a bitmap is stored as a
//! sorted array, a fixed bitset, or a run-length encoding, whichever is
//! most compact for its density. Binary operations dispatch through an
//! exhaustive kind x kind match; there is no dynamic dispatch on the hot
//! path.

mod array;
mod bitset;
mod run;

pub(crate) use array::ArrayContainer;
pub(crate) use bitset::{BitsetContainer, BitsetIter};
pub(crate) use run::{Rle16, RunContainer, RunIter};

/// Largest cardinality stored as a sorted array.
pub(crate) const ARRAY_MAX_SIZE: usize = 4096;

/// During lazy unions, arrays whose combined cardinality reaches this bound
/// are promoted to bitsets up front to avoid repeated widening.
pub(crate) const ARRAY_LAZY_LOWERBOUND: usize = 1024;

pub(crate) const BITSET_WORDS: usize = 1024;
pub(crate) const BITSET_BYTES: usize = 8192;

pub(crate) const ARRAY_DEFAULT_INIT_SIZE: usize = 16;
pub(crate) const RUN_DEFAULT_INIT_SIZE: usize = 4;

/// A set of 16-bit values, tagged by representation.
#[derive(Clone, Debug)]
pub(crate) enum Container {
    Array(ArrayContainer),
    Bitset(BitsetContainer),
    Run(RunContainer),
}

use self::Container::{Array, Bitset, Run};

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Array(ArrayContainer::with_capacity(ARRAY_DEFAULT_INIT_SIZE))
    }

    /// The container covering every 16-bit value.
    pub fn full() -> Self {
        Run(RunContainer::full())
    }

    /// A container holding exactly the closed range `[lo, hi]`, in its most
    /// compact representation.
    pub fn from_range(lo: u16, hi: u16) -> Self {
        let mut container = Run(RunContainer::from_range(lo, hi));
        container.run_to_efficient();
        container
    }

    pub fn cardinality(&self) -> usize {
        match self {
            Array(a) => a.cardinality(),
            Bitset(b) => b.cardinality(),
            Run(r) => r.cardinality(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Array(a) => a.is_empty(),
            Bitset(b) => b.is_empty(),
            Run(r) => r.is_empty(),
        }
    }

    pub fn is_full(&self) -> bool {
        match self {
            Array(_) => false,
            Bitset(b) => b.is_full(),
            Run(r) => r.is_full(),
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        match self {
            Array(a) => a.contains(value),
            Bitset(b) => b.contains(value),
            Run(r) => r.contains(value),
        }
    }

    pub fn contains_range(&self, lo: u16, hi: u16) -> bool {
        match self {
            Array(a) => a.count_in_range(lo, hi) == usize::from(hi - lo) + 1,
            Bitset(b) => b.contains_range(lo, hi),
            Run(r) => r.contains_range(lo, hi),
        }
    }

    /// Adds one value, converting array to bitset once the array bound is
    /// crossed.
    pub fn add(&mut self, value: u16) -> bool {
        match self {
            Array(a) => {
                let added = a.add(value);
                if a.cardinality() > ARRAY_MAX_SIZE {
                    *self = Bitset(a.to_bitset());
                }
                added
            }
            Bitset(b) => b.add(value),
            Run(r) => r.add(value),
        }
    }

    /// Removes one value, converting bitset back to array when the
    /// cardinality falls to the array bound.
    pub fn remove(&mut self, value: u16) -> bool {
        match self {
            Array(a) => a.remove(value),
            Bitset(b) => {
                let removed = b.remove(value);
                if b.cardinality() <= ARRAY_MAX_SIZE {
                    *self = Array(b.to_array());
                }
                removed
            }
            Run(r) => r.remove(value),
        }
    }

    pub fn add_range(&mut self, lo: u16, hi: u16) {
        match self {
            Array(a) => {
                // Wide ranges would splice thousands of values into the
                // array just to convert it afterwards; go through the
                // bitset directly.
                let span = usize::from(hi - lo) + 1;
                if a.cardinality() + span > ARRAY_MAX_SIZE {
                    let mut bitset = a.to_bitset();
                    bitset.add_range(lo, hi);
                    *self = Bitset(bitset);
                    self.normalize();
                } else {
                    a.add_range(lo, hi);
                }
            }
            Bitset(b) => b.add_range(lo, hi),
            Run(r) => {
                r.add_range(lo, hi);
                self.run_to_efficient();
            }
        }
    }

    pub fn remove_range(&mut self, lo: u16, hi: u16) {
        match self {
            Array(a) => a.remove_range(lo, hi),
            Bitset(b) => {
                b.remove_range(lo, hi);
                if b.cardinality() <= ARRAY_MAX_SIZE {
                    *self = Array(b.to_array());
                }
            }
            Run(r) => {
                r.remove_range(lo, hi);
                self.run_to_efficient();
            }
        }
    }

    /// Negates the closed range `[lo, hi]` in place.
    pub fn flip_range(&mut self, lo: u16, hi: u16) {
        match self {
            Bitset(b) => {
                b.flip_range(lo, hi);
                if b.cardinality() <= ARRAY_MAX_SIZE {
                    *self = Array(b.to_array());
                }
            }
            // Flipping a range is exactly a symmetric difference with it.
            _ => *self = self.xor(&Run(RunContainer::from_range(lo, hi))),
        }
    }

    pub fn minimum(&self) -> Option<u16> {
        match self {
            Array(a) => a.minimum(),
            Bitset(b) => b.minimum(),
            Run(r) => r.minimum(),
        }
    }

    pub fn maximum(&self) -> Option<u16> {
        match self {
            Array(a) => a.maximum(),
            Bitset(b) => b.maximum(),
            Run(r) => r.maximum(),
        }
    }

    /// Number of stored values less than or equal to `value`.
    pub fn rank(&self, value: u16) -> usize {
        match self {
            Array(a) => a.rank(value),
            Bitset(b) => b.rank(value),
            Run(r) => r.rank(value),
        }
    }

    pub fn select(&self, rank: usize) -> Option<u16> {
        match self {
            Array(a) => a.select(rank),
            Bitset(b) => b.select(rank),
            Run(r) => r.select(rank),
        }
    }

    pub fn successor(&self, value: u16) -> Option<u16> {
        match self {
            Array(a) => a.successor(value),
            Bitset(b) => b.successor(value),
            Run(r) => r.successor(value),
        }
    }

    pub fn predecessor(&self, value: u16) -> Option<u16> {
        match self {
            Array(a) => a.predecessor(value),
            Bitset(b) => b.predecessor(value),
            Run(r) => r.predecessor(value),
        }
    }

    pub fn num_runs(&self) -> usize {
        match self {
            Array(a) => a.num_runs(),
            Bitset(b) => b.num_runs(),
            Run(r) => r.num_runs(),
        }
    }

    pub fn iter(&self) -> ContainerIter<'_> {
        match self {
            Array(a) => ContainerIter::Array(a.iter()),
            Bitset(b) => ContainerIter::Bitset(b.iter()),
            Run(r) => ContainerIter::Run(r.iter()),
        }
    }

    /// Union through the kind x kind matrix; the output is pre-shaped for
    /// the denser side and normalized by cardinality.
    pub fn or(&self, other: &Self) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => Array(a.or(b)).normalized(),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let mut out = b.clone();
                for &value in a.iter() {
                    out.add(value);
                }
                Bitset(out)
            }
            (Bitset(a), Bitset(b)) => Bitset(a.or(b)),
            (Run(a), Run(b)) => {
                let mut out = Run(a.or(b));
                out.run_to_efficient();
                out
            }
            (Run(r), Array(a)) | (Array(a), Run(r)) => {
                if r.is_full() {
                    return Run(r.clone());
                }
                let mut out = r.clone();
                for &value in a.iter() {
                    out.add(value);
                }
                let mut out = Run(out);
                out.run_to_efficient();
                out
            }
            (Run(r), Bitset(b)) | (Bitset(b), Run(r)) => {
                if r.is_full() {
                    return Run(r.clone());
                }
                let mut out = b.clone();
                for run in r.runs() {
                    out.add_range(run.value, run.end());
                }
                Bitset(out)
            }
        }
    }

    /// Intersection; outputs shrink, so results are array-shaped whenever
    /// they fit.
    pub fn and(&self, other: &Self) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => Array(a.and(b)),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let values = a.iter().copied().filter(|&v| b.contains(v)).collect();
                Array(ArrayContainer::from_sorted(values))
            }
            (Bitset(a), Bitset(b)) => Bitset(a.and(b)).normalized(),
            (Run(a), Run(b)) => {
                let mut out = Run(a.and(b));
                out.run_to_efficient();
                out
            }
            (Run(r), Array(a)) | (Array(a), Run(r)) => {
                let values = a.iter().copied().filter(|&v| r.contains(v)).collect();
                Array(ArrayContainer::from_sorted(values))
            }
            (Run(r), Bitset(b)) | (Bitset(b), Run(r)) => {
                if r.cardinality() <= ARRAY_MAX_SIZE {
                    let values = r.iter().filter(|&v| b.contains(v)).collect();
                    Array(ArrayContainer::from_sorted(values))
                } else {
                    Bitset(r.to_bitset().and(b)).normalized()
                }
            }
        }
    }

    /// Difference `self \ other`.
    pub fn andnot(&self, other: &Self) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => Array(a.andnot(b)),
            (Array(a), Bitset(b)) => {
                let values = a.iter().copied().filter(|&v| !b.contains(v)).collect();
                Array(ArrayContainer::from_sorted(values))
            }
            (Array(a), Run(r)) => {
                let values = a.iter().copied().filter(|&v| !r.contains(v)).collect();
                Array(ArrayContainer::from_sorted(values))
            }
            (Bitset(a), Bitset(b)) => Bitset(a.andnot(b)).normalized(),
            (Bitset(a), Array(b)) => {
                let mut out = a.clone();
                for &value in b.iter() {
                    out.remove(value);
                }
                Bitset(out).normalized()
            }
            (Bitset(a), Run(r)) => {
                let mut out = a.clone();
                for run in r.runs() {
                    out.remove_range(run.value, run.end());
                }
                Bitset(out).normalized()
            }
            (Run(a), Run(b)) => {
                let mut out = a.clone();
                for run in b.runs() {
                    out.remove_range(run.value, run.end());
                }
                let mut out = Run(out);
                out.run_to_efficient();
                out
            }
            (Run(a), Array(b)) => {
                let mut out = a.clone();
                for &value in b.iter() {
                    out.remove(value);
                }
                let mut out = Run(out);
                out.run_to_efficient();
                out
            }
            (Run(a), Bitset(b)) => {
                if a.cardinality() <= ARRAY_MAX_SIZE {
                    let values = a.iter().filter(|&v| !b.contains(v)).collect();
                    Array(ArrayContainer::from_sorted(values))
                } else {
                    Bitset(a.to_bitset().andnot(b)).normalized()
                }
            }
        }
    }

    /// Symmetric difference; materializes run inputs through the denser
    /// intermediate.
    pub fn xor(&self, other: &Self) -> Container {
        match (self, other) {
            (Array(a), Array(b)) => Array(a.xor(b)).normalized(),
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let mut out = b.clone();
                for &value in a.iter() {
                    out.flip(value);
                }
                Bitset(out).normalized()
            }
            (Bitset(a), Bitset(b)) => Bitset(a.xor(b)).normalized(),
            (Run(a), Run(b)) => {
                if a.cardinality() + b.cardinality() <= ARRAY_MAX_SIZE {
                    Array(a.to_array().xor(&b.to_array()))
                } else {
                    let mut out = a.to_bitset();
                    for run in b.runs() {
                        out.flip_range(run.value, run.end());
                    }
                    Bitset(out).normalized()
                }
            }
            (Run(r), Array(a)) | (Array(a), Run(r)) => {
                if r.cardinality() + a.cardinality() <= ARRAY_MAX_SIZE {
                    Array(r.to_array().xor(a)).normalized()
                } else {
                    let mut out = r.to_bitset();
                    for &value in a.iter() {
                        out.flip(value);
                    }
                    Bitset(out).normalized()
                }
            }
            (Run(r), Bitset(b)) | (Bitset(b), Run(r)) => {
                let mut out = b.clone();
                for run in r.runs() {
                    out.flip_range(run.value, run.end());
                }
                Bitset(out).normalized()
            }
        }
    }

    pub fn or_inplace(&mut self, other: &Self) {
        if let (Bitset(a), Bitset(b)) = (&mut *self, other) {
            a.or_inplace(b);
            return;
        }
        *self = self.or(other);
    }

    pub fn and_inplace(&mut self, other: &Self) {
        if let (Bitset(a), Bitset(b)) = (&mut *self, other) {
            a.and_inplace(b);
            self.normalize();
            return;
        }
        *self = self.and(other);
    }

    pub fn xor_inplace(&mut self, other: &Self) {
        if let (Bitset(a), Bitset(b)) = (&mut *self, other) {
            a.xor_inplace(b);
            self.normalize();
            return;
        }
        *self = self.xor(other);
    }

    pub fn andnot_inplace(&mut self, other: &Self) {
        if let (Bitset(a), Bitset(b)) = (&mut *self, other) {
            a.andnot_inplace(b);
            self.normalize();
            return;
        }
        *self = self.andnot(other);
    }

    /// Lazy union: bitset outputs may carry the unknown-cardinality
    /// sentinel, and arrays past the lazy bound are widened to bitsets
    /// immediately. Callers must `repair` results before they escape.
    pub fn lazy_or(&self, other: &Self, force_bitsets: bool) -> Container {
        match (self, other) {
            (Bitset(a), Bitset(b)) => Bitset(a.or_nocard(b)),
            (Array(a), Array(b)) => {
                if force_bitsets || a.cardinality() + b.cardinality() >= ARRAY_LAZY_LOWERBOUND {
                    let mut out = a.to_bitset();
                    out.add_sorted(b.as_slice());
                    Bitset(out)
                } else {
                    Array(a.or(b))
                }
            }
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let mut out = b.clone();
                out.add_sorted(a.as_slice());
                Bitset(out)
            }
            (Run(r), _) if r.is_full() => Run(r.clone()),
            (_, Run(r)) if r.is_full() => Run(r.clone()),
            _ => self.or(other),
        }
    }

    /// Lazy symmetric difference; same sentinel contract as [`lazy_or`].
    ///
    /// [`lazy_or`]: Container::lazy_or
    pub fn lazy_xor(&self, other: &Self) -> Container {
        match (self, other) {
            (Bitset(a), Bitset(b)) => Bitset(a.xor_nocard(b)),
            (Array(a), Array(b))
                if a.cardinality() + b.cardinality() < ARRAY_LAZY_LOWERBOUND =>
            {
                Array(a.xor(b))
            }
            (Array(a), Bitset(b)) | (Bitset(b), Array(a)) => {
                let mut out = b.clone();
                for &value in a.iter() {
                    out.flip(value);
                }
                Bitset(out)
            }
            _ => self.xor(other),
        }
    }

    /// Resolves the lazy sentinel and reapplies the kind rule; lazy results
    /// must pass through here before reaching non-lazy callers.
    pub fn repair(&mut self) {
        if let Bitset(b) = self {
            if b.cardinality_is_unknown() {
                b.compute_cardinality();
            }
        }
        self.normalize();
    }

    /// Converts to run encoding when that is strictly smaller; returns
    /// whether the container ends up run-encoded.
    pub fn run_optimize(&mut self) -> bool {
        if let Run(_) = self {
            self.run_to_efficient();
            return matches!(self, Run(_));
        }
        let runs = self.num_runs();
        let cardinality = self.cardinality();
        if run_size_smaller(runs, cardinality) {
            let converted = match self {
                Array(a) => RunContainer::from_array(a),
                Bitset(b) => RunContainer::from_bitset(b),
                Run(_) => unreachable!(),
            };
            *self = Run(converted);
            true
        } else {
            false
        }
    }

    /// Converts a run container back to array or bitset; returns whether a
    /// conversion happened.
    pub fn remove_run_compression(&mut self) -> bool {
        match self {
            Run(r) => {
                *self = if r.cardinality() <= ARRAY_MAX_SIZE {
                    Array(r.to_array())
                } else {
                    Bitset(r.to_bitset())
                };
                true
            }
            _ => false,
        }
    }

    /// Post-mutation rule for run containers: keep the run encoding only
    /// while it is strictly smaller than the best flat representation.
    fn run_to_efficient(&mut self) {
        let Run(r) = &*self else { return };
        let cardinality = r.cardinality();
        if run_size_smaller(r.num_runs(), cardinality) {
            return;
        }
        *self = if cardinality <= ARRAY_MAX_SIZE {
            Array(r.to_array())
        } else {
            Bitset(r.to_bitset())
        };
    }

    /// Post-mutation rule for flat containers: array at or below the array
    /// bound, bitset above it. Bitsets still carrying the lazy sentinel
    /// are left alone until `repair` resolves them.
    fn normalize(&mut self) {
        match self {
            Array(a) if a.cardinality() > ARRAY_MAX_SIZE => *self = Bitset(a.to_bitset()),
            Bitset(b) if !b.cardinality_is_unknown() && b.cardinality() <= ARRAY_MAX_SIZE => {
                *self = Array(b.to_array())
            }
            _ => {}
        }
    }

    fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn intersects(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(a), Array(b)) => a.intersects(b),
            (Bitset(a), Bitset(b)) => a.intersects(b),
            (Run(a), Run(b)) => a.intersects(b),
            _ => {
                let (small, large) = if self.cardinality() <= other.cardinality() {
                    (self, other)
                } else {
                    (other, self)
                };
                small.iter().any(|v| large.contains(v))
            }
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(a), Array(b)) => a.is_subset(b),
            (Bitset(a), Bitset(b)) => a.is_subset(b),
            _ => {
                self.cardinality() <= other.cardinality()
                    && self.iter().all(|v| other.contains(v))
            }
        }
    }

    /// Bytes reclaimed by dropping excess capacity.
    pub fn shrink_to_fit(&mut self) -> u64 {
        match self {
            Array(a) => a.shrink_to_fit(),
            Bitset(_) => 0,
            Run(r) => r.shrink_to_fit(),
        }
    }
}

/// The run-encoding branch of the kind rule: `4r + 4` bytes against the
/// smaller flat encoding.
fn run_size_smaller(runs: usize, cardinality: usize) -> bool {
    4 * runs + 4 < (2 * cardinality).min(BITSET_BYTES)
}

/// Containers compare by contents, not by representation.
impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(a), Array(b)) => a == b,
            (Bitset(a), Bitset(b)) => a == b,
            (Run(a), Run(b)) => a == b,
            _ => self.cardinality() == other.cardinality() && self.iter().eq(other.iter()),
        }
    }
}

impl Eq for Container {}

#[derive(Clone, Debug)]
pub(crate) enum ContainerIter<'a> {
    Array(std::slice::Iter<'a, u16>),
    Bitset(BitsetIter<'a>),
    Run(RunIter<'a>),
}

impl Iterator for ContainerIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            ContainerIter::Array(it) => it.next().copied(),
            ContainerIter::Bitset(it) => it.next(),
            ContainerIter::Run(it) => it.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_of(range: std::ops::Range<u16>) -> Container {
        let mut c = Container::new();
        for v in range {
            c.add(v);
        }
        c
    }

    #[test]
    fn add_crosses_array_bound() {
        let mut c = array_of(0..ARRAY_MAX_SIZE as u16);
        assert!(matches!(c, Array(_)));
        c.add(ARRAY_MAX_SIZE as u16);
        assert!(matches!(c, Bitset(_)));
        assert_eq!(c.cardinality(), ARRAY_MAX_SIZE + 1);
        c.remove(0);
        assert!(matches!(c, Array(_)));
        assert_eq!(c.cardinality(), ARRAY_MAX_SIZE);
    }

    #[test]
    fn run_optimize_applies_size_rule() {
        let mut dense = array_of(0..1000);
        assert!(dense.run_optimize());
        assert!(matches!(dense, Run(_)));
        assert_eq!(dense.cardinality(), 1000);
        assert!(dense.remove_run_compression());
        assert!(matches!(dense, Array(_)));

        // Alternating values: runs are larger than the array.
        let mut sparse = Container::new();
        for v in (0..200).map(|v| v * 2) {
            sparse.add(v);
        }
        assert!(!sparse.run_optimize());
        assert!(matches!(sparse, Array(_)));
    }

    #[test]
    fn cross_kind_ops_match_reference() {
        let mut run = array_of(100..5000);
        run.run_optimize();
        let array = array_of(4990..5010);
        let mut bitset = array_of(0..6000);
        bitset.add(20000);
        assert!(matches!(bitset, Bitset(_)));

        let or = run.or(&array);
        assert_eq!(or.cardinality(), 4910);
        assert!(or.contains(5009));

        let and = bitset.and(&run);
        assert_eq!(and.cardinality(), 4900);

        let andnot = bitset.andnot(&run);
        assert_eq!(andnot.cardinality(), 1101);
        assert!(andnot.contains(20000));

        let xor = run.xor(&array);
        assert_eq!(xor.cardinality(), 4900 + 20 - 2 * 10);
        assert!(!xor.contains(4995));
        assert!(xor.contains(5005));
    }

    #[test]
    fn equality_ignores_representation() {
        let mut a = array_of(0..100);
        let mut b = a.clone();
        assert!(b.run_optimize());
        assert_eq!(a, b);
        a.remove(5);
        assert_ne!(a, b);
    }

    #[test]
    fn lazy_union_repairs() {
        let a = array_of(0..3000);
        let b = array_of(2000..6000);
        let mut lazy = a.lazy_or(&b, false);
        if let Bitset(bs) = &lazy {
            assert!(!bs.cardinality_is_unknown() || bs.words().len() == BITSET_WORDS);
        } else {
            panic!("lazy union of large arrays should widen to a bitset");
        }
        lazy.repair();
        assert_eq!(lazy.cardinality(), 6000);
        assert_eq!(lazy, a.or(&b));
    }

    #[test]
    fn flip_range_round_trip() {
        let mut c = array_of(0..10);
        c.flip_range(5, 14);
        assert_eq!(c.cardinality(), 10);
        assert!(!c.contains(7));
        assert!(c.contains(12));
        c.flip_range(5, 14);
        assert_eq!(c, array_of(0..10));
    }
}
